use anyhow::{Context, Result};
use estat_normalizer::{
    clean::pipeline,
    intake,
    layout::{builtin, LayoutRegistry},
    sink::{CsvSink, TableSink},
};
use std::{env, fs, path::PathBuf};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(filter).init();
    info!("startup");

    // ─── 2) configure dirs ───────────────────────────────────────────
    let mut args = env::args().skip(1);
    let downloads_dir = PathBuf::from(args.next().unwrap_or_else(|| "downloads".into()));
    let data_dir = PathBuf::from(args.next().unwrap_or_else(|| "data".into()));
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating {}", data_dir.display()))?;

    // ─── 3) load layout profiles ─────────────────────────────────────
    let registry: LayoutRegistry = match env::var("ESTAT_PROFILES") {
        Ok(path) => {
            info!(path = %path, "loading layout profiles from override");
            let text = fs::read_to_string(&path)
                .with_context(|| format!("reading profile override {path}"))?;
            LayoutRegistry::from_json(&text)
                .with_context(|| format!("parsing profile override {path}"))?
        }
        Err(_) => builtin::REGISTRY.clone(),
    };

    // ─── 4) discover source workbooks ────────────────────────────────
    let sources = intake::scan_downloads(&downloads_dir)?;
    if sources.is_empty() {
        info!("no survey workbooks found; exit");
        return Ok(());
    }
    info!("{} workbooks to normalize", sources.len());

    // ─── 5) normalize and aggregate per (family, year) ───────────────
    let tables = pipeline::collect_tables(&registry, &sources);

    // ─── 6) hand tables to the sink ──────────────────────────────────
    let mut sink = CsvSink::new(&data_dir);
    let mut stored = 0usize;
    for (family, years) in &tables {
        for (year, table) in years {
            match sink.store(*family, *year, table) {
                Ok(()) => stored += 1,
                Err(err) => error!(%family, year, "store failed: {err:#}"),
            }
        }
    }

    info!("all done; {stored} tables written");
    Ok(())
}
