use crate::grid::Cell;
use crate::layout::profile::{LayoutProfile, RowFilter, FISCAL_YEAR};
use crate::{YEAR_MAX, YEAR_MIN};

/// Pulls a 4-digit year out of a fiscal-year cell ("2004年度", a bare 2004,
/// or a numeric cell). The first in-range window of four digits wins.
pub fn parse_fiscal_year(cell: &Cell) -> Option<u16> {
    let text = cell.display();
    let chars: Vec<char> = text.chars().collect();
    if chars.len() < 4 {
        return None;
    }
    for i in 0..=chars.len() - 4 {
        let window = &chars[i..i + 4];
        if window.iter().all(|c| c.is_ascii_digit()) {
            let year: u16 = window.iter().collect::<String>().parse().ok()?;
            if (YEAR_MIN..=YEAR_MAX).contains(&year) {
                return Some(year);
            }
        }
    }
    None
}

/// Applies the profile's structural fixes in their required order:
/// relocation, forward fill, column drop, row filter. Relocation must precede
/// the fill (the fill must not spread a value that is about to move), and
/// drops come last among the column edits because relocation and fill address
/// columns by position. Errors when the row filter needs a column the header
/// never produced; the caller treats that as a malformed sheet.
pub fn reconcile(
    columns: Vec<String>,
    mut rows: Vec<Vec<Cell>>,
    profile: &LayoutProfile,
) -> Result<(Vec<String>, Vec<Vec<Cell>>), String> {
    // 1) category relocation
    if let Some(reloc) = &profile.category_relocation {
        for row in &mut rows {
            let marker = &row[reloc.marker_column];
            if marker.is_blank() || marker.display().contains(&reloc.marker_token) {
                continue;
            }
            row[reloc.category_column] = row[reloc.marker_column].clone();
            row[reloc.marker_column] = Cell::Empty;
        }
    }

    // 2) forward fill
    if let Some(col) = profile.forward_fill_column {
        let mut last = Cell::Empty;
        for row in &mut rows {
            if row[col].is_blank() {
                if !last.is_blank() {
                    row[col] = last.clone();
                }
            } else {
                last = row[col].clone();
            }
        }
    }

    // 3) column drop, highest position first so the rest stay valid
    let mut columns = columns;
    for &pos in profile.drop_columns.iter().rev() {
        if pos < columns.len() {
            columns.remove(pos);
            for row in &mut rows {
                row.remove(pos);
            }
        }
    }

    // 4) row filter
    if let RowFilter::RequireFiscalYear = profile.row_filter {
        let fy = columns
            .iter()
            .position(|c| c == FISCAL_YEAR)
            .ok_or_else(|| format!("row filter requires a `{FISCAL_YEAR}` column, none present"))?;
        rows.retain(|row| parse_fiscal_year(&row[fy]).is_some());
        for row in &mut rows {
            if let Cell::Text(s) = &mut row[fy] {
                *s = s.trim().to_string();
            }
        }
    }

    Ok((columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::profile::{default_sentinels, CategoryRelocation, INDUSTRY};
    use std::collections::BTreeMap;

    fn t(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn base_profile() -> LayoutProfile {
        LayoutProfile {
            header_rows: vec![0],
            data_start_row: 1,
            relabels: BTreeMap::new(),
            drop_columns: Default::default(),
            span_rules: BTreeMap::new(),
            forward_fill_column: None,
            category_relocation: None,
            row_filter: RowFilter::RequireFiscalYear,
            sentinel_tokens: default_sentinels(),
        }
    }

    #[test]
    fn fiscal_year_parsing() {
        assert_eq!(parse_fiscal_year(&t("2004年度")), Some(2004));
        assert_eq!(parse_fiscal_year(&t("  1998 ")), Some(1998));
        assert_eq!(parse_fiscal_year(&Cell::Number(2013.0)), Some(2013));
        assert_eq!(parse_fiscal_year(&t("平成16年度")), None);
        assert_eq!(parse_fiscal_year(&t("9999")), None);
        assert_eq!(parse_fiscal_year(&Cell::Empty), None);
    }

    #[test]
    fn relocation_precedes_forward_fill() {
        let mut profile = base_profile();
        profile.forward_fill_column = Some(0);
        profile.category_relocation = Some(CategoryRelocation {
            marker_column: 1,
            category_column: 0,
            marker_token: "年度".into(),
            synthesize_category_column: true,
        });

        let columns = vec![INDUSTRY.to_string(), FISCAL_YEAR.to_string(), "計".to_string()];
        let rows = vec![
            vec![Cell::Empty, t("製造業"), Cell::Empty],
            vec![Cell::Empty, t("2002年度"), Cell::Number(10.0)],
            vec![Cell::Empty, t("2003年度"), Cell::Number(11.0)],
        ];

        let (_, rows) = reconcile(columns, rows, &profile).unwrap();
        // category carrier row dropped by the filter, label filled downward
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], t("製造業"));
        assert_eq!(rows[1][0], t("製造業"));
        assert_eq!(rows[0][1], t("2002年度"));
    }

    #[test]
    fn forward_fill_skips_leading_blanks() {
        let mut profile = base_profile();
        profile.forward_fill_column = Some(0);
        profile.row_filter = RowFilter::KeepAll;

        let columns = vec!["a".to_string()];
        let rows = vec![
            vec![Cell::Empty],
            vec![t("x")],
            vec![Cell::Empty],
            vec![t("y")],
            vec![Cell::Empty],
        ];
        let (_, rows) = reconcile(columns, rows, &profile).unwrap();
        let got: Vec<Cell> = rows.into_iter().map(|mut r| r.remove(0)).collect();
        assert_eq!(got, vec![Cell::Empty, t("x"), t("x"), t("y"), t("y")]);
    }

    #[test]
    fn drops_remove_labels_and_cells_together() {
        let mut profile = base_profile();
        profile.drop_columns = [0, 2].into_iter().collect();
        profile.row_filter = RowFilter::KeepAll;

        let columns = vec!["s1".into(), "keep".into(), "s2".into(), "also".into()];
        let rows = vec![vec![t("a"), t("b"), t("c"), t("d")]];
        let (columns, rows) = reconcile(columns, rows, &profile).unwrap();
        assert_eq!(columns, vec!["keep", "also"]);
        assert_eq!(rows[0], vec![t("b"), t("d")]);
    }

    #[test]
    fn filtered_rows_always_carry_a_fiscal_year() {
        let columns = vec![FISCAL_YEAR.to_string(), "計".to_string()];
        let rows = vec![
            vec![t(" 2001年度 "), Cell::Number(1.0)],
            vec![Cell::Empty, Cell::Number(2.0)],
            vec![t("合計"), Cell::Number(3.0)],
            vec![t("2002年度"), Cell::Number(4.0)],
        ];
        let (columns, rows) = reconcile(columns, rows, &base_profile()).unwrap();
        let fy = columns.iter().position(|c| c == FISCAL_YEAR).unwrap();
        assert_eq!(rows.len(), 2);
        for row in &rows {
            let year = parse_fiscal_year(&row[fy]).expect("retained row has a year");
            assert!((YEAR_MIN..=YEAR_MAX).contains(&year));
        }
        // whitespace stripped from the fiscal-year column
        assert_eq!(rows[0][fy], t("2001年度"));
    }

    #[test]
    fn filter_without_fiscal_year_column_is_an_error() {
        // a hand-written profile can demand the filter while relabeling
        // nothing; that must surface, not silently keep every row
        let columns = vec!["計".to_string()];
        let rows = vec![vec![Cell::Number(1.0)]];
        let err = reconcile(columns, rows, &base_profile()).unwrap_err();
        assert!(err.contains(FISCAL_YEAR), "{err}");
    }
}
