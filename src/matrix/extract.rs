use std::ops::Range as RowRange;

use anyhow::{bail, ensure, Context, Result};
use calamine::{Data, Range};

use crate::matrix::clean::{clean_state_cell, clean_taxon_name};
use crate::sheet::cell_ref;

/// One taxon's worth of matrix data: the cleaned name, the concatenated
/// character-state tokens in column order, and the appearance-date bounds
/// that feed the tip-dating calibration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taxon {
    pub name: String,
    pub charset: String,
    pub nchars: usize,
    /// Last appearance date, the lower `unif` bound. Integer text.
    pub lad: String,
    /// First appearance date, the upper `unif` bound. Integer text.
    pub fad: String,
}

/// Extract one taxon per row over the zero-based, half-open `rows` range,
/// preserving row order. Grid shape problems fail before any row is read;
/// any malformed row aborts the whole extraction.
pub fn extract_rows(grid: &Range<Data>, rows: RowRange<u32>) -> Result<Vec<Taxon>> {
    grid_columns(grid)?;
    ensure!(!rows.is_empty(), "empty row range: no taxa to extract");

    let last_data_row = grid.end().map(|(row, _)| row).unwrap_or(0);
    ensure!(
        rows.end <= last_data_row + 1,
        "row range {}..={} reaches past the sheet's last data row {}",
        rows.start + 1,
        rows.end,
        last_data_row + 1
    );

    let mut taxa = Vec::with_capacity(rows.len());
    for row in rows {
        let taxon = taxon_for_row(grid, row).with_context(|| format!("row {}", row + 1))?;
        taxa.push(taxon);
    }
    Ok(taxa)
}

/// Build the taxon record for a single sheet row: column 0 is the name, the
/// last two columns are the LAD/FAD date bounds, everything between is a
/// character-state cell.
pub fn taxon_for_row(grid: &Range<Data>, row: u32) -> Result<Taxon> {
    let ncols = grid_columns(grid)?;

    let raw_name = match cell(grid, row, 0) {
        Data::String(s) => s.clone(),
        Data::Empty => bail!("empty taxon name at {}", cell_ref(row, 0)),
        other => other.to_string(),
    };
    let name = clean_taxon_name(&raw_name);
    ensure!(
        !name.is_empty(),
        "taxon name at {} is empty after cleaning ({raw_name:?})",
        cell_ref(row, 0)
    );

    let nchars = ncols - 3;
    let mut charset = String::new();
    for col in 1..=nchars as u32 {
        charset.push_str(&state_token(cell(grid, row, col), row, col)?);
    }

    let lad_col = (ncols - 2) as u32;
    let fad_col = (ncols - 1) as u32;
    let lad = date_bound(cell(grid, row, lad_col), row, lad_col)?;
    let fad = date_bound(cell(grid, row, fad_col), row, fad_col)?;

    Ok(Taxon {
        name,
        charset,
        nchars,
        lad,
        fad,
    })
}

/// Absolute column count; a usable matrix needs a name column, at least one
/// character column and the two date columns.
fn grid_columns(grid: &Range<Data>) -> Result<usize> {
    let ncols = grid.end().map(|(_, col)| col as usize + 1).unwrap_or(0);
    ensure!(
        ncols >= 4,
        "sheet needs a name column, at least one character column and two date columns ({ncols} column(s) found)"
    );
    Ok(ncols)
}

fn cell<'a>(grid: &'a Range<Data>, row: u32, col: u32) -> &'a Data {
    static EMPTY: Data = Data::Empty;
    grid.get_value((row, col)).unwrap_or(&EMPTY)
}

fn state_token(data: &Data, row: u32, col: u32) -> Result<String> {
    match data {
        Data::Float(f) => {
            ensure!(*f >= 0.0, "negative state at {}: {f}", cell_ref(row, col));
            Ok((f.trunc() as i64).to_string())
        }
        Data::Int(i) => {
            ensure!(*i >= 0, "negative state at {}: {i}", cell_ref(row, col));
            Ok(i.to_string())
        }
        Data::String(s) => {
            clean_state_cell(s).with_context(|| format!("character cell at {}", cell_ref(row, col)))
        }
        Data::Empty => bail!("empty character cell at {}", cell_ref(row, col)),
        other => bail!(
            "unsupported character cell at {}: {other:?}",
            cell_ref(row, col)
        ),
    }
}

/// Date bounds arrive as numeric cells (or numeric text) and truncate to
/// integer years; the calibration interval cannot be negative.
fn date_bound(data: &Data, row: u32, col: u32) -> Result<String> {
    let value = match data {
        Data::Float(f) => *f,
        Data::Int(i) => *i as f64,
        Data::String(s) => s.trim().parse::<f64>().ok().with_context(|| {
            format!("non-numeric date cell at {}: {s:?}", cell_ref(row, col))
        })?,
        other => bail!("non-numeric date cell at {}: {other:?}", cell_ref(row, col)),
    };
    ensure!(
        value >= 0.0,
        "negative date bound at {}: {value}",
        cell_ref(row, col)
    );
    Ok((value.trunc() as i64).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(value: &str) -> Data {
        Data::String(value.to_string())
    }

    fn f(value: f64) -> Data {
        Data::Float(value)
    }

    fn grid(rows: &[Vec<Data>]) -> Range<Data> {
        let height = rows.len() as u32;
        let width = rows.iter().map(Vec::len).max().unwrap() as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), value.clone());
            }
        }
        range
    }

    fn two_taxon_grid() -> Range<Data> {
        grid(&[
            vec![s("Alpha beta"), s("0"), s("1"), f(2.0), f(5.0)],
            vec![s("Gamma(1)"), s("0,1"), s("?"), f(1.0), f(3.0)],
        ])
    }

    #[test]
    fn extracts_records_in_row_order() {
        let taxa = extract_rows(&two_taxon_grid(), 0..2).unwrap();
        assert_eq!(
            taxa,
            vec![
                Taxon {
                    name: "Alpha_beta".into(),
                    charset: "01".into(),
                    nchars: 2,
                    lad: "2".into(),
                    fad: "5".into(),
                },
                Taxon {
                    name: "Gamma1".into(),
                    charset: "(01)?".into(),
                    nchars: 2,
                    lad: "1".into(),
                    fad: "3".into(),
                },
            ]
        );
    }

    #[test]
    fn partial_row_range() {
        let taxa = extract_rows(&two_taxon_grid(), 1..2).unwrap();
        assert_eq!(taxa.len(), 1);
        assert_eq!(taxa[0].name, "Gamma1");
    }

    #[test]
    fn numeric_cells_truncate() {
        let g = grid(&[vec![s("Alpha"), f(2.0), s("-"), f(2.9), Data::Int(5)]]);
        let taxon = taxon_for_row(&g, 0).unwrap();
        assert_eq!(taxon.charset, "2-");
        assert_eq!(taxon.lad, "2");
        assert_eq!(taxon.fad, "5");
    }

    #[test]
    fn numeric_text_dates_accepted() {
        let g = grid(&[vec![s("Alpha"), s("0"), s("2.0"), s("5")]]);
        let taxon = taxon_for_row(&g, 0).unwrap();
        assert_eq!((taxon.lad.as_str(), taxon.fad.as_str()), ("2", "5"));
    }

    #[test]
    fn non_numeric_date_names_the_cell() {
        let g = grid(&[vec![s("Alpha"), s("0"), s("old"), f(5.0)]]);
        let err = taxon_for_row(&g, 0).unwrap_err();
        assert!(err.to_string().contains("C1"), "{err}");
    }

    #[test]
    fn negative_date_rejected() {
        let g = grid(&[vec![s("Alpha"), s("0"), f(-2.0), f(5.0)]]);
        assert!(taxon_for_row(&g, 0).is_err());
    }

    #[test]
    fn empty_state_cell_rejected() {
        let g = grid(&[vec![s("Alpha"), Data::Empty, f(2.0), f(5.0)]]);
        let err = taxon_for_row(&g, 0).unwrap_err();
        assert!(err.to_string().contains("B1"), "{err}");
    }

    #[test]
    fn empty_name_after_cleaning_rejected() {
        let g = grid(&[vec![s("?()"), s("0"), f(2.0), f(5.0)]]);
        assert!(taxon_for_row(&g, 0).is_err());
    }

    #[test]
    fn narrow_grid_fails_fast() {
        let g = grid(&[vec![s("Alpha"), f(2.0), f(5.0)]]);
        let err = extract_rows(&g, 0..1).unwrap_err();
        assert!(err.to_string().contains("column"), "{err}");
    }

    #[test]
    fn range_past_last_row_fails_fast() {
        let err = extract_rows(&two_taxon_grid(), 0..5).unwrap_err();
        assert!(err.to_string().contains("last data row"), "{err}");
    }

    #[test]
    fn empty_range_rejected() {
        assert!(extract_rows(&two_taxon_grid(), 1..1).is_err());
    }

    #[test]
    fn bad_row_error_names_the_row() {
        let g = grid(&[
            vec![s("Alpha"), s("0"), f(2.0), f(5.0)],
            vec![s("Beta"), s("junk"), f(2.0), f(5.0)],
        ]);
        let err = extract_rows(&g, 0..2).unwrap_err();
        assert!(format!("{err:#}").contains("row 2"), "{err:#}");
    }
}
