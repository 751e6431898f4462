use std::path::Path;

use anyhow::{ensure, Context, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use tracing::info;

/// Open a workbook (`.xlsx` or `.xls`) and return the cell grid of the
/// sheet at the zero-based `sheet_index`.
pub fn load_grid(path: &Path, sheet_index: usize) -> Result<Range<Data>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open workbook {}", path.display()))?;
    let names = workbook.sheet_names().to_owned();
    ensure!(
        sheet_index < names.len(),
        "sheet index {} out of range: {} has {} sheet(s)",
        sheet_index,
        path.display(),
        names.len()
    );

    let grid = workbook
        .worksheet_range_at(sheet_index)
        .with_context(|| format!("sheet {sheet_index} vanished while reading"))?
        .with_context(|| format!("failed to read sheet {:?}", names[sheet_index]))?;
    info!(
        "Loaded sheet {:?}: {} rows x {} cols",
        names[sheet_index],
        grid.height(),
        grid.width()
    );
    Ok(grid)
}

/// Name and dimensions for one sheet of a workbook.
pub struct SheetInfo {
    pub name: String,
    pub rows: usize,
    pub cols: usize,
}

pub fn sheet_overview(path: &Path) -> Result<Vec<SheetInfo>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open workbook {}", path.display()))?;
    let names = workbook.sheet_names().to_owned();

    let mut sheets = Vec::with_capacity(names.len());
    for (index, name) in names.iter().enumerate() {
        let grid = workbook
            .worksheet_range_at(index)
            .with_context(|| format!("sheet {index} vanished while reading"))?
            .with_context(|| format!("failed to read sheet {name:?}"))?;
        sheets.push(SheetInfo {
            name: name.clone(),
            rows: grid.height(),
            cols: grid.width(),
        });
    }
    Ok(sheets)
}

/// A1-style cell reference from zero-based row and column, for error
/// messages that users look up in Excel.
pub fn cell_ref(row: u32, col: u32) -> String {
    let mut letters = String::new();
    let mut n = col as usize + 1;
    while n > 0 {
        let remainder = (n - 1) % 26;
        letters.insert(0, (b'A' + remainder as u8) as char);
        n = (n - 1) / 26;
    }
    format!("{}{}", letters, row + 1)
}

// ── Tests ──
