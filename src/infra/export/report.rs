//! Writers for the current view: the full table and per-column reports.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use tracing::info;

use crate::domain::entities::columns::DUPLICATE_TAG;
use crate::domain::entities::table::{CellValue, Table};
use crate::error::{InventoryError, Result};

const VIEW_SHEET_NAME: &str = "Existencias";

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn write_table(table: &Table, path: &Path) -> Result<()> {
    create_parent_dir(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(table.columns())?;
    for row in table.to_string_rows() {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

fn without_internal_columns(view: &Table) -> Table {
    let mut table = view.clone();
    table.drop_column(DUPLICATE_TAG);
    table
}

fn ensure_known(view: &Table, columns: &[String]) -> Result<()> {
    let unknown: Vec<&str> = columns
        .iter()
        .filter(|name| !view.has_column(name))
        .map(String::as_str)
        .collect();
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(InventoryError::Validation(format!(
            "unknown export column(s): {}",
            unknown.join(", ")
        )))
    }
}

/// File-system safe stem for a column name.
fn file_stem(column: &str) -> String {
    let stem: String = column
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "columna".to_string()
    } else {
        stem
    }
}

fn write_cell(ws: &mut Worksheet, row: u32, col: u16, cell: &CellValue) -> Result<(), XlsxError> {
    match cell {
        CellValue::Null => {}
        CellValue::Bool(value) => {
            ws.write_boolean(row, col, *value)?;
        }
        CellValue::Int(value) => {
            ws.write_number(row, col, *value as f64)?;
        }
        CellValue::Float(value) if value.is_finite() => {
            ws.write_number(row, col, *value)?;
        }
        CellValue::Float(_) => {}
        CellValue::Text(value) => {
            ws.write_string(row, col, value)?;
        }
    }
    Ok(())
}

fn write_view_sheet(wb: &mut Workbook, table: &Table) -> Result<(), XlsxError> {
    let ws = wb.add_worksheet();
    ws.set_name(VIEW_SHEET_NAME)?;

    let header = Format::new().set_bold();
    for (col, name) in table.columns().iter().enumerate() {
        ws.write_string_with_format(0, col as u16, name, &header)?;
    }
    for (idx, row) in table.rows().iter().enumerate() {
        let row_num = (idx + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            write_cell(ws, row_num, col as u16, cell)?;
        }
    }
    Ok(())
}

/// Writes the whole view to a one-sheet workbook with a header row, minus the
/// duplicate tag column.
pub fn export_table_xlsx(view: &Table, path: &Path) -> Result<PathBuf> {
    let table = without_internal_columns(view);
    create_parent_dir(path)?;
    let mut wb = Workbook::new();
    write_view_sheet(&mut wb, &table)?;
    wb.save(path)?;
    info!(path = %path.display(), rows = table.len(), "view exported");
    Ok(path.to_path_buf())
}

/// One file per data column, each holding the key columns followed by that
/// data column.
pub fn export_column_reports(
    view: &Table,
    key_columns: &[String],
    data_columns: &[String],
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    if data_columns.is_empty() {
        return Err(InventoryError::Validation(
            "select at least one column to export".to_string(),
        ));
    }
    ensure_known(view, key_columns)?;
    ensure_known(view, data_columns)?;
    std::fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(data_columns.len());
    let mut used_stems: HashSet<String> = HashSet::new();
    for column in data_columns {
        let mut selection: Vec<String> = key_columns
            .iter()
            .filter(|key| *key != column)
            .cloned()
            .collect();
        selection.push(column.clone());

        let base = file_stem(column);
        let mut stem = base.clone();
        let mut suffix = 2;
        while !used_stems.insert(stem.to_lowercase()) {
            stem = format!("{base}_{suffix}");
            suffix += 1;
        }
        let path = dir.join(format!("{stem}.csv"));
        write_table(&view.select(&selection), &path)?;
        written.push(path);
    }

    info!(dir = %dir.display(), files = written.len(), "column reports exported");
    Ok(written)
}

/// All selected columns in a single file.
pub fn export_combined_report(view: &Table, columns: &[String], path: &Path) -> Result<PathBuf> {
    if columns.is_empty() {
        return Err(InventoryError::Validation(
            "select at least one column to export".to_string(),
        ));
    }
    ensure_known(view, columns)?;
    let table = without_internal_columns(&view.select(columns));
    write_table(&table, path)?;
    info!(path = %path.display(), columns = columns.len(), "combined report exported");
    Ok(path.to_path_buf())
}
