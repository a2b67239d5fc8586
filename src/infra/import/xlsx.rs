use std::path::Path;

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use tracing::info;

use crate::domain::entities::table::{CellValue, Table};

pub fn cell_to_value(cell: &Data) -> CellValue {
    match cell {
        Data::String(v) => CellValue::Text(v.to_string()),
        Data::Float(v) => CellValue::Float(*v),
        Data::Int(v) => CellValue::Int(*v),
        Data::Bool(v) => CellValue::Bool(*v),
        Data::DateTime(v) => match v.as_datetime() {
            Some(datetime) => CellValue::Text(datetime.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => CellValue::Float(v.as_f64()),
        },
        Data::DateTimeIso(v) => CellValue::Text(v.to_string()),
        Data::DurationIso(v) => CellValue::Text(v.to_string()),
        Data::Error(_) | Data::Empty => CellValue::Null,
    }
}

fn is_empty_row(row: &[Data]) -> bool {
    row.iter().all(|cell| match cell {
        Data::Empty => true,
        Data::String(v) => v.trim().is_empty(),
        _ => false,
    })
}

fn mentions_catalog_header(row: &[Data]) -> bool {
    let texts: Vec<String> = row
        .iter()
        .filter_map(|cell| match cell {
            Data::String(v) => Some(v.to_lowercase()),
            _ => None,
        })
        .collect();
    texts.iter().any(|text| text.contains("concatenar"))
        && texts.iter().any(|text| text.contains("descuento"))
}

/// Reads the first sheet; the first non-empty row is the header.
pub fn read_workbook_table(path: &Path) -> Result<Table> {
    let rows = first_sheet_rows(path)?;
    let header_idx = rows.iter().position(|row| !is_empty_row(row));
    let table = rows_to_table(&rows, header_idx);
    info!(path = %path.display(), rows = table.len(), "workbook read");
    Ok(table)
}

/// Like [`read_workbook_table`], but skips title rows above the header that
/// names both the reference key and the discount.
pub fn read_catalog_workbook(path: &Path) -> Result<Table> {
    let rows = first_sheet_rows(path)?;
    let header_idx = rows
        .iter()
        .position(|row| mentions_catalog_header(row))
        .or_else(|| rows.iter().position(|row| !is_empty_row(row)));
    let table = rows_to_table(&rows, header_idx);
    info!(path = %path.display(), rows = table.len(), "catalog workbook read");
    Ok(table)
}

fn first_sheet_rows(path: &Path) -> Result<Vec<Vec<Data>>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open workbook: {}", path.display()))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .with_context(|| format!("workbook has no sheets: {}", path.display()))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("failed to read sheet: {sheet_name}"))?;
    Ok(range.rows().map(|row| row.to_vec()).collect())
}

fn rows_to_table(rows: &[Vec<Data>], header_idx: Option<usize>) -> Table {
    let Some(header_idx) = header_idx else {
        return Table::default();
    };
    let columns: Vec<String> = rows[header_idx]
        .iter()
        .map(|cell| cell_to_value(cell).as_text().unwrap_or_default())
        .collect();
    let data = rows[header_idx + 1..]
        .iter()
        .filter(|row| !is_empty_row(row))
        .map(|row| row.iter().map(cell_to_value).collect())
        .collect();
    Table::from_rows(columns, data)
}
