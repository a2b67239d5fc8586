use std::path::Path;

use anyhow::{Context, Result};
use csv::StringRecord;
use tracing::info;

use crate::domain::entities::table::{CellValue, Table};

fn field_to_value(field: &str) -> CellValue {
    if field.trim().is_empty() {
        CellValue::Null
    } else {
        CellValue::text(field)
    }
}

fn is_empty_record(record: &StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty())
}

fn read_records(csv_path: &Path) -> Result<Vec<StringRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("failed to open csv: {}", csv_path.display()))?;

    let mut records = Vec::new();
    for record in reader.records() {
        records.push(record.context("failed to parse csv record")?);
    }
    Ok(records)
}

fn records_to_table(records: &[StringRecord], header_idx: Option<usize>) -> Table {
    let Some(header_idx) = header_idx else {
        return Table::default();
    };
    let columns = records[header_idx]
        .iter()
        .map(|name| name.trim_start_matches('\u{feff}').to_string())
        .collect();
    let rows = records[header_idx + 1..]
        .iter()
        .filter(|record| !is_empty_record(record))
        .map(|record| record.iter().map(field_to_value).collect())
        .collect();
    Table::from_rows(columns, rows)
}

/// Reads a delimited file; the first non-empty record is the header.
pub fn read_csv_table(csv_path: &Path) -> Result<Table> {
    let records = read_records(csv_path)?;
    let header_idx = records.iter().position(|record| !is_empty_record(record));
    let table = records_to_table(&records, header_idx);
    info!(path = %csv_path.display(), rows = table.len(), "csv read");
    Ok(table)
}

pub fn read_catalog_csv(csv_path: &Path) -> Result<Table> {
    let records = read_records(csv_path)?;
    let header_idx = records
        .iter()
        .position(|record| {
            let lowered: Vec<String> = record.iter().map(str::to_lowercase).collect();
            lowered.iter().any(|field| field.contains("concatenar"))
                && lowered.iter().any(|field| field.contains("descuento"))
        })
        .or_else(|| records.iter().position(|record| !is_empty_record(record)));
    let table = records_to_table(&records, header_idx);
    info!(path = %csv_path.display(), rows = table.len(), "catalog csv read");
    Ok(table)
}
