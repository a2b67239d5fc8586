use std::path::Path;

use anyhow::{bail, Result};

use crate::domain::entities::table::Table;
use crate::infra::import::csv::{read_catalog_csv, read_csv_table};
use crate::infra::import::xlsx::{read_catalog_workbook, read_workbook_table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Workbook,
    Delimited,
}

fn file_kind(path: &Path) -> Result<FileKind> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "xlsx" | "xlsm" | "xls" | "ods" => Ok(FileKind::Workbook),
        "csv" | "txt" => Ok(FileKind::Delimited),
        _ => bail!("unsupported file type: {}", path.display()),
    }
}

pub fn read_inventory_file(path: &Path) -> Result<Table> {
    match file_kind(path)? {
        FileKind::Workbook => read_workbook_table(path),
        FileKind::Delimited => read_csv_table(path),
    }
}

pub fn read_catalog_file(path: &Path) -> Result<Table> {
    match file_kind(path)? {
        FileKind::Workbook => read_catalog_workbook(path),
        FileKind::Delimited => read_catalog_csv(path),
    }
}
