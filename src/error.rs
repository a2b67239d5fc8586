use thiserror::Error;

/// Errors surfaced by the inventory core.
#[derive(Error, Debug)]
pub enum InventoryError {
    /// A required column is absent from an input dataset
    #[error("missing required column(s): {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    /// Input was structurally present but failed a semantic check
    #[error("{0}")]
    Validation(String),

    /// Database or spreadsheet read failed
    #[error("failed to read inventory source: {0}")]
    Source(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

impl InventoryError {
    pub fn schema<I, S>(missing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        InventoryError::Schema {
            missing: missing.into_iter().map(Into::into).collect(),
        }
    }
}

pub type Result<T, E = InventoryError> = std::result::Result<T, E>;
