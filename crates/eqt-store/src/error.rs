use std::fmt;

/// Errors produced while reading or writing the CSV exports.
#[derive(Debug)]
pub enum StoreError {
    /// Filesystem failure on `path`.
    Io { path: String, message: String },
    /// Malformed CSV (bad quoting, invalid UTF-8).
    Csv(String),
    /// A planned write points at a row the table does not have.
    RowOutOfRange { row_number: usize, rows: usize },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io { path, message } => write!(f, "io error on '{path}': {message}"),
            StoreError::Csv(msg) => write!(f, "csv error: {msg}"),
            StoreError::RowOutOfRange { row_number, rows } => write!(
                f,
                "row {row_number} is outside the equipment table ({rows} data rows)"
            ),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<csv::Error> for StoreError {
    fn from(e: csv::Error) -> Self {
        StoreError::Csv(e.to_string())
    }
}

pub(crate) fn io_error(path: &std::path::Path, e: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}
