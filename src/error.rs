use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn an uploaded file into a dataset. The whole file is
/// rejected; no partial dataset is produced.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("Failed to open workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Workbook contains no sheets")]
    NoSheets,

    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected a top-level JSON array of records")]
    NotAnArray,

    #[error("Row {0} is not a JSON object")]
    RowNotObject(usize),
}

/// Failure to serialize a dataset or to write the exported bytes.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to write workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure of the one-time initialization phase. Fatal for the session.
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    #[error("Failed to install logger: {0}")]
    Logger(#[from] log::SetLoggerError),
}
