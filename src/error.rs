use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot access {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Configuration loading error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Airport '{airport_code}' in {source_name} (line {line}) has no entry in the airport-to-state lookup")]
    UnmappedAirport {
        airport_code: String,
        source_name: String,
        line: u64,
    },

    #[error("{source_name}: {skipped} of {total} rows were malformed, above the allowed ratio of {max_ratio:.2}")]
    ExcessiveSkips {
        source_name: String,
        skipped: usize,
        total: usize,
        max_ratio: f64,
    },

    #[error("{source_name} ({}) produced no usable rows", path.display())]
    EmptySource { source_name: String, path: PathBuf },

    #[error("Missing required data: {0}")]
    MissingData(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

impl ProcessingError {
    pub fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProcessingError::FileAccess {
            path: path.into(),
            source,
        }
    }
}
