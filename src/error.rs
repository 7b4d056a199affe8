use thiserror::Error;

pub type ConsolidateResult<T> = Result<T, ConsolidateError>;

/// A single input file could not be read or parsed.
///
/// Recovered at batch level: the file is skipped and a diagnostic is recorded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{file}: {cause}")]
pub struct IngestError {
    pub file: String,
    pub cause: String,
}

impl IngestError {
    pub fn new(file: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            cause: cause.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConsolidateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Column mismatch: {0}")]
    ColumnMismatch(String),

    #[error("Validation error: {0}")]
    Validation(String),
}
