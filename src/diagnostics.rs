//! Per-file diagnostics collected during a batch run

use serde::Serialize;
use std::fmt;

/// A non-fatal condition found while processing one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    /// Canonical columns absent from the file (filled with empty text).
    MissingColumns { columns: Vec<String> },
    /// Rows removed because the required field was empty.
    RowsDiscarded { count: usize, required_column: String },
    /// Cells longer than Excel accepts, cut to `max_chars`.
    CellsTruncated { count: usize, max_chars: usize },
    /// The file could not be read at all and was skipped.
    ReadFailure { cause: String },
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::MissingColumns { columns } => {
                write!(f, "missing columns -> {}", columns.join(", "))
            }
            Anomaly::RowsDiscarded {
                count,
                required_column,
            } => write!(f, "{} rows discarded without {}", count, required_column),
            Anomaly::CellsTruncated { count, max_chars } => {
                write!(f, "{} cells truncated to {} characters", count, max_chars)
            }
            Anomaly::ReadFailure { cause } => write!(f, "ERROR while processing -> {}", cause),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticEntry {
    pub file_name: String,
    pub message: String,
}

impl fmt::Display for DiagnosticEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file_name, self.message)
    }
}

/// Append-only log for one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiagnosticsLog {
    entries: Vec<DiagnosticEntry>,
}

impl DiagnosticsLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, file_name: impl Into<String>, message: impl Into<String>) {
        self.entries.push(DiagnosticEntry {
            file_name: file_name.into(),
            message: message.into(),
        });
    }

    pub fn record_anomaly(&mut self, file_name: &str, anomaly: &Anomaly) {
        self.record(file_name, anomaly.to_string());
    }

    pub fn entries(&self) -> &[DiagnosticEntry] {
        &self.entries
    }

    /// Entries rendered as `"{file_name}: {message}"`.
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.to_string()).collect()
    }

    pub fn for_file<'a>(&'a self, file_name: &'a str) -> impl Iterator<Item = &'a DiagnosticEntry> {
        self.entries.iter().filter(move |e| e.file_name == file_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
