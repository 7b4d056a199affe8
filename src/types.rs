use crate::error::{ConsolidateError, ConsolidateResult};
use crate::schema::SchemaCatalog;
use serde::Serialize;

/// One row of text cells, positionally aligned with its table's columns.
pub type Row = Vec<String>;

//==============================================================================
// Input
//==============================================================================

/// A named in-memory file handed to the batch driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Source format, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Delimited,
    Workbook,
}

impl FileFormat {
    const WORKBOOK_EXTENSIONS: [&'static str; 5] = ["xlsx", "xlsm", "xls", "xlsb", "ods"];

    /// Detect the format from a file name (case-insensitive extension).
    pub fn detect(file_name: &str) -> Option<Self> {
        let ext = std::path::Path::new(file_name)
            .extension()?
            .to_str()?
            .to_lowercase();
        if ext == "csv" {
            Some(FileFormat::Delimited)
        } else if Self::WORKBOOK_EXTENSIONS.contains(&ext.as_str()) {
            Some(FileFormat::Workbook)
        } else {
            None
        }
    }
}

//==============================================================================
// Tables
//==============================================================================

/// Raw content of one file: its header row and text-typed data rows.
///
/// Every row has exactly `headers.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceTable {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl SourceTable {
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// One file's rows mapped onto `[provenance] + canonical schema`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledTable {
    pub source: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl ReconciledTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }
}

/// Running concatenation of every reconciled file, in processing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsolidatedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl ConsolidatedTable {
    /// Empty table carrying the output header.
    pub fn new(catalog: &SchemaCatalog, provenance_column: &str) -> Self {
        let mut columns = Vec::with_capacity(catalog.len() + 1);
        columns.push(provenance_column.to_string());
        columns.extend(catalog.columns().iter().cloned());
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Fold step: `self`'s rows followed by `next`'s rows.
    pub fn append(mut self, next: ReconciledTable) -> ConsolidateResult<Self> {
        self.extend(next)?;
        Ok(self)
    }

    /// In-place variant of [`append`](Self::append). Rows are moved, not copied.
    pub fn extend(&mut self, next: ReconciledTable) -> ConsolidateResult<()> {
        if next.columns != self.columns {
            return Err(ConsolidateError::ColumnMismatch(format!(
                "'{}' has {} columns that do not match the consolidated header",
                next.source,
                next.columns.len()
            )));
        }
        self.rows.extend(next.rows);
        Ok(())
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    /// First `n` rows, for display.
    pub fn preview(&self, n: usize) -> &[Row] {
        &self.rows[..n.min(self.rows.len())]
    }
}
