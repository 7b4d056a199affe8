//! File ingestion
//!
//! Turns one uploaded file into a [`SourceTable`] of text cells:
//! - `.csv` → delimited reader (configurable delimiter and encoding)
//! - `.xlsx` / `.xls` / `.xlsb` / `.ods` → workbook reader (sheet located by
//!   preferred name, picker, or first sheet)
//!
//! Ingestion holds no state between files.

mod csv_reader;
mod sheet_locator;
mod workbook;

pub use csv_reader::read_delimited;
pub use sheet_locator::{find_preferred_sheet, select_sheet, SheetPicker};
pub use workbook::{cell_to_text, read_workbook, sheet_names};

use crate::config::ConsolidateConfig;
use crate::error::{ConsolidateError, ConsolidateResult, IngestError};
use crate::types::{FileFormat, InputFile, SourceTable};
use std::path::Path;
use tracing::debug;

/// Read one file, detecting its format from the file name.
pub fn ingest(
    file: &InputFile,
    config: &ConsolidateConfig,
    picker: Option<&dyn SheetPicker>,
) -> Result<SourceTable, IngestError> {
    let format = FileFormat::detect(&file.name).ok_or_else(|| {
        IngestError::new(
            &file.name,
            "unsupported file type (expected .csv, .xlsx or .xls)",
        )
    })?;
    ingest_as(file, format, config, picker)
}

/// Read one file with an explicit format.
pub fn ingest_as(
    file: &InputFile,
    format: FileFormat,
    config: &ConsolidateConfig,
    picker: Option<&dyn SheetPicker>,
) -> Result<SourceTable, IngestError> {
    debug!(file = %file.name, ?format, bytes = file.bytes.len(), "ingesting");
    let table = match format {
        FileFormat::Delimited => read_delimited(&file.name, &file.bytes, &config.csv)?,
        FileFormat::Workbook => {
            read_workbook(&file.name, &file.bytes, &config.workbook, picker)?
        }
    };
    debug!(
        file = %file.name,
        columns = table.headers.len(),
        rows = table.row_count(),
        "ingested"
    );
    Ok(table)
}

/// Load a file from disk. The file's final path component becomes its name.
pub fn load_input(path: &Path) -> ConsolidateResult<InputFile> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            ConsolidateError::Validation(format!("Invalid file name: {}", path.display()))
        })?
        .to_string();
    let bytes = std::fs::read(path)?;
    Ok(InputFile::new(name, bytes))
}

/// Whether a path has an extension this crate can ingest.
pub fn is_supported(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| FileFormat::detect(n).is_some())
        .unwrap_or(false)
}

/// Expand directories into their supported files (sorted by name); plain
/// paths are kept as given.
pub fn expand_inputs(paths: &[impl AsRef<Path>]) -> ConsolidateResult<Vec<std::path::PathBuf>> {
    let mut expanded = Vec::new();
    for path in paths {
        let path = path.as_ref();
        if path.is_dir() {
            let mut entries: Vec<_> = std::fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_supported(p))
                .collect();
            entries.sort();
            expanded.extend(entries);
        } else {
            expanded.push(path.to_path_buf());
        }
    }
    Ok(expanded)
}
