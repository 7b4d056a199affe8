//! Batch driver: ingest → reconcile → validate → accumulate, one file at a time
//!
//! A file that fails to ingest is recorded in the diagnostics log and skipped;
//! it never aborts the batch and never touches rows already accumulated.

use crate::config::ConsolidateConfig;
use crate::diagnostics::{Anomaly, DiagnosticsLog};
use crate::error::{ConsolidateResult, IngestError};
use crate::ingest::{self, SheetPicker};
use crate::excel::MAX_CELL_CHARS;
use crate::reconcile::{reconcile, truncate_long_cells, validate};
use crate::schema::SchemaCatalog;
use crate::types::{ConsolidatedTable, InputFile, ReconciledTable};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// One file after reconciliation and validation, ready to be accumulated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedFile {
    pub table: ReconciledTable,
    pub rows_read: usize,
    pub rows_discarded: usize,
    pub missing_columns: Vec<String>,
    pub cells_truncated: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Consolidated,
    Failed { cause: String },
}

/// Per-file summary kept in the batch report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub name: String,
    #[serde(flatten)]
    pub status: FileStatus,
    pub rows_read: usize,
    pub rows_kept: usize,
    pub rows_discarded: usize,
    pub missing_columns: Vec<String>,
    pub cells_truncated: usize,
}

impl FileOutcome {
    fn failed(name: &str, cause: &str) -> Self {
        Self {
            name: name.to_string(),
            status: FileStatus::Failed {
                cause: cause.to_string(),
            },
            rows_read: 0,
            rows_kept: 0,
            rows_discarded: 0,
            missing_columns: Vec::new(),
            cells_truncated: 0,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, FileStatus::Failed { .. })
    }
}

/// Progress notification sent after each file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress<'a> {
    pub processed: usize,
    pub total: usize,
    pub file_name: &'a str,
}

impl Progress<'_> {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.processed as f64 / self.total as f64
        }
    }
}

/// Everything a batch run produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub table: ConsolidatedTable,
    pub diagnostics: DiagnosticsLog,
    pub files: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn files_failed(&self) -> usize {
        self.files.iter().filter(|f| f.is_failed()).count()
    }

    pub fn rows(&self) -> usize {
        self.table.row_count()
    }
}

pub struct Consolidator {
    config: ConsolidateConfig,
    catalog: SchemaCatalog,
    picker: Option<Box<dyn SheetPicker>>,
}

impl Consolidator {
    /// Validate the configuration and prepare a driver.
    ///
    /// Configuration errors are fatal and surface here, before any file is read.
    pub fn new(config: ConsolidateConfig) -> ConsolidateResult<Self> {
        let catalog = config.catalog()?;
        Ok(Self {
            config,
            catalog,
            picker: None,
        })
    }

    /// Attach an interactive sheet picker, consulted only when enabled in the
    /// workbook options and the preferred sheet is absent.
    pub fn with_picker(mut self, picker: Box<dyn SheetPicker>) -> Self {
        self.picker = Some(picker);
        self
    }

    pub fn config(&self) -> &ConsolidateConfig {
        &self.config
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    /// Fresh accumulator: canonical header, no rows.
    pub fn empty_table(&self) -> ConsolidatedTable {
        ConsolidatedTable::new(&self.catalog, &self.config.schema.provenance_column)
    }

    /// Process a single file without touching any shared state.
    pub fn process_file(&self, file: &InputFile) -> Result<ProcessedFile, IngestError> {
        let source = ingest::ingest(file, &self.config, self.picker.as_deref())?;
        let rows_read = source.row_count();

        let reconciliation = reconcile(
            source,
            &self.catalog,
            &file.name,
            &self.config.schema.provenance_column,
        );
        let (mut table, rows_discarded) =
            validate(reconciliation.table, &self.config.schema.required_column);
        let cells_truncated = truncate_long_cells(&mut table, MAX_CELL_CHARS);

        debug!(
            file = %file.name,
            rows_read,
            rows_kept = table.row_count(),
            rows_discarded,
            missing = reconciliation.missing_columns.len(),
            cells_truncated,
            "reconciled"
        );

        Ok(ProcessedFile {
            table,
            rows_read,
            rows_discarded,
            missing_columns: reconciliation.missing_columns,
            cells_truncated,
        })
    }

    pub fn run(&self, inputs: Vec<InputFile>) -> BatchReport {
        self.run_with_progress(inputs, |_| {})
    }

    pub fn run_with_progress<F>(&self, inputs: Vec<InputFile>, progress: F) -> BatchReport
    where
        F: FnMut(&Progress<'_>),
    {
        let total = inputs.len();
        self.run_sources(total, inputs.into_iter().map(Ok), progress)
    }

    /// Read files from disk one at a time; unreadable files become diagnostics.
    pub fn run_paths<P, F>(&self, paths: &[P], progress: F) -> BatchReport
    where
        P: AsRef<Path>,
        F: FnMut(&Progress<'_>),
    {
        let sources = paths.iter().map(|p| {
            let path = p.as_ref();
            ingest::load_input(path).map_err(|e| {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                IngestError::new(name, e.to_string())
            })
        });
        self.run_sources(paths.len(), sources, progress)
    }

    fn run_sources<I, F>(&self, total: usize, sources: I, mut progress: F) -> BatchReport
    where
        I: Iterator<Item = Result<InputFile, IngestError>>,
        F: FnMut(&Progress<'_>),
    {
        info!(files = total, "consolidation started");

        let mut table = self.empty_table();
        let mut diagnostics = DiagnosticsLog::new();
        let mut files = Vec::with_capacity(total);

        for (idx, source) in sources.enumerate() {
            let processed = source.and_then(|file| {
                let result = self.process_file(&file);
                result.map(|p| (file.name, p))
            });

            let outcome = match processed {
                Ok((name, processed)) => {
                    self.accumulate(&name, processed, &mut table, &mut diagnostics)
                }
                Err(err) => {
                    let anomaly = Anomaly::ReadFailure {
                        cause: err.cause.clone(),
                    };
                    warn!(file = %err.file, cause = %err.cause, "file skipped");
                    diagnostics.record_anomaly(&err.file, &anomaly);
                    FileOutcome::failed(&err.file, &err.cause)
                }
            };

            progress(&Progress {
                processed: idx + 1,
                total,
                file_name: &outcome.name,
            });
            files.push(outcome);
        }

        info!(
            files = total,
            rows = table.row_count(),
            diagnostics = diagnostics.len(),
            "consolidation finished"
        );

        BatchReport {
            table,
            diagnostics,
            files,
        }
    }

    fn accumulate(
        &self,
        name: &str,
        processed: ProcessedFile,
        table: &mut ConsolidatedTable,
        diagnostics: &mut DiagnosticsLog,
    ) -> FileOutcome {
        let rows_kept = processed.table.row_count();

        if let Err(err) = table.extend(processed.table) {
            let cause = err.to_string();
            warn!(file = name, cause = %cause, "file skipped");
            diagnostics.record_anomaly(name, &Anomaly::ReadFailure { cause: cause.clone() });
            return FileOutcome::failed(name, &cause);
        }

        if processed.rows_discarded > 0 {
            let anomaly = Anomaly::RowsDiscarded {
                count: processed.rows_discarded,
                required_column: self.config.schema.required_column.clone(),
            };
            warn!(file = name, count = processed.rows_discarded, "rows discarded");
            diagnostics.record_anomaly(name, &anomaly);
        }

        if !processed.missing_columns.is_empty() {
            let anomaly = Anomaly::MissingColumns {
                columns: processed.missing_columns.clone(),
            };
            warn!(file = name, missing = processed.missing_columns.len(), "missing columns");
            diagnostics.record_anomaly(name, &anomaly);
        }

        if processed.cells_truncated > 0 {
            let anomaly = Anomaly::CellsTruncated {
                count: processed.cells_truncated,
                max_chars: MAX_CELL_CHARS,
            };
            warn!(file = name, count = processed.cells_truncated, "cells truncated");
            diagnostics.record_anomaly(name, &anomaly);
        }

        FileOutcome {
            name: name.to_string(),
            status: FileStatus::Consolidated,
            rows_read: processed.rows_read,
            rows_kept,
            rows_discarded: processed.rows_discarded,
            missing_columns: processed.missing_columns,
            cells_truncated: processed.cells_truncated,
        }
    }
}
