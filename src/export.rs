//! Output artifacts: the consolidated workbook and the optional diagnostics log

use crate::config::OutputConfig;
use crate::diagnostics::DiagnosticsLog;
use crate::error::ConsolidateResult;
use crate::excel::encode_workbook;
use crate::pipeline::BatchReport;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub use crate::excel::ExcelExporter;

/// Encode the diagnostics as UTF-8 text, one line per entry.
///
/// Returns `None` when there is nothing to report.
pub fn encode_log(log: &DiagnosticsLog) -> Option<Vec<u8>> {
    if log.is_empty() {
        return None;
    }
    Some(log.lines().join("\n").into_bytes())
}

/// Paths actually written by [`write_outputs`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenOutputs {
    pub workbook: PathBuf,
    pub log: Option<PathBuf>,
}

/// Write the workbook, and the log file only when diagnostics exist.
pub fn write_outputs(
    report: &BatchReport,
    output: &OutputConfig,
    workbook_path: &Path,
    log_path: &Path,
) -> ConsolidateResult<WrittenOutputs> {
    let bytes = encode_workbook(&report.table, &output.sheet_name)?;
    std::fs::write(workbook_path, bytes)?;
    info!(path = %workbook_path.display(), rows = report.rows(), "workbook written");

    let log = match encode_log(&report.diagnostics) {
        Some(bytes) => {
            std::fs::write(log_path, bytes)?;
            info!(path = %log_path.display(), entries = report.diagnostics.len(), "log written");
            Some(log_path.to_path_buf())
        }
        None => None,
    };

    Ok(WrittenOutputs {
        workbook: workbook_path.to_path_buf(),
        log,
    })
}
