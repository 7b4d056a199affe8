//! Excel export of the consolidated table
//!
//! One worksheet: header row `[provenance] + canonical schema`, then every
//! surviving row, all cells written as text.

mod exporter;

pub use exporter::{encode_workbook, truncate_cell, ExcelExporter, MAX_CELL_CHARS};
