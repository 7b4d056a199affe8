//! Excel exporter implementation

use crate::error::{ConsolidateError, ConsolidateResult};
use crate::types::ConsolidatedTable;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::borrow::Cow;
use std::path::Path;
use tracing::warn;

const MAX_COLUMN_WIDTH: f64 = 60.0;

/// Longest text Excel stores in one cell, in characters.
pub const MAX_CELL_CHARS: usize = 32_767;

/// Cut `value` to at most [`MAX_CELL_CHARS`] characters.
pub fn truncate_cell(value: &str) -> Cow<'_, str> {
    match value.char_indices().nth(MAX_CELL_CHARS) {
        Some((cut, _)) => Cow::Owned(value[..cut].to_string()),
        None => Cow::Borrowed(value),
    }
}

/// Excel exporter for a consolidated table
pub struct ExcelExporter<'a> {
    table: &'a ConsolidatedTable,
    sheet_name: String,
}

impl<'a> ExcelExporter<'a> {
    /// Create a new Excel exporter
    pub fn new(table: &'a ConsolidatedTable) -> Self {
        Self {
            table,
            sheet_name: "Sheet1".to_string(),
        }
    }

    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }

    /// Serialize the workbook to an in-memory .xlsx byte stream
    pub fn to_bytes(&self) -> ConsolidateResult<Vec<u8>> {
        let mut workbook = self.build()?;
        workbook
            .save_to_buffer()
            .map_err(|e| ConsolidateError::Export(format!("Failed to encode Excel file: {}", e)))
    }

    /// Export the workbook to an .xlsx file
    pub fn export(&self, output_path: &Path) -> ConsolidateResult<()> {
        let mut workbook = self.build()?;
        workbook
            .save(output_path)
            .map_err(|e| ConsolidateError::Export(format!("Failed to save Excel file: {}", e)))
    }

    fn build(&self) -> ConsolidateResult<Workbook> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(&self.sheet_name)
            .map_err(|e| ConsolidateError::Export(format!("Failed to set worksheet name: {}", e)))?;

        self.write_header(worksheet)?;
        self.write_rows(worksheet)?;

        Ok(workbook)
    }

    fn write_header(&self, worksheet: &mut Worksheet) -> ConsolidateResult<()> {
        let bold = Format::new().set_bold();
        for (col_idx, name) in self.table.columns.iter().enumerate() {
            let col = column_index(col_idx)?;
            worksheet
                .write_string_with_format(0, col, name, &bold)
                .map_err(|e| ConsolidateError::Export(format!("Failed to write header: {}", e)))?;

            let width = (name.chars().count() as f64 + 2.0).min(MAX_COLUMN_WIDTH);
            worksheet
                .set_column_width(col, width)
                .map_err(|e| ConsolidateError::Export(format!("Failed to size column: {}", e)))?;
        }
        worksheet
            .set_freeze_panes(1, 0)
            .map_err(|e| ConsolidateError::Export(format!("Failed to freeze header: {}", e)))?;
        Ok(())
    }

    fn write_rows(&self, worksheet: &mut Worksheet) -> ConsolidateResult<()> {
        for (row_idx, row) in self.table.rows.iter().enumerate() {
            // Row 0 is the header
            let excel_row = u32::try_from(row_idx + 1).map_err(|_| {
                ConsolidateError::Export("Too many rows for an Excel worksheet".to_string())
            })?;

            for (col_idx, value) in row.iter().enumerate() {
                // Empty cells stay blank
                if value.is_empty() {
                    continue;
                }
                let text = truncate_cell(value);
                if text.len() != value.len() {
                    warn!(row = row_idx + 1, column = col_idx, "cell truncated to Excel limit");
                }
                worksheet
                    .write_string(excel_row, column_index(col_idx)?, text)
                    .map_err(|e| {
                        ConsolidateError::Export(format!(
                            "Failed to write row {}: {}",
                            row_idx + 1,
                            e
                        ))
                    })?;
            }
        }
        Ok(())
    }
}

fn column_index(idx: usize) -> ConsolidateResult<u16> {
    u16::try_from(idx)
        .map_err(|_| ConsolidateError::Export("Too many columns for an Excel worksheet".to_string()))
}

/// Encode `table` as a single-sheet .xlsx byte stream.
pub fn encode_workbook(table: &ConsolidatedTable, sheet_name: &str) -> ConsolidateResult<Vec<u8>> {
    ExcelExporter::new(table).with_sheet_name(sheet_name).to_bytes()
}
