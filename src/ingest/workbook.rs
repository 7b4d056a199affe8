//! Workbook reader (.xlsx / .xls / .xlsb / .ods) backed by calamine

use super::sheet_locator::{select_sheet, SheetPicker};
use crate::config::WorkbookOptions;
use crate::error::IngestError;
use crate::types::{Row, SourceTable};
use calamine::{open_workbook_auto_from_rs, Data, DataType, Range, Reader, Sheets};
use std::io::Cursor;
use tracing::debug;

type MemoryWorkbook<'a> = Sheets<Cursor<&'a [u8]>>;

fn open<'a>(file_name: &str, bytes: &'a [u8]) -> Result<MemoryWorkbook<'a>, IngestError> {
    open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| IngestError::new(file_name, format!("cannot open workbook: {}", e)))
}

/// Sheet names in workbook order.
pub fn sheet_names(file_name: &str, bytes: &[u8]) -> Result<Vec<String>, IngestError> {
    Ok(open(file_name, bytes)?.sheet_names())
}

/// Read the located sheet: first row is the header, the rest are data rows.
pub fn read_workbook(
    file_name: &str,
    bytes: &[u8],
    options: &WorkbookOptions,
    picker: Option<&dyn SheetPicker>,
) -> Result<SourceTable, IngestError> {
    let mut workbook = open(file_name, bytes)?;
    let names = workbook.sheet_names();
    let sheet = select_sheet(file_name, &names, options, picker)?;
    debug!(file = file_name, sheet = %sheet, "reading worksheet");

    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| IngestError::new(file_name, format!("cannot read sheet '{}': {}", sheet, e)))?;

    Ok(range_to_table(&range))
}

fn range_to_table(range: &Range<Data>) -> SourceTable {
    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header) => header.iter().map(cell_to_text).collect(),
        None => return SourceTable::default(),
    };
    let data: Vec<Row> = rows
        .map(|row| row.iter().map(cell_to_text).collect())
        .collect();
    SourceTable::new(headers, data)
}

/// Render a cell as the text it shows, without numeric or date reinterpretation.
pub fn cell_to_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_float(*f),
        Data::Bool(b) => (if *b { "True" } else { "False" }).to_string(),
        Data::DateTime(dt) => match cell.as_datetime() {
            Some(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => format_float(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
    }
}

fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{}", f)
    }
}
