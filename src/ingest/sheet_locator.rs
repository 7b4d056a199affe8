//! Choose which worksheet of a workbook to read

use crate::config::{SheetMatch, WorkbookOptions};
use crate::error::IngestError;
use crate::schema::normalize_header;

/// Hook for an interactive sheet choice.
///
/// Returns `None` when no choice can be made (no terminal, user aborted).
pub trait SheetPicker {
    fn pick(&self, file_name: &str, sheet_names: &[String]) -> Option<String>;
}

impl<F> SheetPicker for F
where
    F: Fn(&str, &[String]) -> Option<String>,
{
    fn pick(&self, file_name: &str, sheet_names: &[String]) -> Option<String> {
        self(file_name, sheet_names)
    }
}

/// Select the sheet to read.
///
/// Preferred sheet if present, else the picker's choice when enabled, else the
/// first sheet.
pub fn select_sheet(
    file_name: &str,
    sheet_names: &[String],
    options: &WorkbookOptions,
    picker: Option<&dyn SheetPicker>,
) -> Result<String, IngestError> {
    let first = sheet_names
        .first()
        .ok_or_else(|| IngestError::new(file_name, "workbook contains no sheets"))?;

    if let Some(found) = find_preferred_sheet(sheet_names, options) {
        return Ok(found.clone());
    }

    if !options.allow_sheet_picker {
        return Ok(first.clone());
    }

    let picker = picker.ok_or_else(|| {
        IngestError::new(
            file_name,
            format!(
                "sheet '{}' not found and no sheet picker is available",
                options.preferred_sheet
            ),
        )
    })?;

    match picker.pick(file_name, sheet_names) {
        Some(choice) if sheet_names.contains(&choice) => Ok(choice),
        Some(choice) => Err(IngestError::new(
            file_name,
            format!("picked sheet '{}' does not exist in workbook", choice),
        )),
        None => Err(IngestError::new(
            file_name,
            format!(
                "sheet '{}' not found and no sheet was picked",
                options.preferred_sheet
            ),
        )),
    }
}

/// The workbook's sheet matching the preferred name under `options.sheet_match`.
pub fn find_preferred_sheet<'a>(
    sheet_names: &'a [String],
    options: &WorkbookOptions,
) -> Option<&'a String> {
    let preferred = options.preferred_sheet.as_str();
    match options.sheet_match {
        SheetMatch::Exact => sheet_names.iter().find(|s| *s == preferred),
        SheetMatch::Normalized => {
            let wanted = normalize_header(preferred);
            sheet_names.iter().find(|s| normalize_header(s) == wanted)
        }
    }
}
