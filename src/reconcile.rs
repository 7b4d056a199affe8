//! Header reconciliation and row validation
//!
//! [`reconcile`] maps a file's columns onto `[provenance] + canonical schema`;
//! [`validate`] trims every cell and drops rows without the required field.

use crate::schema::{normalize_header, SchemaCatalog};
use crate::types::{ReconciledTable, Row, SourceTable};
use std::collections::HashMap;

/// Result of mapping one file onto the canonical schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub table: ReconciledTable,
    /// Canonical columns absent from the file, in schema order.
    pub missing_columns: Vec<String>,
}

/// Map `table` onto the canonical schema.
///
/// Headers are compared on their normalized form. When two input headers
/// normalize to the same value the last one wins. Extraneous input columns are
/// dropped; absent canonical columns are filled with empty text. The output
/// always has `catalog.len() + 1` columns and one row per input row.
pub fn reconcile(
    table: SourceTable,
    catalog: &SchemaCatalog,
    source_name: &str,
    provenance_column: &str,
) -> Reconciliation {
    let mut by_normalized: HashMap<String, usize> = HashMap::with_capacity(table.headers.len());
    for (idx, header) in table.headers.iter().enumerate() {
        by_normalized.insert(normalize_header(header), idx);
    }

    let mut missing_columns = Vec::new();
    let sources: Vec<Option<usize>> = catalog
        .normalized_columns()
        .iter()
        .zip(catalog.columns())
        .map(|(norm, canonical)| {
            let found = by_normalized.get(norm).copied();
            if found.is_none() {
                missing_columns.push(canonical.clone());
            }
            found
        })
        .collect();

    let mut columns = Vec::with_capacity(catalog.len() + 1);
    columns.push(provenance_column.to_string());
    columns.extend(catalog.columns().iter().cloned());

    // Canonical names are unique after normalization, so each source column
    // feeds at most one output column and can be moved out.
    let rows: Vec<Row> = table
        .rows
        .into_iter()
        .map(|mut source_row| {
            let mut row = Vec::with_capacity(columns.len());
            row.push(source_name.to_string());
            for source in &sources {
                let value = source
                    .and_then(|idx| source_row.get_mut(idx))
                    .map(std::mem::take)
                    .unwrap_or_default();
                row.push(value);
            }
            row
        })
        .collect();

    Reconciliation {
        table: ReconciledTable {
            source: source_name.to_string(),
            columns,
            rows,
        },
        missing_columns,
    }
}

/// Trim every cell and keep only rows whose `required_column` is non-empty.
///
/// Returns the filtered table (original row order) and the number of rows
/// removed. Missing cells are read as empty text, so empty is the only null
/// marker. If `required_column` is not a column of the table no row can pass.
pub fn validate(mut table: ReconciledTable, required_column: &str) -> (ReconciledTable, usize) {
    for row in &mut table.rows {
        for cell in row.iter_mut() {
            let trimmed = cell.trim();
            if trimmed.len() != cell.len() {
                *cell = trimmed.to_string();
            }
        }
    }

    let wanted = normalize_header(required_column);
    let required = table
        .columns
        .iter()
        .position(|c| c == required_column)
        .or_else(|| table.columns.iter().position(|c| normalize_header(c) == wanted));

    let before = table.rows.len();
    match required {
        Some(idx) => table.rows.retain(|row| !row[idx].is_empty()),
        None => table.rows.clear(),
    }
    let discarded = before - table.rows.len();
    (table, discarded)
}

/// Cut every cell longer than `max_chars` characters; returns how many were cut.
pub fn truncate_long_cells(table: &mut ReconciledTable, max_chars: usize) -> usize {
    let mut truncated = 0;
    for cell in table.rows.iter_mut().flatten() {
        if let Some((cut, _)) = cell.char_indices().nth(max_chars) {
            cell.truncate(cut);
            truncated += 1;
        }
    }
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaPreset;
    use pretty_assertions::assert_eq;

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn small_catalog() -> SchemaCatalog {
        SchemaCatalog::new(strings(&["NUMERO OBRA ICONSTRUYE", "MES (MMM-AA)", "DIAS TRABAJADOS "]))
            .unwrap()
    }

    #[test]
    fn test_scenario_two_known_columns() {
        let catalog = SchemaCatalog::from_preset(SchemaPreset::Combined);
        let source = SourceTable::new(
            strings(&["NUMERO OBRA ICONSTRUYE", "MES (MMM-AA)"]),
            vec![strings(&["OB-1", "ENE-24"])],
        );

        let result = reconcile(source, &catalog, "f1.csv", "File name");
        let table = result.table;

        assert_eq!(table.columns.len(), catalog.len() + 1);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0], "f1.csv");
        assert_eq!(table.rows[0][1], "OB-1");
        assert_eq!(table.rows[0][2], "ENE-24");
        assert!(table.rows[0][3..].iter().all(|c| c.is_empty()));
        assert_eq!(result.missing_columns, catalog.columns()[2..].to_vec());
    }

    #[test]
    fn test_whitespace_drift_is_reconciled() {
        let source = SourceTable::new(
            strings(&["  NUMERO  OBRA ICONSTRUYE", "DIAS TRABAJADOS", "MES (MMM-AA) "]),
            vec![strings(&["OB-7", "22", "FEB-24"])],
        );
        let result = reconcile(source, &small_catalog(), "a.xlsx", "File name");
        assert!(result.missing_columns.is_empty());
        assert_eq!(
            result.table.columns,
            strings(&["File name", "NUMERO OBRA ICONSTRUYE", "MES (MMM-AA)", "DIAS TRABAJADOS "])
        );
        assert_eq!(result.table.rows[0], strings(&["a.xlsx", "OB-7", "FEB-24", "22"]));
    }

    #[test]
    fn test_extraneous_columns_dropped() {
        let source = SourceTable::new(
            strings(&["EXTRA 1", "NUMERO OBRA ICONSTRUYE", "EXTRA 2"]),
            vec![strings(&["x", "OB-1", "y"])],
        );
        let result = reconcile(source, &small_catalog(), "a.csv", "File name");
        assert_eq!(result.table.columns.len(), 4);
        assert_eq!(result.table.rows[0], strings(&["a.csv", "OB-1", "", ""]));
        assert_eq!(result.missing_columns, strings(&["MES (MMM-AA)", "DIAS TRABAJADOS "]));
    }

    #[test]
    fn test_duplicate_normalized_headers_last_wins() {
        let source = SourceTable::new(
            strings(&["NUMERO OBRA ICONSTRUYE", "NUMERO  OBRA ICONSTRUYE "]),
            vec![strings(&["first", "second"])],
        );
        let result = reconcile(source, &small_catalog(), "dup.csv", "File name");
        assert_eq!(result.table.rows[0][1], "second");
    }

    #[test]
    fn test_canonical_input_is_only_reordered() {
        let catalog = small_catalog();
        let in_order = SourceTable::new(
            catalog.columns().to_vec(),
            vec![strings(&["OB-1", "ENE-24", "30"])],
        );
        let shuffled = SourceTable::new(
            strings(&["DIAS TRABAJADOS ", "NUMERO OBRA ICONSTRUYE", "MES (MMM-AA)"]),
            vec![strings(&["30", "OB-1", "ENE-24"])],
        );
        let a = reconcile(in_order, &catalog, "f.csv", "File name");
        let b = reconcile(shuffled, &catalog, "f.csv", "File name");
        assert_eq!(a, b);
        assert_eq!(a.table.rows[0], strings(&["f.csv", "OB-1", "ENE-24", "30"]));
    }

    #[test]
    fn test_empty_source_has_no_rows() {
        let result = reconcile(SourceTable::default(), &small_catalog(), "e.xlsx", "File name");
        assert_eq!(result.table.rows.len(), 0);
        assert_eq!(result.table.columns.len(), 4);
        assert_eq!(result.missing_columns.len(), 3);
    }

    #[test]
    fn test_validate_trims_and_discards() {
        let source = SourceTable::new(
            strings(&["NUMERO OBRA ICONSTRUYE", "MES (MMM-AA)"]),
            vec![
                strings(&[" OB-1 ", " ENE-24"]),
                strings(&["   ", "FEB-24"]),
                strings(&["", ""]),
                strings(&["OB-2", "MAR-24 "]),
            ],
        );
        let reconciled = reconcile(source, &small_catalog(), "v.csv", "File name").table;
        let (table, discarded) = validate(reconciled, "NUMERO OBRA ICONSTRUYE");

        assert_eq!(discarded, 2);
        assert_eq!(table.column("NUMERO OBRA ICONSTRUYE").unwrap(), vec!["OB-1", "OB-2"]);
        assert_eq!(table.column("MES (MMM-AA)").unwrap(), vec!["ENE-24", "MAR-24"]);
    }

    #[test]
    fn test_validate_all_rows_discarded_is_valid() {
        let source = SourceTable::new(strings(&["MES (MMM-AA)"]), vec![strings(&["ENE-24"])]);
        let reconciled = reconcile(source, &small_catalog(), "v.csv", "File name").table;
        let (table, discarded) = validate(reconciled, "NUMERO OBRA ICONSTRUYE");
        assert_eq!(discarded, 1);
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.columns.len(), 4);
    }

    #[test]
    fn test_truncate_long_cells() {
        let source = SourceTable::new(
            strings(&["NUMERO OBRA ICONSTRUYE", "MES (MMM-AA)"]),
            vec![strings(&["O1", "ñañaña"]), strings(&["O2", "abc"])],
        );
        let mut table = reconcile(source, &small_catalog(), "t", "File name").table;
        assert_eq!(truncate_long_cells(&mut table, 3), 1);
        assert_eq!(table.column("MES (MMM-AA)").unwrap(), vec!["ñañ", "abc"]);
        assert_eq!(table.column("NUMERO OBRA ICONSTRUYE").unwrap(), vec!["O1", "O2"]);
    }

    #[test]
    fn test_validate_matches_required_on_normalized_name() {
        let source = SourceTable::new(strings(&["DIAS TRABAJADOS"]), vec![strings(&["3"])]);
        let reconciled = reconcile(source, &small_catalog(), "v.csv", "File name").table;
        let (table, discarded) = validate(reconciled, "DIAS TRABAJADOS");
        assert_eq!(discarded, 0);
        assert_eq!(table.row_count(), 1);
    }
}
