//! Delimited text reader
//!
//! Decodes the raw bytes with the configured encoding, then parses them with
//! the `csv` crate. Every field stays text.

use crate::config::CsvOptions;
use crate::error::IngestError;
use crate::types::{Row, SourceTable};
use std::borrow::Cow;

pub fn read_delimited(
    file_name: &str,
    bytes: &[u8],
    options: &CsvOptions,
) -> Result<SourceTable, IngestError> {
    let delimiter = options
        .delimiter_byte()
        .map_err(|e| IngestError::new(file_name, e.to_string()))?;
    let text = decode(file_name, bytes, options)?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut headers: Option<Vec<String>> = None;
    let mut rows: Vec<Row> = Vec::new();

    for result in reader.records() {
        let record = result.map_err(|e| IngestError::new(file_name, csv_error_message(&e)))?;
        if is_blank(&record) {
            continue;
        }

        let fields: Row = record.iter().map(|f| f.to_string()).collect();
        match &headers {
            None => headers = Some(fields),
            Some(header) => {
                if fields.len() > header.len() {
                    let line = record.position().map(|p| p.line()).unwrap_or(0);
                    return Err(IngestError::new(
                        file_name,
                        format!(
                            "Expected {} fields in line {}, saw {}",
                            header.len(),
                            line,
                            fields.len()
                        ),
                    ));
                }
                rows.push(fields);
            }
        }
    }

    let headers =
        headers.ok_or_else(|| IngestError::new(file_name, "No columns to parse from file"))?;
    Ok(SourceTable::new(headers, rows))
}

fn decode<'a>(
    file_name: &str,
    bytes: &'a [u8],
    options: &CsvOptions,
) -> Result<Cow<'a, str>, IngestError> {
    let (text, actual, had_errors) = options.encoding.encoding().decode(bytes);
    if had_errors {
        return Err(IngestError::new(
            file_name,
            format!(
                "cannot decode file as {} ({} decoder reported malformed input)",
                options.encoding.label(),
                actual.name()
            ),
        ));
    }
    Ok(text)
}

/// A line with no content. `a,,b` style rows of empty cells are data.
fn is_blank(record: &csv::StringRecord) -> bool {
    match record.len() {
        0 => true,
        1 => record[0].trim().is_empty(),
        _ => false,
    }
}

fn csv_error_message(err: &csv::Error) -> String {
    match err.position() {
        Some(pos) => format!("malformed delimited data at line {}: {}", pos.line(), err),
        None => format!("malformed delimited data: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TextEncoding;

    fn read(content: &[u8], options: &CsvOptions) -> Result<SourceTable, IngestError> {
        read_delimited("test.csv", content, options)
    }

    #[test]
    fn test_reads_header_and_rows_as_text() {
        let table = read(
            b"NUMERO OBRA ICONSTRUYE,DIAS TRABAJADOS\nOB-1,007\nOB-2,1.50\n",
            &CsvOptions::default(),
        )
        .unwrap();
        assert_eq!(table.headers, vec!["NUMERO OBRA ICONSTRUYE", "DIAS TRABAJADOS"]);
        assert_eq!(table.rows.len(), 2);
        // No numeric coercion: leading zeros and trailing zeros survive
        assert_eq!(table.rows[0][1], "007");
        assert_eq!(table.rows[1][1], "1.50");
    }

    #[test]
    fn test_skips_blank_lines() {
        let table = read(b"\n\nA,B\n\n1,2\n   \n3,4\n", &CsvOptions::default()).unwrap();
        assert_eq!(table.headers, vec!["A", "B"]);
        assert_eq!(table.rows, vec![vec!["1", "2"], vec!["3", "4"]]);
    }

    #[test]
    fn test_row_of_empty_cells_is_kept() {
        let table = read(b"A,B\n,\n1,2\n", &CsvOptions::default()).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["", ""]);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table = read(b"A,B,C\n1\n", &CsvOptions::default()).unwrap();
        assert_eq!(table.rows[0], vec!["1", "", ""]);
    }

    #[test]
    fn test_long_rows_fail() {
        let err = read(b"A,B\n1,2,3\n", &CsvOptions::default()).unwrap_err();
        assert_eq!(err.file, "test.csv");
        assert!(err.cause.contains("Expected 2 fields"), "{}", err.cause);
    }

    #[test]
    fn test_empty_file_fails() {
        let err = read(b"", &CsvOptions::default()).unwrap_err();
        assert!(err.cause.contains("No columns"));
        assert!(read(b"\n  \n", &CsvOptions::default()).is_err());
    }

    #[test]
    fn test_custom_delimiter_and_quotes() {
        let options = CsvOptions {
            delimiter: ";".to_string(),
            ..CsvOptions::default()
        };
        let table = read(b"A;B\n\"x;y\";\"2, 3\"\n", &options).unwrap();
        assert_eq!(table.rows[0], vec!["x;y", "2, 3"]);
    }

    #[test]
    fn test_latin1_decoding() {
        let options = CsvOptions {
            encoding: TextEncoding::Latin1,
            ..CsvOptions::default()
        };
        // "RAZÓN" in latin-1
        let table = read(b"RAZ\xd3N\nPe\xf1a\n", &options).unwrap();
        assert_eq!(table.headers, vec!["RAZÓN"]);
        assert_eq!(table.rows[0][0], "Peña");
    }

    #[test]
    fn test_invalid_utf8_fails() {
        let err = read(b"RAZ\xd3N\n1\n", &CsvOptions::default()).unwrap_err();
        assert!(err.cause.contains("utf-8"));
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        let table = read(b"\xef\xbb\xbfA,B\n1,2\n", &CsvOptions::default()).unwrap();
        assert_eq!(table.headers[0], "A");
    }

    #[test]
    fn test_utf16_with_bom() {
        let options = CsvOptions {
            encoding: TextEncoding::Utf16,
            ..CsvOptions::default()
        };
        let mut bytes = vec![0xff, 0xfe];
        for unit in "A,B\n1,2\n".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let table = read(&bytes, &options).unwrap();
        assert_eq!(table.headers, vec!["A", "B"]);
        assert_eq!(table.rows[0], vec!["1", "2"]);
    }

    #[test]
    fn test_utf16_odd_length_fails() {
        let options = CsvOptions {
            encoding: TextEncoding::Utf16,
            ..CsvOptions::default()
        };
        assert!(read(&[0xff, 0xfe, 0x41], &options).is_err());
    }
}
