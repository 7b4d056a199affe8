//! Run configuration
//!
//! All process-wide options live in one explicit [`ConsolidateConfig`] that is
//! passed into ingestion and the batch driver. Every field has a default, so an
//! empty YAML document is a valid configuration.

use crate::error::{ConsolidateError, ConsolidateResult};
use crate::schema::{
    normalize_header, SchemaCatalog, SchemaPreset, DEFAULT_PROVENANCE_COLUMN,
    DEFAULT_REQUIRED_COLUMN,
};
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidateConfig {
    pub schema: SchemaConfig,
    pub csv: CsvOptions,
    pub workbook: WorkbookOptions,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    pub preset: SchemaPreset,
    /// Explicit canonical columns; overrides `preset` when present.
    pub columns: Option<Vec<String>>,
    pub required_column: String,
    pub provenance_column: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            preset: SchemaPreset::default(),
            columns: None,
            required_column: DEFAULT_REQUIRED_COLUMN.to_string(),
            provenance_column: DEFAULT_PROVENANCE_COLUMN.to_string(),
        }
    }
}

/// Character encodings accepted for delimited files.
///
/// Deserialized through [`FromStr`](std::str::FromStr), so config files accept
/// the same case-insensitive aliases as the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TextEncoding {
    #[default]
    Utf8,
    Latin1,
    Utf16,
}

impl TextEncoding {
    pub fn label(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "latin-1",
            TextEncoding::Utf16 => "utf-16",
        }
    }

    /// Decoder used for this encoding. Latin-1 maps to windows-1252, its
    /// superset as defined by the WHATWG encoding standard; UTF-16 defaults
    /// to little-endian unless a BOM says otherwise.
    pub fn encoding(&self) -> &'static Encoding {
        match self {
            TextEncoding::Utf8 => encoding_rs::UTF_8,
            TextEncoding::Latin1 => encoding_rs::WINDOWS_1252,
            TextEncoding::Utf16 => encoding_rs::UTF_16LE,
        }
    }
}

impl std::str::FromStr for TextEncoding {
    type Err = ConsolidateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" => Ok(TextEncoding::Latin1),
            "utf-16" | "utf16" => Ok(TextEncoding::Utf16),
            other => Err(ConsolidateError::Configuration(format!(
                "Unsupported encoding '{}' (expected utf-8, latin-1 or utf-16)",
                other
            ))),
        }
    }
}

impl TryFrom<String> for TextEncoding {
    type Error = ConsolidateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TextEncoding> for String {
    fn from(encoding: TextEncoding) -> Self {
        encoding.label().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    pub delimiter: String,
    pub encoding: TextEncoding,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: ",".to_string(),
            encoding: TextEncoding::Utf8,
        }
    }
}

impl CsvOptions {
    /// The delimiter as the single byte the CSV reader needs.
    pub fn delimiter_byte(&self) -> ConsolidateResult<u8> {
        let delimiter = match self.delimiter.as_str() {
            "\\t" | "tab" => "\t",
            other => other,
        };
        let mut chars = delimiter.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii() => Ok(c as u8),
            _ => Err(ConsolidateError::Configuration(format!(
                "CSV delimiter must be a single ASCII character, got {:?}",
                self.delimiter
            ))),
        }
    }
}

/// How the preferred sheet name is compared with a workbook's sheet names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetMatch {
    #[default]
    Exact,
    Normalized,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkbookOptions {
    pub preferred_sheet: String,
    pub allow_sheet_picker: bool,
    pub sheet_match: SheetMatch,
}

impl Default for WorkbookOptions {
    fn default() -> Self {
        Self {
            preferred_sheet: "BBDD".to_string(),
            allow_sheet_picker: false,
            sheet_match: SheetMatch::Exact,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub workbook: PathBuf,
    pub log: PathBuf,
    pub sheet_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            workbook: PathBuf::from("unificado.xlsx"),
            log: PathBuf::from("log_consolidacion.txt"),
            sheet_name: "Sheet1".to_string(),
        }
    }
}

impl ConsolidateConfig {
    pub fn from_yaml_str(yaml: &str) -> ConsolidateResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: &Path) -> ConsolidateResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Build the schema catalog and check every startup invariant.
    ///
    /// Any error here is fatal for the run and must surface before the
    /// first file is read.
    pub fn catalog(&self) -> ConsolidateResult<SchemaCatalog> {
        let catalog = match &self.schema.columns {
            Some(columns) => SchemaCatalog::new(columns.clone())?,
            None => SchemaCatalog::from_preset(self.schema.preset),
        };

        if catalog.position(&self.schema.required_column).is_none() {
            return Err(ConsolidateError::Configuration(format!(
                "Required column '{}' is not part of the canonical schema",
                self.schema.required_column
            )));
        }

        let provenance = normalize_header(&self.schema.provenance_column);
        if provenance.is_empty() {
            return Err(ConsolidateError::Configuration(
                "Provenance column name cannot be blank".to_string(),
            ));
        }
        if catalog.normalized_to_canonical().contains_key(&provenance) {
            return Err(ConsolidateError::Configuration(format!(
                "Provenance column '{}' collides with a canonical column",
                self.schema.provenance_column
            )));
        }

        self.csv.delimiter_byte()?;

        if self.output.sheet_name.trim().is_empty() {
            return Err(ConsolidateError::Configuration(
                "Output sheet name cannot be blank".to_string(),
            ));
        }

        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConsolidateConfig::default();
        assert_eq!(config.csv.delimiter, ",");
        assert_eq!(config.csv.encoding, TextEncoding::Utf8);
        assert_eq!(config.workbook.preferred_sheet, "BBDD");
        assert!(!config.workbook.allow_sheet_picker);
        assert_eq!(config.schema.required_column, "NUMERO OBRA ICONSTRUYE");
        assert_eq!(config.schema.provenance_column, "File name");
        assert_eq!(config.output.workbook, PathBuf::from("unificado.xlsx"));
        assert!(config.catalog().is_ok());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(
            ConsolidateConfig::from_yaml_str("").unwrap(),
            ConsolidateConfig::default()
        );
    }

    #[test]
    fn test_yaml_overrides() {
        let yaml = r#"
schema:
  preset: split
csv:
  delimiter: ";"
  encoding: latin1
workbook:
  preferred_sheet: Datos
  allow_sheet_picker: true
  sheet_match: normalized
"#;
        let config = ConsolidateConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.schema.preset, SchemaPreset::Split);
        assert_eq!(config.csv.delimiter_byte().unwrap(), b';');
        assert_eq!(config.csv.encoding, TextEncoding::Latin1);
        assert_eq!(config.workbook.preferred_sheet, "Datos");
        assert_eq!(config.workbook.sheet_match, SheetMatch::Normalized);
        assert_eq!(config.catalog().unwrap().len(), 12);
        // Untouched sections keep their defaults
        assert_eq!(config.output.sheet_name, "Sheet1");
    }

    #[test]
    fn test_explicit_columns_override_preset() {
        let yaml = r#"
schema:
  columns: ["NUMERO OBRA ICONSTRUYE", "EXTRA"]
"#;
        let config = ConsolidateConfig::from_yaml_str(yaml).unwrap();
        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.columns(), &["NUMERO OBRA ICONSTRUYE", "EXTRA"]);
    }

    #[test]
    fn test_required_column_must_exist() {
        let mut config = ConsolidateConfig::default();
        config.schema.required_column = "NOPE".to_string();
        assert!(matches!(
            config.catalog(),
            Err(ConsolidateError::Configuration(_))
        ));
    }

    #[test]
    fn test_provenance_collision() {
        let mut config = ConsolidateConfig::default();
        config.schema.provenance_column = " MES  (MMM-AA)".to_string();
        assert!(config.catalog().is_err());
    }

    #[test]
    fn test_ambiguous_explicit_schema_is_fatal() {
        let mut config = ConsolidateConfig::default();
        config.schema.columns = Some(vec![
            "NUMERO OBRA ICONSTRUYE".to_string(),
            "NUMERO  OBRA ICONSTRUYE ".to_string(),
        ]);
        assert!(config.catalog().is_err());
    }

    #[test]
    fn test_delimiter_parsing() {
        let mut csv = CsvOptions::default();
        assert_eq!(csv.delimiter_byte().unwrap(), b',');
        csv.delimiter = "\\t".to_string();
        assert_eq!(csv.delimiter_byte().unwrap(), b'\t');
        csv.delimiter = "\t".to_string();
        assert_eq!(csv.delimiter_byte().unwrap(), b'\t');
        csv.delimiter = ";;".to_string();
        assert!(csv.delimiter_byte().is_err());
        csv.delimiter = String::new();
        assert!(csv.delimiter_byte().is_err());
        csv.delimiter = "§".to_string();
        assert!(csv.delimiter_byte().is_err());
    }

    #[test]
    fn test_yaml_encoding_aliases_ignore_case() {
        let cases = [
            ("ISO-8859-1", TextEncoding::Latin1),
            ("Latin1", TextEncoding::Latin1),
            ("UTF8", TextEncoding::Utf8),
            ("Utf_16", TextEncoding::Utf16),
        ];
        for (name, expected) in cases {
            let yaml = format!("csv:\n  encoding: {}\n", name);
            let config = ConsolidateConfig::from_yaml_str(&yaml).unwrap();
            assert_eq!(config.csv.encoding, expected, "alias {}", name);
        }
        assert!(ConsolidateConfig::from_yaml_str("csv:\n  encoding: ebcdic\n").is_err());
    }

    #[test]
    fn test_encoding_serializes_as_label() {
        let yaml = serde_yaml::to_string(&CsvOptions {
            encoding: TextEncoding::Latin1,
            ..CsvOptions::default()
        })
        .unwrap();
        assert!(yaml.contains("encoding: latin-1"), "{}", yaml);
    }

    #[test]
    fn test_encoding_from_str() {
        assert_eq!("UTF-8".parse::<TextEncoding>().unwrap(), TextEncoding::Utf8);
        assert_eq!("latin-1".parse::<TextEncoding>().unwrap(), TextEncoding::Latin1);
        assert_eq!("ISO-8859-1".parse::<TextEncoding>().unwrap(), TextEncoding::Latin1);
        assert_eq!("utf_16".parse::<TextEncoding>().unwrap(), TextEncoding::Utf16);
        assert!("cp437".parse::<TextEncoding>().is_err());
    }
}
