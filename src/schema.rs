//! Canonical column schema and header normalization
//!
//! Every input file is mapped onto one ordered list of destination columns.
//! Header equality is decided on the normalized form only: surrounding
//! whitespace is dropped and internal whitespace runs collapse to one space.

use crate::error::{ConsolidateError, ConsolidateResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Column that must be non-empty for a row to be kept.
pub const DEFAULT_REQUIRED_COLUMN: &str = "NUMERO OBRA ICONSTRUYE";

/// Injected column holding the name of the file a row came from.
pub const DEFAULT_PROVENANCE_COLUMN: &str = "File name";

/// Reduce a raw header to its comparable form.
///
/// ```
/// use planilla_consolidator::schema::normalize_header;
///
/// assert_eq!(normalize_header("  DIAS   TRABAJADOS "), "DIAS TRABAJADOS");
/// ```
pub fn normalize_header(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Built-in canonical schemas.
///
/// The two variants come from different submission templates and are not
/// interchangeable: `Split` spreads the worker name over three columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaPreset {
    #[default]
    Combined,
    Split,
}

impl SchemaPreset {
    /// Canonical columns in output order. Trailing spaces are part of the names.
    pub fn columns(&self) -> Vec<String> {
        let names: &[&str] = match self {
            SchemaPreset::Combined => &[
                "NUMERO OBRA ICONSTRUYE",
                "MES (MMM-AA)",
                "APELLIDO PATERNO, APELLIDO MATERNO Y NOMBRES DEL TRABAJADOR",
                "RUT TRABAJADOR (SIN PUNTOS Y CON GUION)",
                "DIAS TRABAJADOS ",
                "NUMERO DE CONTRATO",
                "RAZON SOCIAL EMPRESA SUBCONTRATISTA ",
                "RUT EMPRESA SUBCONTRATISTA (SIN PUNTOS Y CON GUION)",
                "RAZON SOCIAL EMPRESA CONTRATISTA ",
                "RUT EMPRESA CONTRATISTA (SIN PUNTOS Y CON GUION)",
            ],
            SchemaPreset::Split => &[
                "NUMERO OBRA ICONSTRUYE",
                "MES (MMM-AA)",
                "APELLIDO PATERNO TRABAJADOR",
                "APELLIDO MATERNO TRABAJADOR",
                "NOMBRES TRABAJADOR",
                "RUT TRABAJADOR (SIN PUNTOS Y CON GUION)",
                "DIAS TRABAJADOS ",
                "NUMERO DE CONTRATO",
                "NOMBRE EMPRESA SUBCONTRATISTA",
                "RUT EMPRESA SUBCONTRATISTA (SIN PUNTOS Y CON GUION)",
                "NOMBRE EMPRESA CONTRATISTA",
                "RUT EMPRESA CONTRATISTA (SIN PUNTOS Y CON GUION)",
            ],
        };
        names.iter().map(|s| s.to_string()).collect()
    }

    pub fn name(&self) -> &'static str {
        match self {
            SchemaPreset::Combined => "combined",
            SchemaPreset::Split => "split",
        }
    }
}

impl std::str::FromStr for SchemaPreset {
    type Err = ConsolidateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "combined" => Ok(SchemaPreset::Combined),
            "split" => Ok(SchemaPreset::Split),
            other => Err(ConsolidateError::Configuration(format!(
                "Unknown schema preset '{}' (expected 'combined' or 'split')",
                other
            ))),
        }
    }
}

/// The canonical ordered schema, immutable for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaCatalog {
    columns: Vec<String>,
    normalized: Vec<String>,
    lookup: HashMap<String, String>,
}

impl SchemaCatalog {
    /// Build a catalog, failing fast when two names normalize identically.
    pub fn new(columns: Vec<String>) -> ConsolidateResult<Self> {
        if columns.is_empty() {
            return Err(ConsolidateError::Configuration(
                "Canonical schema has no columns".to_string(),
            ));
        }

        let mut normalized = Vec::with_capacity(columns.len());
        let mut lookup = HashMap::with_capacity(columns.len());

        for name in &columns {
            let norm = normalize_header(name);
            if norm.is_empty() {
                return Err(ConsolidateError::Configuration(
                    "Canonical schema contains a blank column name".to_string(),
                ));
            }
            if let Some(existing) = lookup.insert(norm.clone(), name.clone()) {
                return Err(ConsolidateError::Configuration(format!(
                    "Ambiguous schema: '{}' and '{}' both normalize to '{}'",
                    existing, name, norm
                )));
            }
            normalized.push(norm);
        }

        Ok(Self {
            columns,
            normalized,
            lookup,
        })
    }

    pub fn from_preset(preset: SchemaPreset) -> Self {
        // Presets are unique by construction.
        let columns = preset.columns();
        let normalized: Vec<String> = columns.iter().map(|c| normalize_header(c)).collect();
        let lookup = normalized
            .iter()
            .cloned()
            .zip(columns.iter().cloned())
            .collect();
        Self {
            columns,
            normalized,
            lookup,
        }
    }

    /// Canonical names, in output order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Normalized form of each canonical name, parallel to [`columns`](Self::columns).
    pub fn normalized_columns(&self) -> &[String] {
        &self.normalized
    }

    pub fn normalized_to_canonical(&self) -> &HashMap<String, String> {
        &self.lookup
    }

    /// Resolve any header spelling to its canonical name.
    pub fn canonical_for(&self, header: &str) -> Option<&str> {
        self.lookup
            .get(&normalize_header(header))
            .map(|s| s.as_str())
    }

    /// Index of a canonical column, matched on normalized form.
    pub fn position(&self, name: &str) -> Option<usize> {
        let norm = normalize_header(name);
        self.normalized.iter().position(|n| *n == norm)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Default for SchemaCatalog {
    fn default() -> Self {
        Self::from_preset(SchemaPreset::Combined)
    }
}
