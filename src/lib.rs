//! Planilla Consolidator - merge heterogeneous payroll spreadsheets into one table
//!
//! Each input file (Excel workbook or CSV) is one work-report submission with
//! its own header spelling. The library reconciles every file's headers against
//! a canonical column schema, drops rows without the required key field, and
//! concatenates the results in input order, recording per-file diagnostics
//! instead of aborting on bad files.
//!
//! # Pipeline
//!
//! - [`ingest`]: read one file as text cells (CSV or workbook sheet)
//! - [`reconcile`]: map headers onto the schema, backfill, validate rows
//! - [`pipeline`]: batch driver with partial-failure semantics
//! - [`export`]: consolidated .xlsx and diagnostics log
//!
//! # Example
//!
//! ```no_run
//! use planilla_consolidator::config::ConsolidateConfig;
//! use planilla_consolidator::pipeline::Consolidator;
//! use planilla_consolidator::types::InputFile;
//!
//! let consolidator = Consolidator::new(ConsolidateConfig::default())?;
//! let report = consolidator.run(vec![InputFile::new(
//!     "obra.csv",
//!     b"NUMERO OBRA ICONSTRUYE,MES (MMM-AA)\nOB-1,ENE-24\n".to_vec(),
//! )]);
//!
//! println!("Rows: {}", report.rows());
//! for line in report.diagnostics.lines() {
//!     println!("{}", line);
//! }
//! # Ok::<(), planilla_consolidator::error::ConsolidateError>(())
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod excel;
pub mod export;
pub mod ingest;
pub mod pipeline;
pub mod reconcile;
pub mod schema;
pub mod types;

// Re-export commonly used types
pub use config::ConsolidateConfig;
pub use error::{ConsolidateError, ConsolidateResult, IngestError};
pub use pipeline::{BatchReport, Consolidator};
pub use schema::{normalize_header, SchemaCatalog, SchemaPreset};
pub use types::{ConsolidatedTable, InputFile, ReconciledTable, SourceTable};
