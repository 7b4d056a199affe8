//! API integration tests
//!
//! Exercise the request handlers against real files in a temp directory.

use planilla_consolidator::api::handlers::{
    consolidate_files, schema_for, ApiResponse, ConsolidateRequest,
};
use planilla_consolidator::api::server::{ApiConfig, AppState};
use planilla_consolidator::config::ConsolidateConfig;
use std::fs;
use tempfile::TempDir;

// ═══════════════════════════════════════════════════════════════════════════
// CONFIG / STATE
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_config_default() {
    let config = ApiConfig::default();
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 8080);
}

#[test]
fn test_app_state_clone() {
    let state = AppState {
        version: "1.0.0".to_string(),
    };
    let cloned = state.clone();
    assert_eq!(state.version, cloned.version);
}

// ═══════════════════════════════════════════════════════════════════════════
// SCHEMA
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_schema_response_serializes() {
    let response = ApiResponse::ok(schema_for(Some("combined")).unwrap());
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["required_column"], "NUMERO OBRA ICONSTRUYE");
    assert_eq!(json["data"]["columns"][4], "DIAS TRABAJADOS ");
}

// ═══════════════════════════════════════════════════════════════════════════
// CONSOLIDATE
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_consolidate_with_missing_file() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("good.csv");
    fs::write(&good, "NUMERO OBRA ICONSTRUYE,MES (MMM-AA)\nOB-1,ENE-24\n").unwrap();
    let output = dir.path().join("out.xlsx");
    let log = dir.path().join("log.txt");

    let response = consolidate_files(ConsolidateRequest {
        files: vec![
            good.display().to_string(),
            dir.path().join("ghost.csv").display().to_string(),
        ],
        output_path: output.display().to_string(),
        log_path: Some(log.display().to_string()),
        config: None,
    })
    .unwrap();

    assert_eq!(response.rows, 1);
    assert_eq!(response.files_total, 2);
    assert_eq!(response.files_failed, 1);
    assert_eq!(response.log_path, Some(log.display().to_string()));
    assert!(output.exists());
    assert!(response
        .diagnostics
        .iter()
        .any(|l| l.starts_with("ghost.csv: ERROR while processing -> ")));

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["files"][0]["status"], "consolidated");
    assert_eq!(json["files"][1]["status"], "failed");
}

#[test]
fn test_consolidate_with_custom_config() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("pipe.csv");
    fs::write(&input, "NUMERO OBRA ICONSTRUYE|MES (MMM-AA)\nOB-1|ENE-24\n").unwrap();
    let output = dir.path().join("out.xlsx");

    let mut config = ConsolidateConfig::default();
    config.csv.delimiter = "|".to_string();
    config.schema.columns = Some(vec![
        "NUMERO OBRA ICONSTRUYE".to_string(),
        "MES (MMM-AA)".to_string(),
    ]);

    let response = consolidate_files(ConsolidateRequest {
        files: vec![input.display().to_string()],
        output_path: output.display().to_string(),
        log_path: Some(dir.path().join("log.txt").display().to_string()),
        config: Some(config),
    })
    .unwrap();

    assert_eq!(response.rows, 1);
    assert!(response.diagnostics.is_empty());
    assert_eq!(response.log_path, None);
}

#[test]
fn test_consolidate_bad_config_is_error() {
    let mut config = ConsolidateConfig::default();
    config.schema.required_column = "NOPE".to_string();
    let result = consolidate_files(ConsolidateRequest {
        files: vec!["a.csv".to_string()],
        output_path: "out.xlsx".to_string(),
        log_path: None,
        config: Some(config),
    });
    assert!(result.is_err());
}
