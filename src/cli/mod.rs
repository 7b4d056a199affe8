//! CLI command handlers

pub mod commands;

pub use commands::{run, schema, sheets, watch, ConfigOverrides, RunOptions};
