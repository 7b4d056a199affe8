//! Consolidator API Server module
//!
//! Provides an HTTP REST API for batch consolidation.
//! Run with `consolidate-server`.

pub mod handlers;
pub mod server;

pub use server::run_api_server;
