//! Consolidator API Server binary
//!
//! HTTP REST API for consolidating Excel / CSV work reports.

use clap::Parser;
use planilla_consolidator::api::{run_api_server, server::ApiConfig};

#[derive(Parser, Debug)]
#[command(name = "consolidate-server")]
#[command(version)]
#[command(about = "Consolidator API Server - HTTP REST API for spreadsheet consolidation")]
#[command(long_about = r#"
Consolidator API Server - HTTP REST API

Endpoints:
  - GET  /api/v1/schema       - Canonical columns (?preset=combined|split)
  - POST /api/v1/consolidate  - Consolidate files into one Excel workbook

Additional endpoints:
  - GET  /health              - Health check
  - GET  /version             - Server version info
  - GET  /                    - API documentation

Example usage:
  consolidate-server                           # Start on localhost:8080
  consolidate-server --host 0.0.0.0 --port 3000

  curl -X POST http://localhost:8080/api/v1/consolidate \
    -H "Content-Type: application/json" \
    -d '{"files": ["planillas/a.xlsx", "planillas/b.csv"], "output_path": "unificado.xlsx"}'
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "CONSOLIDATE_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "CONSOLIDATE_PORT")]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ApiConfig {
        host: args.host,
        port: args.port,
    };

    run_api_server(config).await
}
