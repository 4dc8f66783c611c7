//! Migration CLI tool.

use inkwell_infra::{TelemetryConfig, init_telemetry};
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    if let Err(e) = init_telemetry(&TelemetryConfig::from_env()) {
        eprintln!("Failed to initialize telemetry: {e}");
    }

    cli::run_cli(migration::Migrator).await;
}
