//! Flood schema migration CLI (`up`, `down`, `status`, `fresh`, ...).
//!
//! Reads `DATABASE_URL` from the environment or a `.env` file. The migration
//! CLI installs its own tracing subscriber (`-v` for debug output).

use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    cli::run_cli(migration::Migrator).await;
}
