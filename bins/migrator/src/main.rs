//! Database migration runner for Diacamma.
//!
//! Usage:
//!   migrator up      - Create the schema and seed the reserved journals
//!   migrator down    - Drop every table
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-run migrations
//!
//! The connection string is read from `DATABASE_URL`.

use diacamma_db::migration::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // The CLI sets up its own tracing
    cli::run_cli(Migrator).await;
}
