//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - The initial schema migration
//! - Repositories loading aggregates, running core rules and persisting
//!   the result in one transaction

pub mod entities;
pub mod migration;
pub mod params;
pub mod repositories;

mod convert;

pub use params::{accounting_params, invoice_params};
pub use repositories::{
    ArticleRepository, BillRepository, CostAccountingRepository, EntryRepository, FiscalRepository,
    PayoffRepository, StorageRepository, ThirdRepository,
};

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Establishes a pooled connection sized by the configuration.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with(config: &diacamma_shared::config::DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .sqlx_logging(false);
    Database::connect(options).await
}
