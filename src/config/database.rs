//! Database configuration module for the coin ledger.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs without hand-written SQL.

use crate::entities::{CoinTransaction, Notification, SystemState, TopupRequest, User};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use std::path::Path;
use tracing::{debug, info, instrument};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/coin_ledger.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable, falling back to
/// a local `SQLite` file.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Directory holding the `SQLite` file of a `sqlite://` URL, if the URL names one.
fn sqlite_parent_dir(database_url: &str) -> Option<&Path> {
    let path = database_url.strip_prefix("sqlite://")?;
    let path = path.split('?').next().unwrap_or(path);
    Path::new(path)
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
}

/// Establishes a connection to the database named by [`get_database_url`].
///
/// The directory of a file-backed `SQLite` database is created when missing.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    if let Some(dir) = sqlite_parent_dir(&database_url) {
        std::fs::create_dir_all(dir)?;
    }
    debug!("Connecting to database at {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all ledger tables that do not exist yet.
///
/// Users are created first so the foreign keys of transactions and topup requests
/// have something to point at.
#[instrument(skip(db))]
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let tables = [
        schema.create_table_from_entity(User),
        schema.create_table_from_entity(CoinTransaction),
        schema.create_table_from_entity(TopupRequest),
        schema.create_table_from_entity(Notification),
        schema.create_table_from_entity(SystemState),
    ];

    for mut table in tables {
        table.if_not_exists();
        db.execute(builder.build(&table)).await?;
    }

    info!("Ledger tables ensured.");
    Ok(())
}
