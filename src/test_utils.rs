//! Shared test utilities for the coin ledger.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test users with sensible defaults.

use crate::{
    config::LedgerConfig,
    core::{adjust, ledger::BalanceChange, user},
    entities,
    errors::Result,
};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tempfile::TempDir;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a file-backed `SQLite` database served by a pool of several connections.
///
/// Concurrent operations really run in parallel here, unlike on `sqlite::memory:` where
/// the pool holds a single connection. Keep the returned directory alive for the
/// duration of the test; dropping it deletes the database.
pub async fn setup_pooled_test_db() -> Result<(DatabaseConnection, TempDir)> {
    let dir = tempfile::tempdir()?;
    let url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("coin_ledger.sqlite").display()
    );

    let mut options = ConnectOptions::new(url);
    options
        .max_connections(4)
        .min_connections(2)
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    crate::config::database::create_tables(&db).await?;
    Ok((db, dir))
}

/// Ledger settings used by tests (the defaults: `COIN` prefix, 10 per page).
#[must_use]
pub fn test_ledger_config() -> LedgerConfig {
    LedgerConfig::default()
}

/// Registers a customer with a zero balance.
pub async fn create_test_user(
    db: &DatabaseConnection,
    discord_id: &str,
    display_name: &str,
) -> Result<entities::user::Model> {
    user::register_user(db, discord_id, display_name).await
}

/// Registers an operator.
pub async fn create_test_admin(
    db: &DatabaseConnection,
    discord_id: &str,
    display_name: &str,
) -> Result<entities::user::Model> {
    let admin = user::register_user(db, discord_id, display_name).await?;
    user::set_admin(db, admin.id, true).await
}

/// Gives a user coins through the ledger (as an `earn` transaction), so the balance and
/// the transaction log stay consistent.
pub async fn fund_user(db: &DatabaseConnection, user_id: i64, amount: i64) -> Result<BalanceChange> {
    adjust::award(
        db,
        &test_ledger_config(),
        user_id,
        amount,
        "Test funding",
        None,
    )
    .await
}

/// Sets up a complete test environment with one customer.
/// Returns (db, user) for common test scenarios.
pub async fn setup_with_user() -> Result<(DatabaseConnection, entities::user::Model)> {
    let db = setup_test_db().await?;
    let user = create_test_user(&db, "test_user", "Test User").await?;
    Ok((db, user))
}
