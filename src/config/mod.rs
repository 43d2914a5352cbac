/// Database configuration and connection management
pub mod database;

/// Ledger configuration loading from config.toml
pub mod ledger;

pub use ledger::{AdminConfig, AppConfig, LedgerConfig, PendingPolicy, TopupConfig};
