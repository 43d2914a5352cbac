//! Ledger configuration loading from config.toml
//!
//! Every section is optional. A missing file yields the defaults, a malformed file is an
//! error. Operators listed under `[[admins]]` are seeded into the users table at start-up.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// Environment variable naming an alternative config file
pub const CONFIG_PATH_ENV: &str = "COIN_LEDGER_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Transaction log and listing settings
    pub ledger: LedgerConfig,
    /// Topup request rules
    pub topups: TopupConfig,
    /// Operator accounts to seed
    pub admins: Vec<AdminConfig>,
}

/// `[ledger]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Prefix of generated transaction reference numbers
    pub reference_prefix: String,
    /// Page size used when a caller does not ask for one
    pub default_page_size: u64,
    /// Upper bound on any requested page size
    pub max_page_size: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            reference_prefix: "COIN".to_string(),
            default_page_size: 10,
            max_page_size: 50,
        }
    }
}

/// How many pending topup requests a single user may hold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingPolicy {
    /// At most one pending request per user; a new one is accepted after review
    #[default]
    Single,
    /// Any number of pending requests
    Unlimited,
}

/// `[topups]` section
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct TopupConfig {
    /// Pending request policy
    pub pending_policy: PendingPolicy,
    /// Largest amount a single request may claim
    pub max_amount: Option<i64>,
}

/// A single `[[admins]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    /// Discord user ID of the operator
    pub discord_id: String,
    /// Display name to register the operator under
    pub display_name: String,
}

/// Loads configuration from a TOML file.
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A field has the wrong type
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text and checks the values make sense.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    if config.ledger.reference_prefix.trim().is_empty() {
        return Err(Error::Config {
            message: "ledger.reference_prefix cannot be empty".to_string(),
        });
    }
    if config.ledger.default_page_size == 0 || config.ledger.max_page_size == 0 {
        return Err(Error::Config {
            message: "page sizes must be greater than zero".to_string(),
        });
    }
    if let Some(max) = config.topups.max_amount.filter(|max| *max <= 0) {
        return Err(Error::Config {
            message: format!("topups.max_amount must be positive, got {max}"),
        });
    }

    Ok(config)
}

/// Loads configuration from `$COIN_LEDGER_CONFIG`, or `./config.toml` when unset.
///
/// A missing file is not an error: the defaults are used and a warning is logged.
pub fn load_default_config() -> Result<AppConfig> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    if !Path::new(&path).exists() {
        warn!("Config file {path} not found, using defaults");
        return Ok(AppConfig::default());
    }

    debug!("Loading configuration from {path}");
    load_config(&path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [ledger]
            reference_prefix = "RIG"
            default_page_size = 5
            max_page_size = 20

            [topups]
            pending_policy = "unlimited"
            max_amount = 1000000

            [[admins]]
            discord_id = "1001"
            display_name = "Shop Owner"

            [[admins]]
            discord_id = "1002"
            display_name = "Night Shift"
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.ledger.reference_prefix, "RIG");
        assert_eq!(config.ledger.default_page_size, 5);
        assert_eq!(config.ledger.max_page_size, 20);
        assert_eq!(config.topups.pending_policy, PendingPolicy::Unlimited);
        assert_eq!(config.topups.max_amount, Some(1_000_000));
        assert_eq!(config.admins.len(), 2);
        assert_eq!(config.admins[1].display_name, "Night Shift");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.ledger.reference_prefix, "COIN");
        assert_eq!(config.ledger.default_page_size, 10);
        assert_eq!(config.topups.pending_policy, PendingPolicy::Single);
        assert!(config.topups.max_amount.is_none());
        assert!(config.admins.is_empty());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let result = parse_config("[ledger]\nreference_prefix = \"  \"\n");
        assert!(matches!(result, Err(Error::Config { .. })));

        let result = parse_config("[topups]\nmax_amount = 0\n");
        assert!(matches!(result, Err(Error::Config { .. })));

        let result = parse_config("[topups]\npending_policy = \"sometimes\"\n");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let result = load_config("definitely/not/here.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
