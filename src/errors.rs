//! Unified error type for the coin ledger.
//!
//! Every core operation returns [`Result`]. The variants mirror the failure kinds a
//! caller has to distinguish (bad input, missing identity, missing rights, missing
//! records, wrong lifecycle state, not enough coins, storage trouble) plus the ambient
//! failures of configuration and the bot framework.

use thiserror::Error;

/// Errors produced by the coin ledger.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing input
    #[error("Validation error: {message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// A coin amount that is zero or negative where a positive amount is required
    #[error("Invalid amount: {amount} (must be greater than zero)")]
    InvalidAmount {
        /// The rejected amount
        amount: i64,
    },

    /// The operation needs a registered caller and none was supplied
    #[error("Unauthenticated: register an account first")]
    Unauthenticated,

    /// The caller is known but lacks the rights for the operation
    #[error("Unauthorized: administrator rights required to {action}")]
    Unauthorized {
        /// The action that was refused
        action: String,
    },

    /// No user with the given id
    #[error("User not found: {id}")]
    UserNotFound {
        /// The missing user id
        id: i64,
    },

    /// No topup request with the given id
    #[error("Topup request not found: {id}")]
    TopupRequestNotFound {
        /// The missing request id
        id: i64,
    },

    /// No notification with the given id
    #[error("Notification not found: {id}")]
    NotificationNotFound {
        /// The missing notification id
        id: i64,
    },

    /// The record is not in a state that allows the operation
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Description of the conflicting state
        message: String,
    },

    /// A debit larger than the current balance
    #[error("Insufficient balance: current balance is {current}, required {required}")]
    InsufficientBalance {
        /// Balance at the time of the attempt
        current: i64,
        /// Amount the operation needed
        required: i64,
    },

    /// The persistent store is unreachable or rejected the write
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Required environment variable missing or invalid
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Formatting failure while building a reply
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// Notification payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Serenity/Poise framework error
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

impl Error {
    /// HTTP-style status code for this error, for callers that surface ledger
    /// operations over a request/response transport.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            // Refusals for the current state are reported like bad input
            Self::Validation { .. }
            | Self::InvalidAmount { .. }
            | Self::InvalidState { .. }
            | Self::InsufficientBalance { .. } => 400,
            Self::Unauthenticated => 401,
            Self::Unauthorized { .. } => 403,
            Self::UserNotFound { .. }
            | Self::TopupRequestNotFound { .. }
            | Self::NotificationNotFound { .. } => 404,
            Self::Database(_)
            | Self::Config { .. }
            | Self::Io(_)
            | Self::EnvVar(_)
            | Self::Fmt(_)
            | Self::Serialization(_)
            | Self::Framework(_) => 500,
        }
    }

    /// Whether retrying the whole operation may succeed.
    ///
    /// Only storage failures qualify; every other kind is deterministic for the same
    /// input and state.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Database(_))
    }

    /// Shorthand for building a [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for building a [`Error::InvalidState`].
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
