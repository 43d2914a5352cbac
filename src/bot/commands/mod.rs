//! Discord command implementations organized by audience.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Operator commands
pub mod admin;

/// General utility commands
pub mod general;

/// Topup submission commands
pub mod topup;

/// Balance, history and redemption commands
pub mod wallet;

// Export commands
pub use admin::*;
pub use general::*;
pub use topup::*;
pub use wallet::*;
