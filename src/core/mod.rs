//! Core business logic - framework-agnostic coin ledger operations.
//!
//! Every operation that changes a balance runs inside one database transaction together
//! with the transaction-log write and any notification it emits.

/// Caller identity and role checks
pub mod auth;
/// Operator adjustments and system rewards
pub mod adjust;
/// The balance store: conditional credit and debit of `users.balance`
pub mod balance;
/// The transaction log: recording, history, summaries and audits
pub mod ledger;
/// Operator notifications
pub mod notification;
/// Page requests and paginated responses
pub mod pagination;
/// Spending coins on orders and redemptions
pub mod spend;
/// Topup request submission and review
pub mod topup;
/// User registration and lookup
pub mod user;
