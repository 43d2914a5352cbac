//! User entity - The slice of a storefront account the coin ledger needs.
//!
//! Accounts are owned by the storefront. The ledger keeps the caller's Discord id,
//! a display name, the admin flag, and `balance`, which is the single source of truth
//! for spendable coins. Only the balance store in `core::balance` writes `balance`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Discord user ID the account is linked to
    #[sea_orm(unique)]
    pub discord_id: String,
    /// Name shown to operators in listings and notifications
    pub display_name: String,
    /// Whether this user may review topups and adjust balances
    pub is_admin: bool,
    /// Spendable coins, never negative
    pub balance: i64,
    /// When the account was registered with the ledger
    pub created_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user has many coin transactions
    #[sea_orm(has_many = "super::coin_transaction::Entity")]
    CoinTransactions,
    /// One user has many topup requests
    #[sea_orm(has_many = "super::topup_request::Entity")]
    TopupRequests,
}

impl Related<super::coin_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CoinTransactions.def()
    }
}

impl Related<super::topup_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TopupRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
