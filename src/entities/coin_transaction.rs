//! Coin transaction entity - The append-only audit trail of balance changes.
//!
//! Each row carries a unique `reference_number`, a signed `amount` (positive for
//! `earn`/`topup`, negative for `spend`/`deduct`), and `balance_after`, the user's
//! balance right after the row was applied. Rows are inserted, never updated or deleted.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of balance-affecting event
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Coins granted by the shop (cashback, rewards)
    #[sea_orm(string_value = "earn")]
    Earn,
    /// Coins spent on an order or redeemed
    #[sea_orm(string_value = "spend")]
    Spend,
    /// Coins bought with an external payment or credited by an operator
    #[sea_orm(string_value = "topup")]
    Topup,
    /// Coins removed by an operator
    #[sea_orm(string_value = "deduct")]
    Deduct,
}

impl TransactionKind {
    /// Whether this kind adds coins to the balance.
    #[must_use]
    pub const fn is_credit(self) -> bool {
        matches!(self, Self::Earn | Self::Topup)
    }
}

/// Coin transaction database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "coin_transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the user whose balance changed
    pub user_id: i64,
    /// Human-facing reference, e.g. `COIN-1718000000000-00042`
    #[sea_orm(unique)]
    pub reference_number: String,
    /// What kind of event this was
    pub kind: TransactionKind,
    /// Signed coin amount
    pub amount: i64,
    /// Human-readable description of the transaction
    pub description: String,
    /// Storefront order this transaction relates to, if any
    pub related_order_id: Option<String>,
    /// User balance immediately after this transaction
    pub balance_after: i64,
    /// When the transaction was recorded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `CoinTransaction` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
