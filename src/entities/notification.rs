//! Notification entity - Operator-facing side channel.
//!
//! A notification is written when something needs operator attention. `payload` holds
//! the JSON encoding of `core::notification::NotificationPayload`; references inside
//! it are lookups only and never ownership. Only `is_read` changes after insertion.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What triggered a notification
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A user submitted a topup request
    #[sea_orm(string_value = "topup_request")]
    TopupRequest,
    /// A user redeemed coins
    #[sea_orm(string_value = "coin_redeem")]
    CoinRedeem,
    /// A new storefront order was placed
    #[sea_orm(string_value = "new_order")]
    NewOrder,
}

/// Notification database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    /// Unique identifier for the notification
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Trigger kind, duplicated from the payload for filtering
    pub kind: NotificationKind,
    /// Short headline
    pub title: String,
    /// One-line human-readable message
    pub message: String,
    /// Typed payload encoded as JSON
    pub payload: Json,
    /// Whether an operator has acknowledged it
    pub is_read: bool,
    /// When the notification was created
    pub created_at: DateTimeUtc,
}

/// Notifications have no ownership relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
