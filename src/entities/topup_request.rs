//! Topup request entity - A user's claim of an external payment awaiting review.
//!
//! Requests start `pending` and move exactly once, by an operator, to `approved` or
//! `rejected`. An approved request points at the `topup` transaction it produced.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Review status of a topup request
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum TopupStatus {
    /// Waiting for an operator
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Credited to the user's balance
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Declined without balance effect
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl TopupStatus {
    /// Lowercase label used in replies and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// Topup request database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "topup_requests")]
pub struct Model {
    /// Unique identifier for the request
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the submitting user
    pub user_id: i64,
    /// Name the user gave on the payment (for matching against the receipt)
    pub submitted_display_name: String,
    /// Requested coin amount, always positive
    pub amount: i64,
    /// Reference to the uploaded receipt image
    pub receipt_image_ref: String,
    /// Current review status
    pub status: TopupStatus,
    /// Optional note from the user
    pub note: Option<String>,
    /// Optional note from the reviewing operator
    pub admin_note: Option<String>,
    /// ID of the operator who reviewed the request
    pub reviewer_id: Option<i64>,
    /// When the request was reviewed
    pub reviewed_at: Option<DateTimeUtc>,
    /// The `topup` transaction created on approval
    pub transaction_id: Option<i64>,
    /// When the request was submitted
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `TopupRequest` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each request belongs to one user
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
