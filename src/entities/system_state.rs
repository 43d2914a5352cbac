//! System state entity - Key-value pairs for ledger-wide counters.
//! The transaction reference sequence lives here so it survives restarts.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// System state database model - stores key-value pairs
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "system_state")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// State key (e.g., `"coin_reference_seq"`)
    #[sea_orm(unique)]
    pub key: String,
    /// Value stored as string
    pub value: String,
    /// When this value was last modified
    pub updated_at: DateTimeUtc,
}

/// `SystemState` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
