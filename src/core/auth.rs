//! Caller identity.
//!
//! Authentication happens outside the ledger; what arrives here is an optional
//! [`Caller`]. Operations check it with [`require_caller`] or [`require_admin`].

use crate::{
    entities::{User, user},
    errors::{Error, Result},
};
use sea_orm::prelude::*;

/// What a caller is allowed to do
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// A shop customer acting on their own account
    Customer,
    /// A shop operator
    Admin,
}

/// An authenticated user invoking a ledger operation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Caller {
    /// ID of the calling user
    pub user_id: i64,
    /// Role of the calling user
    pub role: Role,
}

impl Caller {
    /// A customer caller.
    #[must_use]
    pub const fn customer(user_id: i64) -> Self {
        Self {
            user_id,
            role: Role::Customer,
        }
    }

    /// An operator caller.
    #[must_use]
    pub const fn admin(user_id: i64) -> Self {
        Self {
            user_id,
            role: Role::Admin,
        }
    }

    /// Whether the caller has operator rights.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

impl From<&user::Model> for Caller {
    fn from(user: &user::Model) -> Self {
        if user.is_admin {
            Self::admin(user.id)
        } else {
            Self::customer(user.id)
        }
    }
}

/// Fails with [`Error::Unauthenticated`] when there is no caller.
pub fn require_caller(caller: Option<&Caller>) -> Result<&Caller> {
    match caller {
        Some(caller) => Ok(caller),
        None => Err(Error::Unauthenticated),
    }
}

/// Fails with [`Error::Unauthenticated`] when there is no caller and with
/// [`Error::Unauthorized`] when the caller is not an operator.
pub fn require_admin<'a>(caller: Option<&'a Caller>, action: &str) -> Result<&'a Caller> {
    let caller = require_caller(caller)?;
    if caller.is_admin() {
        Ok(caller)
    } else {
        Err(Error::Unauthorized {
            action: action.to_string(),
        })
    }
}

/// Looks up the registered user behind a Discord id. Unregistered ids resolve to `None`.
pub async fn resolve_caller(db: &DatabaseConnection, discord_id: &str) -> Result<Option<Caller>> {
    let user = User::find()
        .filter(user::Column::DiscordId.eq(discord_id))
        .one(db)
        .await?;
    Ok(user.as_ref().map(Caller::from))
}
