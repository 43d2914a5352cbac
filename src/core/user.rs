//! User registration and lookup.
//!
//! The storefront owns accounts; the ledger only needs to know who a Discord id belongs
//! to, what to call them, and whether they are an operator.

use crate::{
    config::AdminConfig,
    entities::{User, user},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use tracing::{info, instrument};

/// Display fields of a user, resolved for listings and confirmations
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserSummary {
    /// User id
    pub id: i64,
    /// Linked Discord id
    pub discord_id: String,
    /// Display name
    pub display_name: String,
    /// Balance at the time the summary was taken
    pub balance: i64,
}

impl From<&user::Model> for UserSummary {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id,
            discord_id: user.discord_id.clone(),
            display_name: user.display_name.clone(),
            balance: user.balance,
        }
    }
}

/// Registers a user with a zero balance, or returns the existing record for this Discord id.
#[instrument(skip(db))]
pub async fn register_user(
    db: &DatabaseConnection,
    discord_id: &str,
    display_name: &str,
) -> Result<user::Model> {
    let display_name = display_name.trim();
    if discord_id.trim().is_empty() {
        return Err(Error::validation("Discord id cannot be empty"));
    }
    if display_name.is_empty() {
        return Err(Error::validation("Display name cannot be empty"));
    }

    if let Some(existing) = get_user_by_discord_id(db, discord_id).await? {
        return Ok(existing);
    }

    let user = user::ActiveModel {
        discord_id: Set(discord_id.to_string()),
        display_name: Set(display_name.to_string()),
        is_admin: Set(false),
        balance: Set(0),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let user = user.insert(db).await?;
    info!(user_id = user.id, "Registered ledger user");
    Ok(user)
}

/// Finds a user by id.
pub async fn get_user_by_id(db: &DatabaseConnection, user_id: i64) -> Result<Option<user::Model>> {
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Finds a user by linked Discord id.
pub async fn get_user_by_discord_id(
    db: &DatabaseConnection,
    discord_id: &str,
) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::DiscordId.eq(discord_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads a user, failing with [`Error::UserNotFound`] when missing.
///
/// Generic over the connection so it can run inside a database transaction.
pub async fn require_user<C>(conn: &C, user_id: i64) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id)
        .one(conn)
        .await?
        .ok_or(Error::UserNotFound { id: user_id })
}

/// Grants or revokes operator rights.
pub async fn set_admin(db: &DatabaseConnection, user_id: i64, is_admin: bool) -> Result<user::Model> {
    let user = require_user(db, user_id).await?;
    if user.is_admin == is_admin {
        return Ok(user);
    }

    let mut active: user::ActiveModel = user.into();
    active.is_admin = Set(is_admin);
    let user = active.update(db).await?;
    info!(user_id, is_admin, "Updated operator rights");
    Ok(user)
}

/// Ensures every configured operator exists and has operator rights.
///
/// Returns the number of accounts that were created or promoted.
#[instrument(skip(db, admins))]
pub async fn seed_admins(db: &DatabaseConnection, admins: &[AdminConfig]) -> Result<usize> {
    let mut changed = 0;

    for admin in admins {
        let user = register_user(db, &admin.discord_id, &admin.display_name).await?;
        if !user.is_admin {
            set_admin(db, user.id, true).await?;
            changed += 1;
        }
    }

    info!("Seeded {} operator account(s) ({changed} changed)", admins.len());
    Ok(changed)
}
