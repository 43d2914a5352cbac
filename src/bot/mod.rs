//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for the coin ledger: customer commands for
//! balances, topups and redemptions, and operator commands for reviewing topups,
//! adjusting balances and reading notifications. All rules live in `core`; commands
//! resolve the caller, call into `core`, and format the result.

/// Discord command implementations (general, wallet, topup, admin)
pub mod commands;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;

use crate::{
    config::AppConfig,
    core::auth::{self, Caller},
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Shared data available to all bot commands.
/// This structure holds the database connection and the loaded configuration.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Application configuration
    pub config: Arc<AppConfig>,
}

impl BotData {
    /// Creates a new `BotData` instance with the given database connection and config.
    #[must_use]
    pub const fn new(database: DatabaseConnection, config: Arc<AppConfig>) -> Self {
        Self { database, config }
    }
}

/// Poise context used by every command
pub type Context<'a> = poise::Context<'a, BotData, Error>;

/// Resolves the command author to a ledger caller. Unregistered authors resolve to `None`.
pub async fn resolve_author(ctx: Context<'_>) -> Result<Option<Caller>> {
    auth::resolve_caller(&ctx.data().database, &ctx.author().id.to_string()).await
}

/// Text shown to the user for a failed command.
///
/// Expected failures (bad input, missing rights, wrong state) are shown as they are;
/// anything else gets a generic message and is only logged.
#[must_use]
pub fn user_facing_error(error: &Error) -> String {
    match error {
        Error::Unauthenticated => {
            "❌ You don't have a coin account yet. Use `/register` first.".to_string()
        }
        e if e.status_code() < 500 => format!("❌ {e}"),
        e if e.is_transient() => {
            "⚠️ The ledger is temporarily unavailable. Please try again.".to_string()
        }
        _ => "❌ Something went wrong. The error has been logged.".to_string(),
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {error}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            if error.status_code() < 500 {
                warn!("Command `{}` refused: {error}", ctx.command().name);
            } else {
                error!("Error in command `{}`: {error:?}", ctx.command().name);
            }
            if let Err(e) = ctx.say(user_facing_error(&error)).await {
                error!("Failed to send error message: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Builds the framework with every command and runs the Discord client until it stops.
#[instrument(skip(token, config, database))]
pub async fn run_bot(
    token: String,
    config: Arc<AppConfig>,
    database: DatabaseConnection,
) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::ping(),
                commands::help(),
                commands::register(),
                commands::coins(),
                commands::history(),
                commands::redeem(),
                commands::topup(),
                commands::my_topups(),
                commands::topup_admin(),
                commands::coins_admin(),
                commands::notifications(),
                commands::notification_read(),
            ],
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(BotData::new(database, config))
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await?;

    info!("Starting bot client...");
    client.start().await.map_err(Error::from)
}
