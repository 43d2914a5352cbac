use coin_ledger::{
    bot,
    config::{
        database::{create_connection, create_tables},
        ledger::load_default_config,
    },
    core::user::seed_admins,
    errors::{Error, Result},
};
use dotenvy::dotenv;
use std::{env, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the application configuration
    let app_config = load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {e}"))?;

    // 4. Connect and make sure the schema exists
    let db = create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    create_tables(&db)
        .await
        .inspect(|()| info!("Database schema ready."))
        .inspect_err(|e| error!("Failed to create tables: {e}"))?;

    // 5. Seed operator accounts from config
    let seeded = seed_admins(&db, &app_config.admins)
        .await
        .inspect_err(|e| error!("Failed to seed operators: {e}"))?;
    info!("{seeded} operator account(s) seeded.");

    // 6. Run the bot; the token is read directly before use, not stored in AppConfig
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {e}"))
        .map_err(Error::EnvVar)?;

    bot::run_bot(token, Arc::new(app_config), db)
        .await
        .inspect_err(|e| error!("Bot stopped with an error: {e}"))?;

    info!("Bot has shut down.");
    Ok(())
}
