//! General Discord commands - ping and help.
//! This module contains simple commands that don't require database operations.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**Coin Ledger Help**\n\
        Here is a summary of all available commands.\n\n\
        **Your Coins**\n\
        • `/register [name]` - Creates your coin account.\n\
        • `/coins` - Shows your balance and lifetime totals.\n\
        • `/history [page]` - Lists your coin transactions.\n\
        • `/redeem <amount> [desc]` - Redeems coins.\n\n\
        **Topups**\n\
        • `/topup <amount> <receipt> [name] [note]` - Requests a topup for a payment you made.\n\
        • `/my_topups [page]` - Shows the status of your topup requests.\n\n\
        **Operators**\n\
        • `/topup_admin <list|approve|reject>` - Reviews topup requests.\n\
        • `/coins_admin <credit|debit>` - Adjusts a user's balance.\n\
        • `/notifications [unread_only] [page]` - Lists notifications.\n\
        • `/notification_read <id>` - Marks a notification as read.\n\n\
        **Utility**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
