//! Wallet Discord commands - `register`, `coins`, `history` and `redeem`.
//!
//! These commands act on the author's own account.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, resolve_author},
        core::{
            auth::require_caller,
            ledger,
            pagination::Page,
            spend::{self, SpendPurpose, SpendRequest},
            user,
        },
        entities::TransactionKind,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use std::fmt::Write;

    const fn kind_label(kind: TransactionKind) -> &'static str {
        match kind {
            TransactionKind::Earn => "🎁 earn",
            TransactionKind::Spend => "🛒 spend",
            TransactionKind::Topup => "💳 topup",
            TransactionKind::Deduct => "➖ deduct",
        }
    }

    /// Creates your coin account, linked to your Discord account.
    ///
    /// Running it again is harmless and shows your existing account.
    #[poise::command(slash_command, prefix_command)]
    pub async fn register(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Name shown to shop staff (defaults to your Discord name)"]
        display_name: Option<String>,
    ) -> Result<()> {
        let discord_id = ctx.author().id.to_string();
        let name = display_name.unwrap_or_else(|| ctx.author().name.clone());

        let account = user::register_user(&ctx.data().database, &discord_id, &name).await?;

        ctx.say(format!(
            "✅ Coin account ready for **{}** - balance: {} coins",
            account.display_name, account.balance
        ))
        .await?;
        Ok(())
    }

    /// Shows your coin balance and lifetime totals.
    #[poise::command(slash_command, prefix_command)]
    pub async fn coins(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let caller = resolve_author(ctx).await?;
        let caller = require_caller(caller.as_ref())?;

        let summary = ledger::get_summary(&ctx.data().database, caller.user_id).await?;

        let embed = serenity::CreateEmbed::default()
            .title("🪙 Your Coins")
            .color(0x00F1_C40F) // Gold
            .field("Balance", summary.current_balance.to_string(), true)
            .field("Total credited", summary.total_credited.to_string(), true)
            .field("Total spent", summary.total_debited.to_string(), true);

        ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
            .await?;
        Ok(())
    }

    /// Lists your coin transactions, newest first.
    #[poise::command(slash_command, prefix_command)]
    pub async fn history(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Page number (defaults to 1)"] page: Option<u64>,
    ) -> Result<()> {
        let caller = resolve_author(ctx).await?;
        let caller = require_caller(caller.as_ref())?;
        let data = ctx.data();

        let page = Page::from_request(page, None, &data.config.ledger);
        let history = ledger::get_history(&data.database, caller.user_id, page).await?;

        if history.items.is_empty() {
            ctx.say("📭 No transactions on this page.").await?;
            return Ok(());
        }

        let mut response = String::new();
        for tx in &history.items {
            writeln!(
                &mut response,
                "`{}` {} **{:+}** → {} | {} ({})",
                tx.reference_number,
                kind_label(tx.kind),
                tx.amount,
                tx.balance_after,
                tx.description,
                tx.created_at.format("%Y-%m-%d %H:%M")
            )?;
        }
        write!(
            &mut response,
            "\nPage {}/{} - {} transaction(s)",
            history.page.number,
            history.total_pages.max(1),
            history.total_items
        )?;

        ctx.send(poise::CreateReply::default().content(response).ephemeral(true))
            .await?;
        Ok(())
    }

    /// Redeems coins from your balance. Shop staff are notified.
    #[poise::command(slash_command, prefix_command)]
    pub async fn redeem(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Coins to redeem"] amount: i64,
        #[description = "What the coins are redeemed for"] description: Option<String>,
    ) -> Result<()> {
        let caller = resolve_author(ctx).await?;
        let data = ctx.data();

        let change = spend::spend(
            &data.database,
            &data.config.ledger,
            caller.as_ref(),
            SpendRequest {
                amount,
                description,
                related_order_id: None,
                purpose: SpendPurpose::Redemption,
            },
        )
        .await?;

        ctx.say(format!(
            "✅ Redeemed {amount} coins - new balance: {} (Ref: `{}`)",
            change.new_balance, change.transaction.reference_number
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
