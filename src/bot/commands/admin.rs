//! Operator Discord commands - `topup_admin`, `coins_admin`, `notifications` and
//! `notification_read`.
//!
//! Every command here requires the author to be a registered operator; the check itself
//! happens in `core`, so refusals come back as ordinary command errors.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::topup::status_label, handlers::autocomplete, resolve_author},
        core::{
            adjust::{self, AdjustmentOutcome},
            notification,
            pagination::Page,
            topup::{self, TopupAction},
            user,
        },
        entities::TopupStatus,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use std::fmt::Write;

    /// Status filter offered by `/topup_admin list`
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum StatusChoice {
        #[name = "pending"]
        Pending,
        #[name = "approved"]
        Approved,
        #[name = "rejected"]
        Rejected,
    }

    impl From<StatusChoice> for TopupStatus {
        fn from(choice: StatusChoice) -> Self {
            match choice {
                StatusChoice::Pending => Self::Pending,
                StatusChoice::Approved => Self::Approved,
                StatusChoice::Rejected => Self::Rejected,
            }
        }
    }

    /// Parent command for reviewing topup requests.
    #[poise::command(
        slash_command,
        subcommands("topup_list", "topup_approve", "topup_reject")
    )]
    pub async fn topup_admin(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Topup review command. Available subcommands:\n\
            `/topup_admin list` - List topup requests\n\
            `/topup_admin approve` - Approve a pending request and credit the coins\n\
            `/topup_admin reject` - Reject a pending request";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Lists topup requests, newest first.
    #[poise::command(slash_command, rename = "list")]
    pub async fn topup_list(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Only show requests with this status"] status: Option<StatusChoice>,
        #[description = "Page number (defaults to 1)"] page: Option<u64>,
    ) -> Result<()> {
        let caller = resolve_author(ctx).await?;
        let data = ctx.data();

        let page = Page::from_request(page, None, &data.config.ledger);
        let requests = topup::list_all(
            &data.database,
            caller.as_ref(),
            status.map(TopupStatus::from),
            page,
        )
        .await?;

        if requests.items.is_empty() {
            ctx.say("📭 No topup requests found.").await?;
            return Ok(());
        }

        let fields: Vec<(String, String, bool)> = requests
            .items
            .iter()
            .map(|entry| {
                let request = &entry.request;
                let owner = entry.user.as_ref().map_or_else(
                    || format!("user {}", request.user_id),
                    |u| format!("{} (<@{}>)", u.display_name, u.discord_id),
                );
                let mut value = format!(
                    "{} coins - {}\nBy {owner}, paid as \"{}\"\n[Receipt]({})",
                    request.amount,
                    status_label(request.status),
                    request.submitted_display_name,
                    request.receipt_image_ref
                );
                if let Some(note) = &request.note {
                    value.push_str(&format!("\nNote: {note}"));
                }
                (
                    format!(
                        "#{} - {}",
                        request.id,
                        request.created_at.format("%Y-%m-%d %H:%M")
                    ),
                    value,
                    false,
                )
            })
            .collect();

        let embed = serenity::CreateEmbed::default()
            .title("💳 Topup Requests")
            .color(0x0058_65F2) // Discord blurple
            .fields(fields)
            .footer(serenity::CreateEmbedFooter::new(format!(
                "Page {}/{} - {} request(s)",
                requests.page.number,
                requests.total_pages.max(1),
                requests.total_items
            )));

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    async fn review(
        ctx: poise::Context<'_, BotData, Error>,
        request_id: i64,
        action: TopupAction,
        note: Option<String>,
    ) -> Result<()> {
        let caller = resolve_author(ctx).await?;
        let data = ctx.data();

        let processed = topup::process(
            &data.database,
            &data.config.ledger,
            caller.as_ref(),
            request_id,
            action,
            note,
        )
        .await?;

        let reply = match (&processed.transaction, processed.new_balance) {
            (Some(tx), Some(balance)) => format!(
                "✅ Approved topup #{} - {} coins credited, owner balance is now {balance} (Ref: `{}`)",
                processed.request.id, processed.request.amount, tx.reference_number
            ),
            _ => format!("❌ Rejected topup #{}", processed.request.id),
        };

        ctx.say(reply).await?;
        Ok(())
    }

    /// Approves a pending topup request and credits the coins.
    #[poise::command(slash_command, rename = "approve")]
    pub async fn topup_approve(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Topup request ID"]
        #[autocomplete = "autocomplete::autocomplete_pending_topup_id"]
        request_id: i64,
        #[description = "Note for the customer"] note: Option<String>,
    ) -> Result<()> {
        review(ctx, request_id, TopupAction::Approve, note).await
    }

    /// Rejects a pending topup request.
    #[poise::command(slash_command, rename = "reject")]
    pub async fn topup_reject(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Topup request ID"]
        #[autocomplete = "autocomplete::autocomplete_pending_topup_id"]
        request_id: i64,
        #[description = "Reason shown to the customer"] note: Option<String>,
    ) -> Result<()> {
        review(ctx, request_id, TopupAction::Reject, note).await
    }

    /// Parent command for manual balance adjustments.
    #[poise::command(slash_command, subcommands("coins_credit", "coins_debit"))]
    pub async fn coins_admin(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Balance adjustment command. Available subcommands:\n\
            `/coins_admin credit` - Add coins to a user's balance\n\
            `/coins_admin debit` - Remove coins from a user's balance";

        ctx.say(help_text).await?;
        Ok(())
    }

    #[derive(Clone, Copy)]
    enum Direction {
        Credit,
        Debit,
    }

    async fn adjust_balance(
        ctx: poise::Context<'_, BotData, Error>,
        target: &serenity::User,
        amount: i64,
        description: Option<String>,
        direction: Direction,
    ) -> Result<()> {
        let caller = resolve_author(ctx).await?;
        let data = ctx.data();

        let Some(target_account) =
            user::get_user_by_discord_id(&data.database, &target.id.to_string()).await?
        else {
            ctx.say(format!(
                "❌ {} has no coin account. They need to `/register` first.",
                target.name
            ))
            .await?;
            return Ok(());
        };

        let AdjustmentOutcome {
            transaction,
            new_balance,
            target: summary,
        } = match direction {
            Direction::Credit => {
                adjust::admin_credit(
                    &data.database,
                    &data.config.ledger,
                    caller.as_ref(),
                    target_account.id,
                    amount,
                    description,
                )
                .await?
            }
            Direction::Debit => {
                adjust::admin_debit(
                    &data.database,
                    &data.config.ledger,
                    caller.as_ref(),
                    target_account.id,
                    amount,
                    description,
                )
                .await?
            }
        };

        ctx.say(format!(
            "✅ {:+} coins for **{}** - new balance: {new_balance} (Ref: `{}`)",
            transaction.amount, summary.display_name, transaction.reference_number
        ))
        .await?;
        Ok(())
    }

    /// Adds coins to a user's balance.
    #[poise::command(slash_command, rename = "credit")]
    pub async fn coins_credit(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "User to credit"] user: serenity::User,
        #[description = "Coins to add"] amount: i64,
        #[description = "Reason for the adjustment"] description: Option<String>,
    ) -> Result<()> {
        adjust_balance(ctx, &user, amount, description, Direction::Credit).await
    }

    /// Removes coins from a user's balance.
    #[poise::command(slash_command, rename = "debit")]
    pub async fn coins_debit(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "User to debit"] user: serenity::User,
        #[description = "Coins to remove"] amount: i64,
        #[description = "Reason for the adjustment"] description: Option<String>,
    ) -> Result<()> {
        adjust_balance(ctx, &user, amount, description, Direction::Debit).await
    }

    /// Shows operator notifications, newest first.
    #[poise::command(slash_command)]
    pub async fn notifications(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Only show unread notifications"] unread_only: Option<bool>,
        #[description = "Page number (defaults to 1)"] page: Option<u64>,
    ) -> Result<()> {
        let caller = resolve_author(ctx).await?;
        let data = ctx.data();

        let page = Page::from_request(page, None, &data.config.ledger);
        let listed = notification::list(
            &data.database,
            caller.as_ref(),
            unread_only.unwrap_or(false),
            page,
        )
        .await?;
        let unread = notification::unread_count(&data.database, caller.as_ref()).await?;

        let mut response = format!("🔔 **Notifications** ({unread} unread)\n\n");
        if listed.items.is_empty() {
            response.push_str("Nothing here.");
        }
        for item in &listed.items {
            writeln!(
                &mut response,
                "{} **#{}** {} - {} ({})",
                if item.is_read { "▫️" } else { "🔸" },
                item.id,
                item.title,
                item.message,
                item.created_at.format("%Y-%m-%d %H:%M")
            )?;
        }
        if listed.has_next() {
            write!(
                &mut response,
                "\nPage {}/{} - use `page` for more",
                listed.page.number, listed.total_pages
            )?;
        }

        ctx.send(poise::CreateReply::default().content(response).ephemeral(true))
            .await?;
        Ok(())
    }

    /// Marks a notification as read.
    #[poise::command(slash_command)]
    pub async fn notification_read(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Notification ID"] notification_id: i64,
    ) -> Result<()> {
        let caller = resolve_author(ctx).await?;

        let updated =
            notification::mark_read(&ctx.data().database, caller.as_ref(), notification_id)
                .await?;

        ctx.send(
            poise::CreateReply::default()
                .content(format!("✅ Notification #{} marked as read", updated.id))
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
