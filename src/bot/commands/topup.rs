//! Topup Discord commands - `topup` and `my_topups`.
//!
//! Customers attach the receipt of an external payment; the attachment URL is stored as
//! the receipt reference and the request waits for an operator.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, resolve_author},
        core::{
            pagination::Page,
            topup::{self, SubmitTopup},
        },
        entities::TopupStatus,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use std::fmt::Write;

    pub const fn status_label(status: TopupStatus) -> &'static str {
        match status {
            TopupStatus::Pending => "⏳ pending",
            TopupStatus::Approved => "✅ approved",
            TopupStatus::Rejected => "❌ rejected",
        }
    }

    /// Requests a coin topup for a payment you made.
    ///
    /// Attach a screenshot or photo of the payment receipt; shop staff review it and
    /// credit your balance on approval.
    #[poise::command(slash_command)]
    pub async fn topup(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Coins to add"] amount: i64,
        #[description = "Receipt image of the payment"] receipt: serenity::Attachment,
        #[description = "Name on the payment (defaults to your Discord name)"] display_name: Option<
            String,
        >,
        #[description = "Note for the reviewer"] note: Option<String>,
    ) -> Result<()> {
        let caller = resolve_author(ctx).await?;
        let data = ctx.data();
        let display_name = display_name.unwrap_or_else(|| ctx.author().name.clone());

        let request = topup::submit(
            &data.database,
            &data.config.topups,
            caller.as_ref(),
            SubmitTopup {
                amount,
                receipt_image_ref: receipt.url.clone(),
                display_name,
                note,
            },
        )
        .await?;

        ctx.send(
            poise::CreateReply::default()
                .content(format!(
                    "📨 Topup request #{} for {} coins submitted. You'll be credited once staff approve it.",
                    request.id, request.amount
                ))
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }

    /// Shows the status of your topup requests, newest first.
    #[poise::command(slash_command, prefix_command)]
    pub async fn my_topups(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Page number (defaults to 1)"] page: Option<u64>,
    ) -> Result<()> {
        let caller = resolve_author(ctx).await?;
        let data = ctx.data();

        let page = Page::from_request(page, None, &data.config.ledger);
        let requests = topup::list_own(&data.database, caller.as_ref(), page).await?;

        if requests.items.is_empty() {
            ctx.say("📭 No topup requests on this page.").await?;
            return Ok(());
        }

        let mut response = String::new();
        for request in &requests.items {
            write!(
                &mut response,
                "**#{}** {} coins - {} ({})",
                request.id,
                request.amount,
                status_label(request.status),
                request.created_at.format("%Y-%m-%d")
            )?;
            if let Some(admin_note) = &request.admin_note {
                write!(&mut response, " - staff note: {admin_note}")?;
            }
            writeln!(&mut response)?;
        }
        write!(
            &mut response,
            "\nPage {}/{}",
            requests.page.number,
            requests.total_pages.max(1)
        )?;

        ctx.send(poise::CreateReply::default().content(response).ephemeral(true))
            .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
