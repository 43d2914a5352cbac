//! Autocomplete handlers for Discord slash command parameters.
//!
//! Operators pick topup requests by id; suggesting the pending ones saves a round trip
//! through `/topup_admin list`.

use crate::{bot::BotData, core::topup, errors::Error};
use poise::serenity_prelude as serenity;
use tracing::warn;

/// Discord accepts at most this many suggestions
const MAX_SUGGESTIONS: usize = 25;
/// Pending requests scanned for a prefix match
const SCAN_LIMIT: u64 = 500;

/// Suggests ids of pending topup requests, oldest first.
///
/// The partial input is matched as a prefix of the id. A lookup failure yields no
/// suggestions instead of an error.
pub async fn autocomplete_pending_topup_id(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<serenity::AutocompleteChoice> {
    let db = &ctx.data().database;

    let ids = match topup::pending_request_ids(db, SCAN_LIMIT).await {
        Ok(ids) => ids,
        Err(e) => {
            warn!("Pending topup lookup for autocomplete failed: {e}");
            return Vec::new();
        }
    };

    let partial = partial.trim().trim_start_matches('#');
    ids.into_iter()
        .filter(|id| id.to_string().starts_with(partial))
        .take(MAX_SUGGESTIONS)
        .map(|id| serenity::AutocompleteChoice::new(format!("#{id} (pending)"), id))
        .collect()
}
