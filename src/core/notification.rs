//! Operator notifications.
//!
//! Notifications are a side channel: the ledger never reads them back to decide anything.
//! Each one carries a [`NotificationPayload`] whose variant fixes the kind, the title and
//! the message, and which is stored as JSON. After insertion only `is_read` changes.

use crate::{
    core::{
        auth::{Caller, require_admin},
        pagination::{Page, Paginated},
    },
    entities::{Notification, NotificationKind, notification},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Typed payload of a notification
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationPayload {
    /// A user submitted a topup request
    TopupRequest {
        /// The new request
        request_id: i64,
        /// The submitting user
        user_id: i64,
        /// Name the user gave on the payment
        display_name: String,
        /// Claimed amount
        amount: i64,
    },
    /// A user redeemed coins
    CoinRedeem {
        /// The `spend` transaction
        transaction_id: i64,
        /// The redeeming user
        user_id: i64,
        /// Display name of the redeeming user
        display_name: String,
        /// Coins redeemed
        amount: i64,
    },
    /// A storefront order was placed
    NewOrder {
        /// Storefront order id
        order_id: String,
        /// The ordering user
        user_id: i64,
        /// Order total in coins
        amount: i64,
    },
}

impl NotificationPayload {
    /// Stored kind of this payload.
    #[must_use]
    pub const fn kind(&self) -> NotificationKind {
        match self {
            Self::TopupRequest { .. } => NotificationKind::TopupRequest,
            Self::CoinRedeem { .. } => NotificationKind::CoinRedeem,
            Self::NewOrder { .. } => NotificationKind::NewOrder,
        }
    }

    /// Short headline.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::TopupRequest { .. } => "New topup request",
            Self::CoinRedeem { .. } => "Coins redeemed",
            Self::NewOrder { .. } => "New order",
        }
    }

    /// One-line description for operators.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::TopupRequest {
                request_id,
                display_name,
                amount,
                ..
            } => format!("{display_name} requested a topup of {amount} coins (request #{request_id})"),
            Self::CoinRedeem {
                display_name,
                amount,
                ..
            } => format!("{display_name} redeemed {amount} coins"),
            Self::NewOrder {
                order_id, amount, ..
            } => format!("Order {order_id} was placed for {amount} coins"),
        }
    }
}

/// Decodes the payload stored on a notification.
pub fn decode_payload(model: &notification::Model) -> Result<NotificationPayload> {
    serde_json::from_value(model.payload.clone()).map_err(Into::into)
}

/// Writes a notification for `payload`.
///
/// Generic over the connection so the notification commits together with the event
/// that triggered it.
#[instrument(skip(conn))]
pub async fn emit<C>(conn: &C, payload: NotificationPayload) -> Result<notification::Model>
where
    C: ConnectionTrait,
{
    let notification = notification::ActiveModel {
        kind: Set(payload.kind()),
        title: Set(payload.title().to_string()),
        message: Set(payload.message()),
        payload: Set(serde_json::to_value(&payload)?),
        is_read: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    debug!(id = notification.id, "Emitted notification");
    Ok(notification)
}

/// Tells operators about a new storefront order.
pub async fn notify_new_order(
    db: &DatabaseConnection,
    order_id: &str,
    user_id: i64,
    amount: i64,
) -> Result<notification::Model> {
    if order_id.trim().is_empty() {
        return Err(Error::validation("Order id cannot be empty"));
    }

    emit(
        db,
        NotificationPayload::NewOrder {
            order_id: order_id.trim().to_string(),
            user_id,
            amount,
        },
    )
    .await
}

/// Lists notifications, newest first. Operators only.
pub async fn list(
    db: &DatabaseConnection,
    caller: Option<&Caller>,
    unread_only: bool,
    page: Page,
) -> Result<Paginated<notification::Model>> {
    require_admin(caller, "view notifications")?;

    let mut query = Notification::find();
    if unread_only {
        query = query.filter(notification::Column::IsRead.eq(false));
    }

    let paginator = query
        .order_by_desc(notification::Column::CreatedAt)
        .order_by_desc(notification::Column::Id)
        .paginate(db, page.per_page);

    let totals = paginator.num_items_and_pages().await?;
    let items = paginator.fetch_page(page.index()).await?;
    Ok(Paginated::new(items, page, totals))
}

/// Counts unread notifications. Operators only.
pub async fn unread_count(db: &DatabaseConnection, caller: Option<&Caller>) -> Result<u64> {
    require_admin(caller, "view notifications")?;

    Notification::find()
        .filter(notification::Column::IsRead.eq(false))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Marks a notification as read. Marking an already-read notification is a no-op.
pub async fn mark_read(
    db: &DatabaseConnection,
    caller: Option<&Caller>,
    notification_id: i64,
) -> Result<notification::Model> {
    require_admin(caller, "update notifications")?;

    let notification = Notification::find_by_id(notification_id)
        .one(db)
        .await?
        .ok_or(Error::NotificationNotFound {
            id: notification_id,
        })?;

    if notification.is_read {
        return Ok(notification);
    }

    let mut active: notification::ActiveModel = notification.into();
    active.is_read = Set(true);
    active.update(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_payload_json_is_tagged_by_kind() {
        let payload = NotificationPayload::TopupRequest {
            request_id: 3,
            user_id: 9,
            display_name: "Alice".to_string(),
            amount: 1000,
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "topup_request");
        assert_eq!(json["request_id"], 3);
        assert_eq!(json["amount"], 1000);
        assert!(json.get("order_id").is_none());
    }

    #[test]
    fn test_payload_message() {
        let payload = NotificationPayload::CoinRedeem {
            transaction_id: 1,
            user_id: 2,
            display_name: "Bob".to_string(),
            amount: 250,
        };
        assert_eq!(payload.kind(), NotificationKind::CoinRedeem);
        assert_eq!(payload.message(), "Bob redeemed 250 coins");
    }

    #[tokio::test]
    async fn test_emit_and_decode() -> Result<()> {
        let db = setup_test_db().await?;

        let notification = notify_new_order(&db, " ORD-77 ", 4, 1999).await?;
        assert_eq!(notification.kind, NotificationKind::NewOrder);
        assert_eq!(notification.title, "New order");
        assert!(!notification.is_read);
        assert_eq!(
            decode_payload(&notification)?,
            NotificationPayload::NewOrder {
                order_id: "ORD-77".to_string(),
                user_id: 4,
                amount: 1999,
            }
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_list_and_mark_read_require_admin() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = Caller::customer(1);

        assert!(matches!(
            list(&db, Some(&customer), false, Page::default()).await,
            Err(Error::Unauthorized { .. })
        ));
        assert!(matches!(
            mark_read(&db, None, 1).await,
            Err(Error::Unauthenticated)
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_mark_read_flow() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_admin(&db, "900", "Operator").await?;
        let caller = Caller::from(&admin);

        let first = notify_new_order(&db, "ORD-1", admin.id, 10).await?;
        notify_new_order(&db, "ORD-2", admin.id, 20).await?;
        assert_eq!(unread_count(&db, Some(&caller)).await?, 2);

        let read = mark_read(&db, Some(&caller), first.id).await?;
        assert!(read.is_read);
        assert_eq!(read.message, first.message);
        assert_eq!(unread_count(&db, Some(&caller)).await?, 1);

        // Idempotent
        assert!(mark_read(&db, Some(&caller), first.id).await?.is_read);

        let unread = list(&db, Some(&caller), true, Page::default()).await?;
        assert_eq!(unread.items.len(), 1);
        assert_eq!(unread.items[0].title, "New order");
        let all = list(&db, Some(&caller), false, Page::default()).await?;
        assert_eq!(all.total_items, 2);

        assert!(matches!(
            mark_read(&db, Some(&caller), 404).await,
            Err(Error::NotificationNotFound { id: 404 })
        ));

        Ok(())
    }
}
