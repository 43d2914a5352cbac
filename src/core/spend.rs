//! Spending coins.
//!
//! A spend either pays for a storefront order or redeems coins. Both debit the caller and
//! log a `spend` transaction; redemptions additionally notify operators.

use crate::{
    config::LedgerConfig,
    core::{
        auth::{Caller, require_caller},
        balance::ensure_positive,
        ledger::{self, BalanceChange},
        notification::{self, NotificationPayload},
        user::require_user,
    },
    entities::TransactionKind,
    errors::{Error, Result},
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::{info, instrument, warn};

/// Why coins are being spent
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpendPurpose {
    /// Paying for a storefront order; requires an order id
    OrderPayment,
    /// Redeeming coins; operators are notified
    Redemption,
}

impl SpendPurpose {
    const fn default_description(self) -> &'static str {
        match self {
            Self::OrderPayment => "Order payment",
            Self::Redemption => "Coin redemption",
        }
    }
}

/// Input of [`spend`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpendRequest {
    /// Coins to spend
    pub amount: i64,
    /// Optional description; a default per purpose is used when blank
    pub description: Option<String>,
    /// Related storefront order
    pub related_order_id: Option<String>,
    /// Order payment or redemption
    pub purpose: SpendPurpose,
}

/// Debits the caller and records a `spend` transaction.
///
/// Fails with [`Error::InsufficientBalance`] when the balance is smaller than the amount,
/// leaving both the balance and the log unchanged.
#[instrument(skip(db, config, caller, request), fields(amount = request.amount, purpose = ?request.purpose))]
pub async fn spend(
    db: &DatabaseConnection,
    config: &LedgerConfig,
    caller: Option<&Caller>,
    request: SpendRequest,
) -> Result<BalanceChange> {
    let caller = require_caller(caller)?;
    ensure_positive(request.amount)?;

    let related_order_id = request
        .related_order_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());
    if request.purpose == SpendPurpose::OrderPayment && related_order_id.is_none() {
        return Err(Error::validation("An order payment needs an order id"));
    }

    let description = request
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| request.purpose.default_description().to_string());

    // The debit is the first statement so the write lock is taken up front
    let txn = db.begin().await?;

    let change = match ledger::post_debit(
        &txn,
        config,
        caller.user_id,
        TransactionKind::Spend,
        request.amount,
        description,
        related_order_id,
    )
    .await
    {
        Ok(change) => change,
        Err(e) => {
            warn!(user_id = caller.user_id, "Spend refused: {e}");
            return Err(e);
        }
    };

    if request.purpose == SpendPurpose::Redemption {
        let user = require_user(&txn, caller.user_id).await?;
        notification::emit(
            &txn,
            NotificationPayload::CoinRedeem {
                transaction_id: change.transaction.id,
                user_id: user.id,
                display_name: user.display_name,
                amount: request.amount,
            },
        )
        .await?;
    }

    txn.commit().await?;

    info!(
        user_id = caller.user_id,
        new_balance = change.new_balance,
        "Coins spent"
    );
    Ok(change)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::{
            balance::get_balance,
            ledger::{audit_user, get_history},
            pagination::Page,
        },
        entities::{Notification, NotificationKind},
        test_utils::*,
    };
    use sea_orm::EntityTrait;

    fn redemption(amount: i64) -> SpendRequest {
        SpendRequest {
            amount,
            description: None,
            related_order_id: None,
            purpose: SpendPurpose::Redemption,
        }
    }

    fn order_payment(amount: i64, order_id: &str) -> SpendRequest {
        SpendRequest {
            amount,
            description: Some("GPU order".to_string()),
            related_order_id: Some(order_id.to_string()),
            purpose: SpendPurpose::OrderPayment,
        }
    }

    #[tokio::test]
    async fn test_spend_validation() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let caller = Caller::from(&user);
        let config = test_ledger_config();

        assert!(matches!(
            spend(&db, &config, None, redemption(10)).await,
            Err(Error::Unauthenticated)
        ));
        assert!(matches!(
            spend(&db, &config, Some(&caller), redemption(-1)).await,
            Err(Error::InvalidAmount { amount: -1 })
        ));
        assert!(matches!(
            spend(&db, &config, Some(&caller), order_payment(10, "  ")).await,
            Err(Error::Validation { .. })
        ));

        // A caller whose account is gone
        assert!(matches!(
            spend(&db, &config, Some(&Caller::customer(9999)), redemption(10)).await,
            Err(Error::UserNotFound { id: 9999 })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_order_payment() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        fund_user(&db, user.id, 300).await?;

        let change = spend(
            &db,
            &test_ledger_config(),
            Some(&Caller::from(&user)),
            order_payment(120, "ORD-5"),
        )
        .await?;

        assert_eq!(change.new_balance, 180);
        assert_eq!(change.transaction.kind, TransactionKind::Spend);
        assert_eq!(change.transaction.amount, -120);
        assert_eq!(change.transaction.balance_after, 180);
        assert_eq!(change.transaction.related_order_id.as_deref(), Some("ORD-5"));
        assert_eq!(change.transaction.description, "GPU order");

        // Order payments do not notify
        assert!(Notification::find().all(&db).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_redemption_notifies() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        fund_user(&db, user.id, 300).await?;

        let change = spend(
            &db,
            &test_ledger_config(),
            Some(&Caller::from(&user)),
            redemption(250),
        )
        .await?;
        assert_eq!(change.transaction.description, "Coin redemption");

        let notifications = Notification::find().all(&db).await?;
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::CoinRedeem);
        assert_eq!(
            crate::core::notification::decode_payload(&notifications[0])?,
            NotificationPayload::CoinRedeem {
                transaction_id: change.transaction.id,
                user_id: user.id,
                display_name: user.display_name.clone(),
                amount: 250,
            }
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_spend_whole_balance() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        fund_user(&db, user.id, 200).await?;

        let change = spend(
            &db,
            &test_ledger_config(),
            Some(&Caller::from(&user)),
            redemption(200),
        )
        .await?;
        assert_eq!(change.new_balance, 0);
        assert_eq!(get_balance(&db, user.id).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_spend_more_than_balance_changes_nothing() -> Result<()> {
        // Balance 200, spend 300 -> refused, nothing recorded
        let (db, user) = setup_with_user().await?;
        fund_user(&db, user.id, 200).await?;

        let result = spend(
            &db,
            &test_ledger_config(),
            Some(&Caller::from(&user)),
            redemption(300),
        )
        .await;
        assert!(matches!(
            result,
            Err(Error::InsufficientBalance {
                current: 200,
                required: 300
            })
        ));

        assert_eq!(get_balance(&db, user.id).await?, 200);
        assert_eq!(get_history(&db, user.id, Page::default()).await?.total_items, 1);
        assert!(Notification::find().all(&db).await?.is_empty());

        // Boundary: one more than the balance
        assert!(matches!(
            spend(
                &db,
                &test_ledger_config(),
                Some(&Caller::from(&user)),
                redemption(201)
            )
            .await,
            Err(Error::InsufficientBalance { .. })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_spends_cannot_overdraw() -> Result<()> {
        // Balance 150, two concurrent spends of 100 on separate connections -> exactly
        // one succeeds and the other is refused for the balance, not for a lock
        let (db, _dir) = setup_pooled_test_db().await?;
        let config = test_ledger_config();

        for round in 0..5 {
            let user = create_test_user(&db, &format!("racer_{round}"), "Racer").await?;
            fund_user(&db, user.id, 150).await?;
            let caller = Caller::from(&user);

            let (first, second) = tokio::join!(
                spend(&db, &config, Some(&caller), redemption(100)),
                spend(&db, &config, Some(&caller), redemption(100)),
            );

            let results = [first, second];
            let succeeded = results.iter().filter(|r| r.is_ok()).count();
            let refused = results
                .iter()
                .filter(|r| {
                    matches!(
                        r,
                        Err(Error::InsufficientBalance {
                            current: 50,
                            required: 100
                        })
                    )
                })
                .count();
            assert_eq!(succeeded, 1, "round {round}: {results:?}");
            assert_eq!(refused, 1, "round {round}: {results:?}");

            assert_eq!(get_balance(&db, user.id).await?, 50);
            let audit = audit_user(&db, user.id).await?;
            assert!(audit.is_consistent());
            assert_eq!(audit.transaction_count, 2);
        }

        Ok(())
    }
}
