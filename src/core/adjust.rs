//! Operator adjustments and system rewards.
//!
//! Operators can credit (`topup`) or debit (`deduct`) any account directly. Rewards such
//! as order cashback are credited by the storefront as `earn` transactions.

use crate::{
    config::LedgerConfig,
    core::{
        auth::{Caller, require_admin},
        ledger::{self, BalanceChange},
        user::{UserSummary, require_user},
    },
    entities::{TransactionKind, coin_transaction},
    errors::Result,
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::{info, instrument, warn};

/// Result of an operator adjustment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdjustmentOutcome {
    /// The recorded transaction
    pub transaction: coin_transaction::Model,
    /// Target balance after the adjustment
    pub new_balance: i64,
    /// Target user as of after the adjustment
    pub target: UserSummary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    Credit,
    Debit,
}

fn describe(description: Option<String>, fallback: &str) -> String {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

async fn adjust(
    db: &DatabaseConnection,
    config: &LedgerConfig,
    caller: Option<&Caller>,
    target_user_id: i64,
    amount: i64,
    description: Option<String>,
    direction: Direction,
) -> Result<AdjustmentOutcome> {
    let operator = require_admin(caller, "adjust coin balances")?;

    // A missing target surfaces from the balance update as `UserNotFound`
    let txn = db.begin().await?;

    let result = match direction {
        Direction::Credit => {
            ledger::post_credit(
                &txn,
                config,
                target_user_id,
                TransactionKind::Topup,
                amount,
                describe(description, "Admin credit"),
                None,
            )
            .await
        }
        Direction::Debit => {
            ledger::post_debit(
                &txn,
                config,
                target_user_id,
                TransactionKind::Deduct,
                amount,
                describe(description, "Admin deduction"),
                None,
            )
            .await
        }
    };

    let BalanceChange {
        transaction,
        new_balance,
    } = result.inspect_err(|e| {
        warn!(target_user_id, operator_id = operator.user_id, "Adjustment refused: {e}");
    })?;

    let target = require_user(&txn, target_user_id).await?;
    txn.commit().await?;

    info!(
        target_user_id,
        operator_id = operator.user_id,
        amount = transaction.amount,
        new_balance,
        "Balance adjusted by operator"
    );

    Ok(AdjustmentOutcome {
        transaction,
        new_balance,
        target: UserSummary::from(&target),
    })
}

/// Credits any account. Operators only; recorded as `topup`.
#[instrument(skip(db, config, caller, description))]
pub async fn admin_credit(
    db: &DatabaseConnection,
    config: &LedgerConfig,
    caller: Option<&Caller>,
    target_user_id: i64,
    amount: i64,
    description: Option<String>,
) -> Result<AdjustmentOutcome> {
    adjust(
        db,
        config,
        caller,
        target_user_id,
        amount,
        description,
        Direction::Credit,
    )
    .await
}

/// Debits any account. Operators only; recorded as `deduct`.
///
/// An insufficient balance fails with an error that reports the current balance.
#[instrument(skip(db, config, caller, description))]
pub async fn admin_debit(
    db: &DatabaseConnection,
    config: &LedgerConfig,
    caller: Option<&Caller>,
    target_user_id: i64,
    amount: i64,
    description: Option<String>,
) -> Result<AdjustmentOutcome> {
    adjust(
        db,
        config,
        caller,
        target_user_id,
        amount,
        description,
        Direction::Debit,
    )
    .await
}

/// Credits a reward such as order cashback, recorded as `earn`.
///
/// Called by the storefront itself rather than by a user, so there is no caller check.
#[instrument(skip(db, config, description))]
pub async fn award(
    db: &DatabaseConnection,
    config: &LedgerConfig,
    user_id: i64,
    amount: i64,
    description: &str,
    related_order_id: Option<String>,
) -> Result<BalanceChange> {
    let txn = db.begin().await?;
    let change = ledger::post_credit(
        &txn,
        config,
        user_id,
        TransactionKind::Earn,
        amount,
        describe(Some(description.to_string()), "Reward"),
        related_order_id,
    )
    .await?;
    txn.commit().await?;

    info!(user_id, amount, new_balance = change.new_balance, "Coins awarded");
    Ok(change)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::{balance::get_balance, ledger::audit_user},
        errors::Error,
        test_utils::*,
    };

    #[tokio::test]
    async fn test_admin_credit() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let admin = create_test_admin(&db, "900", "Operator").await?;

        let outcome = admin_credit(
            &db,
            &test_ledger_config(),
            Some(&Caller::from(&admin)),
            user.id,
            400,
            None,
        )
        .await?;

        assert_eq!(outcome.new_balance, 400);
        assert_eq!(outcome.transaction.kind, TransactionKind::Topup);
        assert_eq!(outcome.transaction.amount, 400);
        assert_eq!(outcome.transaction.description, "Admin credit");
        assert_eq!(outcome.target.id, user.id);
        assert_eq!(outcome.target.balance, 400);

        Ok(())
    }

    #[tokio::test]
    async fn test_admin_debit() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let admin = create_test_admin(&db, "900", "Operator").await?;
        let caller = Caller::from(&admin);
        fund_user(&db, user.id, 100).await?;

        let outcome = admin_debit(
            &db,
            &test_ledger_config(),
            Some(&caller),
            user.id,
            60,
            Some("Chargeback".to_string()),
        )
        .await?;
        assert_eq!(outcome.new_balance, 40);
        assert_eq!(outcome.transaction.kind, TransactionKind::Deduct);
        assert_eq!(outcome.transaction.amount, -60);
        assert_eq!(outcome.transaction.description, "Chargeback");

        let result = admin_debit(&db, &test_ledger_config(), Some(&caller), user.id, 41, None).await;
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientBalance {
                current: 40,
                required: 41
            }
        ));
        assert!(err.to_string().contains("40"));
        assert_eq!(get_balance(&db, user.id).await?, 40);
        assert!(audit_user(&db, user.id).await?.is_consistent());

        Ok(())
    }

    #[tokio::test]
    async fn test_adjustment_checks() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let admin = create_test_admin(&db, "900", "Operator").await?;
        let config = test_ledger_config();

        assert!(matches!(
            admin_credit(&db, &config, Some(&Caller::from(&user)), user.id, 10, None).await,
            Err(Error::Unauthorized { .. })
        ));
        assert!(matches!(
            admin_credit(&db, &config, None, user.id, 10, None).await,
            Err(Error::Unauthenticated)
        ));
        assert!(matches!(
            admin_credit(&db, &config, Some(&Caller::from(&admin)), 9999, 10, None).await,
            Err(Error::UserNotFound { id: 9999 })
        ));
        assert!(matches!(
            admin_debit(&db, &config, Some(&Caller::from(&admin)), user.id, 0, None).await,
            Err(Error::InvalidAmount { amount: 0 })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_award_records_earn() -> Result<()> {
        let (db, user) = setup_with_user().await?;

        let change = award(
            &db,
            &test_ledger_config(),
            user.id,
            25,
            "Cashback on order ORD-9",
            Some("ORD-9".to_string()),
        )
        .await?;

        assert_eq!(change.new_balance, 25);
        assert_eq!(change.transaction.kind, TransactionKind::Earn);
        assert_eq!(change.transaction.related_order_id.as_deref(), Some("ORD-9"));

        Ok(())
    }
}
