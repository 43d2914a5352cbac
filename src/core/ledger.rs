//! The transaction log.
//!
//! Records are append-only: this module inserts and reads `coin_transactions` and never
//! updates or deletes them. Each record carries `balance_after`, the owner's balance right
//! after it was applied, and a reference number of the form
//! `<prefix>-<epoch millis>-<sequence>` where the sequence is global to the log.

use crate::{
    config::LedgerConfig,
    core::{
        balance,
        pagination::{Page, Paginated},
        user::require_user,
    },
    entities::{
        CoinTransaction, SystemState, TransactionKind, coin_transaction, system_state,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};
use tracing::{info, instrument};

const REFERENCE_SEQUENCE_KEY: &str = "coin_reference_seq";

/// A transaction about to be written
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTransaction {
    /// Owner of the balance that changed
    pub user_id: i64,
    /// Kind of event
    pub kind: TransactionKind,
    /// Signed amount: positive for credits, negative for debits
    pub amount: i64,
    /// Human-readable description
    pub description: String,
    /// Owner balance immediately after the change
    pub balance_after: i64,
    /// Related storefront order, if any
    pub related_order_id: Option<String>,
}

/// A balance change together with the log record that documents it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceChange {
    /// The recorded transaction
    pub transaction: coin_transaction::Model,
    /// Balance after the change
    pub new_balance: i64,
}

/// Lifetime totals for one user
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedgerSummary {
    /// Current spendable balance
    pub current_balance: i64,
    /// Sum of all `earn` and `topup` amounts
    pub total_credited: i128,
    /// Sum of the absolute values of all `spend` and `deduct` amounts
    pub total_debited: i128,
}

/// Result of cross-checking a user's balance against their transaction log
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerAudit {
    /// Audited user
    pub user_id: i64,
    /// Balance stored on the user record
    pub balance: i64,
    /// Number of transactions in the log
    pub transaction_count: usize,
    /// Sum of all signed amounts
    pub sum_of_amounts: i128,
    /// `balance_after` of the newest transaction
    pub latest_balance_after: Option<i64>,
    /// Ids of transactions whose `balance_after` does not follow from their predecessor
    pub broken_links: Vec<i64>,
}

impl LedgerAudit {
    /// Whether the balance, the amounts and every snapshot agree.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.sum_of_amounts == i128::from(self.balance)
            && self.latest_balance_after.unwrap_or(0) == self.balance
            && self.broken_links.is_empty()
    }
}

/// Formats a reference number.
#[must_use]
pub fn format_reference(prefix: &str, epoch_millis: i64, sequence: i64) -> String {
    format!("{prefix}-{epoch_millis}-{sequence:05}")
}

/// Advances the global reference sequence and returns the new value.
async fn next_reference_sequence<C>(conn: &C) -> Result<i64>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let state = SystemState::find()
        .filter(system_state::Column::Key.eq(REFERENCE_SEQUENCE_KEY))
        .one(conn)
        .await?;

    let Some(state) = state else {
        system_state::ActiveModel {
            key: Set(REFERENCE_SEQUENCE_KEY.to_string()),
            value: Set("1".to_string()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        return Ok(1);
    };

    let current: i64 = state.value.parse().map_err(|e| Error::InvalidState {
        message: format!("Reference sequence '{}' is corrupt: {e}", state.value),
    })?;
    let next = current + 1;

    let mut active: system_state::ActiveModel = state.into();
    active.value = Set(next.to_string());
    active.updated_at = Set(now);
    active.update(conn).await?;

    Ok(next)
}

/// Appends a transaction to the log.
///
/// Run this on the same database transaction as the balance change it documents.
#[instrument(skip(conn, config, new), fields(user_id = new.user_id, kind = ?new.kind))]
pub async fn record<C>(
    conn: &C,
    config: &LedgerConfig,
    new: NewTransaction,
) -> Result<coin_transaction::Model>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let sequence = next_reference_sequence(conn).await?;
    let reference_number =
        format_reference(&config.reference_prefix, now.timestamp_millis(), sequence);

    let transaction = coin_transaction::ActiveModel {
        user_id: Set(new.user_id),
        reference_number: Set(reference_number),
        kind: Set(new.kind),
        amount: Set(new.amount),
        description: Set(new.description),
        related_order_id: Set(new.related_order_id),
        balance_after: Set(new.balance_after),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    info!(
        reference = %transaction.reference_number,
        amount = transaction.amount,
        balance_after = transaction.balance_after,
        "Recorded coin transaction"
    );
    Ok(transaction)
}

/// Credits a user and records the matching transaction.
pub(crate) async fn post_credit<C>(
    conn: &C,
    config: &LedgerConfig,
    user_id: i64,
    kind: TransactionKind,
    amount: i64,
    description: String,
    related_order_id: Option<String>,
) -> Result<BalanceChange>
where
    C: ConnectionTrait,
{
    let new_balance = balance::credit(conn, user_id, amount).await?;
    let transaction = record(
        conn,
        config,
        NewTransaction {
            user_id,
            kind,
            amount,
            description,
            balance_after: new_balance,
            related_order_id,
        },
    )
    .await?;

    Ok(BalanceChange {
        transaction,
        new_balance,
    })
}

/// Debits a user and records the matching transaction with a negative amount.
pub(crate) async fn post_debit<C>(
    conn: &C,
    config: &LedgerConfig,
    user_id: i64,
    kind: TransactionKind,
    amount: i64,
    description: String,
    related_order_id: Option<String>,
) -> Result<BalanceChange>
where
    C: ConnectionTrait,
{
    let new_balance = balance::debit(conn, user_id, amount).await?;
    let transaction = record(
        conn,
        config,
        NewTransaction {
            user_id,
            kind,
            amount: -amount,
            description,
            balance_after: new_balance,
            related_order_id,
        },
    )
    .await?;

    Ok(BalanceChange {
        transaction,
        new_balance,
    })
}

/// Retrieves one page of a user's transactions, newest first.
pub async fn get_history(
    db: &DatabaseConnection,
    user_id: i64,
    page: Page,
) -> Result<Paginated<coin_transaction::Model>> {
    let paginator = CoinTransaction::find()
        .filter(coin_transaction::Column::UserId.eq(user_id))
        .order_by_desc(coin_transaction::Column::CreatedAt)
        .order_by_desc(coin_transaction::Column::Id)
        .paginate(db, page.per_page);

    let totals = paginator.num_items_and_pages().await?;
    let items = paginator.fetch_page(page.index()).await?;
    Ok(Paginated::new(items, page, totals))
}

/// Finds a transaction by its reference number.
pub async fn get_transaction_by_reference(
    db: &DatabaseConnection,
    reference_number: &str,
) -> Result<Option<coin_transaction::Model>> {
    CoinTransaction::find()
        .filter(coin_transaction::Column::ReferenceNumber.eq(reference_number))
        .one(db)
        .await
        .map_err(Into::into)
}

/// All transactions of a user in the order they were applied.
async fn transactions_in_order(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<coin_transaction::Model>> {
    CoinTransaction::find()
        .filter(coin_transaction::Column::UserId.eq(user_id))
        .order_by_asc(coin_transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Computes the current balance and lifetime credit/debit totals of a user.
///
/// Lifetime totals can exceed the balance range, so they are summed as `i128`.
pub async fn get_summary(db: &DatabaseConnection, user_id: i64) -> Result<LedgerSummary> {
    let user = require_user(db, user_id).await?;
    let transactions = transactions_in_order(db, user_id).await?;

    let (total_credited, total_debited) =
        transactions
            .iter()
            .fold((0_i128, 0_i128), |(credited, debited), tx| {
                let amount = i128::from(tx.amount);
                if tx.kind.is_credit() {
                    (credited + amount, debited)
                } else {
                    (credited, debited + amount.abs())
                }
            });

    Ok(LedgerSummary {
        current_balance: user.balance,
        total_credited,
        total_debited,
    })
}

/// Cross-checks a user's balance against the transaction log.
pub async fn audit_user(db: &DatabaseConnection, user_id: i64) -> Result<LedgerAudit> {
    let user = require_user(db, user_id).await?;
    let transactions = transactions_in_order(db, user_id).await?;

    let mut running = 0_i128;
    let mut broken_links = Vec::new();
    for tx in &transactions {
        running += i128::from(tx.amount);
        if i128::from(tx.balance_after) != running {
            broken_links.push(tx.id);
        }
    }

    Ok(LedgerAudit {
        user_id,
        balance: user.balance,
        transaction_count: transactions.len(),
        sum_of_amounts: running,
        latest_balance_after: transactions.last().map(|tx| tx.balance_after),
        broken_links,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_format_reference() {
        assert_eq!(
            format_reference("COIN", 1_718_000_000_000, 42),
            "COIN-1718000000000-00042"
        );
        assert_eq!(format_reference("RIG", 5, 123_456), "RIG-5-123456");
    }

    #[tokio::test]
    async fn test_record_assigns_sequential_references() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let config = test_ledger_config();

        let first = post_credit(
            &db,
            &config,
            user.id,
            TransactionKind::Earn,
            10,
            "Cashback".to_string(),
            None,
        )
        .await?;
        let second = post_credit(
            &db,
            &config,
            user.id,
            TransactionKind::Earn,
            5,
            "Cashback".to_string(),
            None,
        )
        .await?;

        assert!(first.transaction.reference_number.starts_with("COIN-"));
        assert!(first.transaction.reference_number.ends_with("-00001"));
        assert!(second.transaction.reference_number.ends_with("-00002"));
        assert_eq!(second.transaction.balance_after, 15);

        let found =
            get_transaction_by_reference(&db, &second.transaction.reference_number).await?;
        assert_eq!(found, Some(second.transaction));

        Ok(())
    }

    #[tokio::test]
    async fn test_post_debit_records_negative_amount() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let config = test_ledger_config();
        fund_user(&db, user.id, 100).await?;

        let change = post_debit(
            &db,
            &config,
            user.id,
            TransactionKind::Deduct,
            40,
            "Correction".to_string(),
            None,
        )
        .await?;

        assert_eq!(change.new_balance, 60);
        assert_eq!(change.transaction.amount, -40);
        assert_eq!(change.transaction.balance_after, 60);
        assert_eq!(change.transaction.kind, TransactionKind::Deduct);

        Ok(())
    }

    #[tokio::test]
    async fn test_history_is_paginated_newest_first() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let other = create_test_user(&db, "other", "Other").await?;
        for amount in 1..=5 {
            fund_user(&db, user.id, amount).await?;
        }
        fund_user(&db, other.id, 99).await?;

        let first_page = get_history(&db, user.id, Page::new(1, 2)).await?;
        assert_eq!(first_page.total_items, 5);
        assert_eq!(first_page.total_pages, 3);
        assert!(first_page.has_next());
        assert_eq!(first_page.items.len(), 2);
        assert_eq!(first_page.items[0].amount, 5);
        assert_eq!(first_page.items[1].amount, 4);

        let last_page = get_history(&db, user.id, Page::new(3, 2)).await?;
        assert_eq!(last_page.items.len(), 1);
        assert_eq!(last_page.items[0].amount, 1);
        assert!(!last_page.has_next());

        Ok(())
    }

    #[tokio::test]
    async fn test_summary_totals() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let config = test_ledger_config();
        fund_user(&db, user.id, 300).await?;
        post_credit(
            &db,
            &config,
            user.id,
            TransactionKind::Topup,
            200,
            "Topup".to_string(),
            None,
        )
        .await?;
        post_debit(
            &db,
            &config,
            user.id,
            TransactionKind::Spend,
            120,
            "Order".to_string(),
            Some("ORD-1".to_string()),
        )
        .await?;
        post_debit(
            &db,
            &config,
            user.id,
            TransactionKind::Deduct,
            30,
            "Correction".to_string(),
            None,
        )
        .await?;

        let summary = get_summary(&db, user.id).await?;
        assert_eq!(
            summary,
            LedgerSummary {
                current_balance: 350,
                total_credited: 500,
                total_debited: 150,
            }
        );

        assert!(matches!(
            get_summary(&db, 999).await,
            Err(Error::UserNotFound { id: 999 })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_summary_totals_beyond_balance_range() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let config = test_ledger_config();

        fund_user(&db, user.id, i64::MAX).await?;
        post_debit(
            &db,
            &config,
            user.id,
            TransactionKind::Deduct,
            i64::MAX,
            "Reversal".to_string(),
            None,
        )
        .await?;
        fund_user(&db, user.id, 10).await?;

        let summary = get_summary(&db, user.id).await?;
        assert_eq!(summary.current_balance, 10);
        assert_eq!(summary.total_credited, i128::from(i64::MAX) + 10);
        assert_eq!(summary.total_debited, i128::from(i64::MAX));
        assert!(audit_user(&db, user.id).await?.is_consistent());

        Ok(())
    }

    #[tokio::test]
    async fn test_audit_detects_drift() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        fund_user(&db, user.id, 50).await?;

        let audit = audit_user(&db, user.id).await?;
        assert!(audit.is_consistent());
        assert_eq!(audit.transaction_count, 1);

        // A balance write without a matching log entry breaks the audit
        balance::credit(&db, user.id, 10).await?;
        let audit = audit_user(&db, user.id).await?;
        assert!(!audit.is_consistent());
        assert_eq!(audit.balance, 60);
        assert_eq!(audit.sum_of_amounts, 50);

        Ok(())
    }
}
