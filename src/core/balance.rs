//! The balance store.
//!
//! `users.balance` is only ever changed here, and only with a single conditional
//! `UPDATE`: `balance = balance + amount ... AND balance <= i64::MAX - amount` for credits
//! and `balance = balance - amount ... AND balance >= amount` for debits. The balance check
//! and the write are the same statement, so two concurrent debits cannot both pass the
//! check. Neither function writes a transaction record; callers pair them with
//! `core::ledger::record` inside one database transaction.
//!
//! On `SQLite` the conditional `UPDATE` should be the first statement of its database
//! transaction. A transaction that reads first holds a shared lock, and upgrading it while
//! another writer is active fails with "database is locked" instead of waiting.

use crate::{
    entities::{User, user},
    errors::{Error, Result},
};
use sea_orm::{prelude::*, sea_query::Expr};
use tracing::debug;

/// Fails with [`Error::InvalidAmount`] unless `amount` is positive.
pub fn ensure_positive(amount: i64) -> Result<()> {
    if amount > 0 {
        Ok(())
    } else {
        Err(Error::InvalidAmount { amount })
    }
}

/// Reads a user's current balance.
pub async fn get_balance<C>(conn: &C, user_id: i64) -> Result<i64>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id)
        .one(conn)
        .await?
        .map(|user| user.balance)
        .ok_or(Error::UserNotFound { id: user_id })
}

/// Adds `amount` coins to a user's balance and returns the new balance.
///
/// Fails with [`Error::Validation`] when the new balance would not fit in an `i64`.
pub async fn credit<C>(conn: &C, user_id: i64, amount: i64) -> Result<i64>
where
    C: ConnectionTrait,
{
    ensure_positive(amount)?;

    let result = User::update_many()
        .col_expr(
            user::Column::Balance,
            Expr::col(user::Column::Balance).add(amount),
        )
        .filter(user::Column::Id.eq(user_id))
        .filter(user::Column::Balance.lte(i64::MAX - amount))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        // Either the user is gone or the credit would overflow the balance
        let current = get_balance(conn, user_id).await?;
        return Err(Error::validation(format!(
            "Crediting {amount} coins would exceed the maximum balance (current balance {current})"
        )));
    }

    let new_balance = get_balance(conn, user_id).await?;
    debug!(user_id, amount, new_balance, "Credited balance");
    Ok(new_balance)
}

/// Removes `amount` coins from a user's balance and returns the new balance.
///
/// Fails with [`Error::InsufficientBalance`] when the balance is smaller than `amount`;
/// the balance is left untouched in that case.
pub async fn debit<C>(conn: &C, user_id: i64, amount: i64) -> Result<i64>
where
    C: ConnectionTrait,
{
    ensure_positive(amount)?;

    let result = User::update_many()
        .col_expr(
            user::Column::Balance,
            Expr::col(user::Column::Balance).sub(amount),
        )
        .filter(user::Column::Id.eq(user_id))
        .filter(user::Column::Balance.gte(amount))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        // Either the user is gone or the guard rejected the debit
        let current = get_balance(conn, user_id).await?;
        return Err(Error::InsufficientBalance {
            current,
            required: amount,
        });
    }

    let new_balance = get_balance(conn, user_id).await?;
    debug!(user_id, amount, new_balance, "Debited balance");
    Ok(new_balance)
}
