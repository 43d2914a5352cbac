//! Topup request workflow.
//!
//! A user claims an external payment by submitting a request with a receipt reference.
//! The request waits in `pending` until an operator approves it (crediting the balance
//! and logging a `topup` transaction) or rejects it (no balance effect). Both outcomes
//! are final.
//!
//! The status change is a conditional update on `status = 'pending'`, done in the same
//! database transaction as the credit, so a request is credited at most once even when
//! two operators act on it at the same time.

use crate::{
    config::{LedgerConfig, PendingPolicy, TopupConfig},
    core::{
        auth::{Caller, require_admin, require_caller},
        balance::ensure_positive,
        ledger::{self, BalanceChange},
        notification::{self, NotificationPayload},
        pagination::{Page, Paginated},
        user::{UserSummary, require_user},
    },
    entities::{
        TopupRequest, TopupStatus, TransactionKind, User, coin_transaction, topup_request,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{PaginatorTrait, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait, prelude::*};
use tracing::{info, instrument, warn};

/// Input of [`submit`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitTopup {
    /// Claimed coin amount
    pub amount: i64,
    /// Reference to the uploaded receipt image
    pub receipt_image_ref: String,
    /// Name the user gave on the payment
    pub display_name: String,
    /// Optional note for the reviewer
    pub note: Option<String>,
}

/// Operator decision on a pending request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TopupAction {
    /// Credit the claimed amount
    Approve,
    /// Decline without balance effect
    Reject,
}

impl TopupAction {
    const fn resulting_status(self) -> TopupStatus {
        match self {
            Self::Approve => TopupStatus::Approved,
            Self::Reject => TopupStatus::Rejected,
        }
    }
}

/// Result of [`process`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessedTopup {
    /// The request in its final state
    pub request: topup_request::Model,
    /// The `topup` transaction, on approval
    pub transaction: Option<coin_transaction::Model>,
    /// The owner's new balance, on approval
    pub new_balance: Option<i64>,
}

/// A request together with its owner's display fields
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopupWithUser {
    /// The request
    pub request: topup_request::Model,
    /// The owner, if the account still exists
    pub user: Option<UserSummary>,
}

fn normalize_note(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

/// Checks the submitted fields and returns them trimmed.
fn validate_submission(input: SubmitTopup, config: &TopupConfig) -> Result<SubmitTopup> {
    ensure_positive(input.amount)?;

    if let Some(max) = config.max_amount.filter(|max| input.amount > *max) {
        return Err(Error::validation(format!(
            "Topup amount {} exceeds the maximum of {max}",
            input.amount
        )));
    }

    let receipt_image_ref = input.receipt_image_ref.trim().to_string();
    if receipt_image_ref.is_empty() {
        return Err(Error::validation("A receipt image is required"));
    }

    let display_name = input.display_name.trim().to_string();
    if display_name.is_empty() {
        return Err(Error::validation("Display name cannot be empty"));
    }

    Ok(SubmitTopup {
        amount: input.amount,
        receipt_image_ref,
        display_name,
        note: normalize_note(input.note),
    })
}

/// Submits a topup request for the caller and notifies operators.
#[instrument(skip(db, config, input), fields(amount = input.amount))]
pub async fn submit(
    db: &DatabaseConnection,
    config: &TopupConfig,
    caller: Option<&Caller>,
    input: SubmitTopup,
) -> Result<topup_request::Model> {
    let caller = require_caller(caller)?;
    let input = validate_submission(input, config)?;

    // The insert comes first so the write lock is taken before anything is read
    let txn = db.begin().await?;

    let request = topup_request::ActiveModel {
        user_id: Set(caller.user_id),
        submitted_display_name: Set(input.display_name),
        amount: Set(input.amount),
        receipt_image_ref: Set(input.receipt_image_ref),
        status: Set(TopupStatus::Pending),
        note: Set(input.note),
        admin_note: Set(None),
        reviewer_id: Set(None),
        reviewed_at: Set(None),
        transaction_id: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => Error::UserNotFound {
            id: caller.user_id,
        },
        _ => Error::from(e),
    })?;
    require_user(&txn, caller.user_id).await?;

    if config.pending_policy == PendingPolicy::Single {
        let pending = TopupRequest::find()
            .filter(topup_request::Column::UserId.eq(caller.user_id))
            .filter(topup_request::Column::Status.eq(TopupStatus::Pending))
            .count(&txn)
            .await?;
        // The new request counts itself
        if pending > 1 {
            warn!(
                user_id = caller.user_id,
                "Rejected topup submission: request already pending"
            );
            return Err(Error::invalid_state(
                "You already have a pending topup request; wait for it to be reviewed",
            ));
        }
    }

    notification::emit(
        &txn,
        NotificationPayload::TopupRequest {
            request_id: request.id,
            user_id: request.user_id,
            display_name: request.submitted_display_name.clone(),
            amount: request.amount,
        },
    )
    .await?;

    txn.commit().await?;

    info!(
        request_id = request.id,
        user_id = request.user_id,
        "Topup request submitted"
    );
    Ok(request)
}

/// Approves or rejects a pending topup request. Operators only.
#[instrument(skip(db, config, caller, admin_note))]
pub async fn process(
    db: &DatabaseConnection,
    config: &LedgerConfig,
    caller: Option<&Caller>,
    request_id: i64,
    action: TopupAction,
    admin_note: Option<String>,
) -> Result<ProcessedTopup> {
    let reviewer = require_admin(caller, "process topup requests")?;

    // Claiming the request is the first statement; a second reviewer waits for the
    // write lock and then finds nothing left to claim
    let txn = db.begin().await?;

    let claimed = TopupRequest::update_many()
        .set(topup_request::ActiveModel {
            status: Set(action.resulting_status()),
            admin_note: Set(normalize_note(admin_note)),
            reviewer_id: Set(Some(reviewer.user_id)),
            reviewed_at: Set(Some(Utc::now())),
            ..Default::default()
        })
        .filter(topup_request::Column::Id.eq(request_id))
        .filter(topup_request::Column::Status.eq(TopupStatus::Pending))
        .exec(&txn)
        .await?;

    let request = TopupRequest::find_by_id(request_id)
        .one(&txn)
        .await?
        .ok_or(Error::TopupRequestNotFound { id: request_id })?;

    if claimed.rows_affected == 0 {
        warn!(request_id, status = request.status.as_str(), "Topup request already processed");
        return Err(Error::invalid_state(format!(
            "Topup request #{request_id} is already {}",
            request.status.as_str()
        )));
    }

    // Dropping the transaction on error puts the request back to pending
    if action == TopupAction::Approve {
        require_user(&txn, request.user_id).await?;
    }

    let change = match action {
        TopupAction::Approve => {
            let change = ledger::post_credit(
                &txn,
                config,
                request.user_id,
                TransactionKind::Topup,
                request.amount,
                format!("Topup request #{request_id} approved by admin"),
                None,
            )
            .await?;

            TopupRequest::update_many()
                .set(topup_request::ActiveModel {
                    transaction_id: Set(Some(change.transaction.id)),
                    ..Default::default()
                })
                .filter(topup_request::Column::Id.eq(request_id))
                .exec(&txn)
                .await?;

            Some(change)
        }
        TopupAction::Reject => None,
    };

    let request = TopupRequest::find_by_id(request_id)
        .one(&txn)
        .await?
        .ok_or(Error::TopupRequestNotFound { id: request_id })?;

    txn.commit().await?;

    info!(
        request_id,
        reviewer_id = reviewer.user_id,
        status = request.status.as_str(),
        "Topup request processed"
    );

    let (transaction, new_balance) = match change {
        Some(BalanceChange {
            transaction,
            new_balance,
        }) => (Some(transaction), Some(new_balance)),
        None => (None, None),
    };

    Ok(ProcessedTopup {
        request,
        transaction,
        new_balance,
    })
}

/// Lists all topup requests, newest first, optionally filtered by status. Operators only.
pub async fn list_all(
    db: &DatabaseConnection,
    caller: Option<&Caller>,
    status: Option<TopupStatus>,
    page: Page,
) -> Result<Paginated<TopupWithUser>> {
    require_admin(caller, "list topup requests")?;

    let mut query = TopupRequest::find();
    if let Some(status) = status {
        query = query.filter(topup_request::Column::Status.eq(status));
    }

    let paginator = query
        .find_also_related(User)
        .order_by_desc(topup_request::Column::CreatedAt)
        .order_by_desc(topup_request::Column::Id)
        .paginate(db, page.per_page);

    let totals = paginator.num_items_and_pages().await?;
    let rows = paginator.fetch_page(page.index()).await?;

    Ok(Paginated::new(rows, page, totals).map(|(request, user)| TopupWithUser {
        request,
        user: user.as_ref().map(UserSummary::from),
    }))
}

/// Lists the caller's own topup requests, newest first.
pub async fn list_own(
    db: &DatabaseConnection,
    caller: Option<&Caller>,
    page: Page,
) -> Result<Paginated<topup_request::Model>> {
    let caller = require_caller(caller)?;

    let paginator = TopupRequest::find()
        .filter(topup_request::Column::UserId.eq(caller.user_id))
        .order_by_desc(topup_request::Column::CreatedAt)
        .order_by_desc(topup_request::Column::Id)
        .paginate(db, page.per_page);

    let totals = paginator.num_items_and_pages().await?;
    let items = paginator.fetch_page(page.index()).await?;
    Ok(Paginated::new(items, page, totals))
}

/// Fetches one request. Visible to its owner and to operators.
pub async fn get_request(
    db: &DatabaseConnection,
    caller: Option<&Caller>,
    request_id: i64,
) -> Result<topup_request::Model> {
    let caller = require_caller(caller)?;

    let request = TopupRequest::find_by_id(request_id)
        .one(db)
        .await?
        .ok_or(Error::TopupRequestNotFound { id: request_id })?;

    // Other users' requests look missing rather than forbidden
    if request.user_id != caller.user_id && !caller.is_admin() {
        return Err(Error::TopupRequestNotFound { id: request_id });
    }

    Ok(request)
}

/// Ids of pending requests, oldest first, for operator pickers.
pub async fn pending_request_ids(db: &DatabaseConnection, limit: u64) -> Result<Vec<i64>> {
    let requests = TopupRequest::find()
        .filter(topup_request::Column::Status.eq(TopupStatus::Pending))
        .order_by_asc(topup_request::Column::Id)
        .limit(limit)
        .all(db)
        .await?;

    Ok(requests.into_iter().map(|request| request.id).collect())
}
