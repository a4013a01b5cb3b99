//! Ledger repository for balance-changing operations.
//!
//! Every mutation follows the same shape: begin a transaction, lock the
//! account row with `SELECT ... FOR UPDATE`, apply the pure balance
//! transition, then write the updated account and one append-only entry
//! before committing. The row lock serializes concurrent writers per
//! account; readers are never blocked.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use scriva_core::credit::{
    AppliedOperation, CreditError, EntryKind as OpKind, OperationReceipt, apply_admin_adjust,
    apply_deduct, apply_grant, apply_refund,
};
use scriva_shared::types::{CreditBalance, PageRequest, PageResponse};

use super::db_err;
use crate::entities::{
    credit_accounts, credit_ledger_entries,
    sea_orm_active_enums::{EntryKind, EntryReason},
};

/// Maximum history page size.
const MAX_HISTORY_PER_PAGE: u32 = 100;

/// A domain object a ledger entry is written for.
#[derive(Debug, Clone)]
pub struct EntryReference {
    /// Id of the referenced object.
    pub id: Uuid,
    /// What the id points at ("job", "webhook_event", ...).
    pub kind: String,
}

impl EntryReference {
    /// Reference to a job.
    #[must_use]
    pub fn job(id: Uuid) -> Self {
        Self {
            id,
            kind: "job".to_string(),
        }
    }

    /// Reference to a webhook event.
    #[must_use]
    pub fn webhook_event(id: Uuid) -> Self {
        Self {
            id,
            kind: "webhook_event".to_string(),
        }
    }
}

/// Input for granting credit to an account.
#[derive(Debug, Clone)]
pub struct GrantInput {
    /// Account to credit.
    pub account_id: Uuid,
    /// Promo credit to add.
    pub promo_amount: i64,
    /// Purchased credit to add.
    pub purchased_amount: i64,
    /// Business reason recorded on the entry.
    pub reason: EntryReason,
    /// Human-readable line for the entry.
    pub description: String,
    /// Optional reference to the originating object.
    pub reference: Option<EntryReference>,
    /// Admin who initiated the grant, when one did.
    pub actor_id: Option<Uuid>,
    /// Optional free-form metadata.
    pub metadata: Option<serde_json::Value>,
}

/// Input for deducting credit, promo tier first.
#[derive(Debug, Clone)]
pub struct DeductInput {
    /// Account to debit.
    pub account_id: Uuid,
    /// Total credit to remove across both tiers.
    pub amount: i64,
    /// Business reason recorded on the entry.
    pub reason: EntryReason,
    /// Human-readable line for the entry.
    pub description: String,
    /// Optional reference to the originating object.
    pub reference: Option<EntryReference>,
    /// Optional free-form metadata.
    pub metadata: Option<serde_json::Value>,
}

/// Input for returning previously deducted credit.
#[derive(Debug, Clone)]
pub struct RefundInput {
    /// Account to credit.
    pub account_id: Uuid,
    /// Promo credit to restore.
    pub promo_amount: i64,
    /// Purchased credit to restore.
    pub purchased_amount: i64,
    /// Business reason recorded on the entry.
    pub reason: EntryReason,
    /// Human-readable line for the entry.
    pub description: String,
    /// Optional reference to the originating object.
    pub reference: Option<EntryReference>,
}

/// Input for an admin correction with explicit per-tier amounts.
#[derive(Debug, Clone)]
pub struct AdminAdjustInput {
    /// Account to debit.
    pub account_id: Uuid,
    /// Promo credit to remove.
    pub promo_deduct: i64,
    /// Purchased credit to remove.
    pub purchased_deduct: i64,
    /// Human-readable line for the entry.
    pub description: String,
    /// Admin who initiated the correction.
    pub actor_id: Uuid,
    /// Optional free-form metadata (audit note, ticket id, ...).
    pub metadata: Option<serde_json::Value>,
}

/// Result of a daily check-in attempt.
#[derive(Debug, Clone, Copy)]
pub struct CheckinGrant {
    /// Promo credit actually granted; zero when the cap is consumed.
    pub granted: i64,
    /// Promo balance after the attempt.
    pub promo_balance: i64,
    /// Purchased balance after the attempt.
    pub purchased_balance: i64,
    /// Entry written for the grant, when one was.
    pub entry_id: Option<Uuid>,
}

/// Ledger repository for credit operations.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Grants credit to an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the account does not exist, the amounts are
    /// invalid, or the database operation fails.
    pub async fn grant(&self, input: GrantInput) -> Result<OperationReceipt, CreditError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let (_, receipt) = grant_in_txn(&txn, &input).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(receipt)
    }

    /// Deducts credit from an account, promo tier first.
    ///
    /// # Errors
    ///
    /// Returns [`CreditError::InsufficientBalance`] if the combined balance
    /// does not cover the amount.
    pub async fn deduct(&self, input: DeductInput) -> Result<OperationReceipt, CreditError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let (_, receipt) = deduct_in_txn(&txn, &input).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(receipt)
    }

    /// Returns previously deducted credit to its original tiers.
    ///
    /// # Errors
    ///
    /// Returns an error if the account does not exist or the amounts are
    /// invalid.
    pub async fn refund(&self, input: RefundInput) -> Result<OperationReceipt, CreditError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let (_, receipt) = refund_in_txn(&txn, &input).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(receipt)
    }

    /// Applies an admin correction with explicit per-tier amounts.
    ///
    /// # Errors
    ///
    /// Returns [`CreditError::InsufficientBalance`] if either tier does not
    /// cover its requested deduction.
    pub async fn admin_adjust(
        &self,
        input: AdminAdjustInput,
    ) -> Result<OperationReceipt, CreditError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let (_, receipt) = admin_adjust_in_txn(&txn, &input).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(receipt)
    }

    /// Reads the current balance of an account.
    ///
    /// # Errors
    ///
    /// Returns [`CreditError::AccountNotFound`] if the account does not
    /// exist.
    pub async fn balance(&self, account_id: Uuid) -> Result<CreditBalance, CreditError> {
        let account = credit_accounts::Entity::find_by_id(account_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(CreditError::AccountNotFound(account_id))?;

        Ok(CreditBalance::new(
            account.promo_balance,
            account.purchased_balance,
        ))
    }

    /// Lists an account's ledger entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the account does not exist or the query fails.
    pub async fn history(
        &self,
        account_id: Uuid,
        page: PageRequest,
    ) -> Result<PageResponse<credit_ledger_entries::Model>, CreditError> {
        // Existence check so an unknown account is a 404, not an empty page.
        self.balance(account_id).await?;

        let page = page.clamped(MAX_HISTORY_PER_PAGE);

        let total = credit_ledger_entries::Entity::find()
            .filter(credit_ledger_entries::Column::AccountId.eq(account_id))
            .count(&self.db)
            .await
            .map_err(db_err)?;

        let entries = credit_ledger_entries::Entity::find()
            .filter(credit_ledger_entries::Column::AccountId.eq(account_id))
            .order_by_desc(credit_ledger_entries::Column::CreatedAt)
            .order_by_desc(credit_ledger_entries::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(PageResponse::new(entries, page.page, page.per_page, total))
    }

    /// Grants the daily check-in reward, clamped to what remains under the
    /// daily cap.
    ///
    /// The cap query and the grant run in one transaction under the account
    /// row lock, so concurrent check-ins serialize and the cap holds. A
    /// consumed cap commits nothing and reports `granted: 0`.
    ///
    /// # Errors
    ///
    /// Returns [`CreditError::AccountNotFound`] if the account does not
    /// exist.
    pub async fn checkin_grant(
        &self,
        account_id: Uuid,
        reward: i64,
        cap: i64,
        since: DateTime<Utc>,
    ) -> Result<CheckinGrant, CreditError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let account = lock_account(&txn, account_id).await?;

        let already = granted_since(&txn, account_id, EntryReason::DailyCheckin, since).await?;
        let remaining = (cap - already).max(0);
        let to_grant = reward.min(remaining);

        if to_grant == 0 {
            txn.commit().await.map_err(db_err)?;
            return Ok(CheckinGrant {
                granted: 0,
                promo_balance: account.promo_balance,
                purchased_balance: account.purchased_balance,
                entry_id: None,
            });
        }

        let balance = CreditBalance::new(account.promo_balance, account.purchased_balance);
        let applied = apply_grant(balance, to_grant, 0)?;
        let (_, receipt) = write_entry(
            &txn,
            account,
            &applied,
            EntryReason::DailyCheckin,
            "daily check-in reward",
            None,
            None,
            None,
        )
        .await?;

        txn.commit().await.map_err(db_err)?;
        Ok(CheckinGrant {
            granted: to_grant,
            promo_balance: receipt.promo_balance_after,
            purchased_balance: receipt.purchased_balance_after,
            entry_id: Some(receipt.transaction_id),
        })
    }
}

/// Sums the credit granted to an account for a reason since a point in time,
/// as one aggregate query inside the caller's transaction.
async fn granted_since(
    txn: &DatabaseTransaction,
    account_id: Uuid,
    reason: EntryReason,
    since: DateTime<Utc>,
) -> Result<i64, CreditError> {
    let granted: Option<i64> = credit_ledger_entries::Entity::find()
        .select_only()
        .column_as(
            Expr::cust("COALESCE(SUM(promo_delta + purchased_delta), 0)::BIGINT"),
            "granted",
        )
        .filter(credit_ledger_entries::Column::AccountId.eq(account_id))
        .filter(credit_ledger_entries::Column::Reason.eq(reason))
        .filter(credit_ledger_entries::Column::CreatedAt.gte(since))
        .into_tuple()
        .one(txn)
        .await
        .map_err(db_err)?;

    Ok(granted.unwrap_or(0))
}

/// Locks the account row for the rest of the transaction.
pub(crate) async fn lock_account(
    txn: &DatabaseTransaction,
    account_id: Uuid,
) -> Result<credit_accounts::Model, CreditError> {
    credit_accounts::Entity::find_by_id(account_id)
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(db_err)?
        .ok_or(CreditError::AccountNotFound(account_id))
}

pub(crate) async fn grant_in_txn(
    txn: &DatabaseTransaction,
    input: &GrantInput,
) -> Result<(credit_ledger_entries::Model, OperationReceipt), CreditError> {
    let account = lock_account(txn, input.account_id).await?;
    let balance = CreditBalance::new(account.promo_balance, account.purchased_balance);
    let applied = apply_grant(balance, input.promo_amount, input.purchased_amount)?;

    write_entry(
        txn,
        account,
        &applied,
        input.reason,
        &input.description,
        input.reference.as_ref(),
        input.actor_id,
        input.metadata.clone(),
    )
    .await
}

pub(crate) async fn deduct_in_txn(
    txn: &DatabaseTransaction,
    input: &DeductInput,
) -> Result<(credit_ledger_entries::Model, OperationReceipt), CreditError> {
    let account = lock_account(txn, input.account_id).await?;
    let balance = CreditBalance::new(account.promo_balance, account.purchased_balance);
    let applied = apply_deduct(balance, input.amount)?;

    write_entry(
        txn,
        account,
        &applied,
        input.reason,
        &input.description,
        input.reference.as_ref(),
        None,
        input.metadata.clone(),
    )
    .await
}

pub(crate) async fn refund_in_txn(
    txn: &DatabaseTransaction,
    input: &RefundInput,
) -> Result<(credit_ledger_entries::Model, OperationReceipt), CreditError> {
    let account = lock_account(txn, input.account_id).await?;
    let balance = CreditBalance::new(account.promo_balance, account.purchased_balance);
    let applied = apply_refund(balance, input.promo_amount, input.purchased_amount)?;

    write_entry(
        txn,
        account,
        &applied,
        input.reason,
        &input.description,
        input.reference.as_ref(),
        None,
        None,
    )
    .await
}

pub(crate) async fn admin_adjust_in_txn(
    txn: &DatabaseTransaction,
    input: &AdminAdjustInput,
) -> Result<(credit_ledger_entries::Model, OperationReceipt), CreditError> {
    tier_deduct_in_txn(
        txn,
        input.account_id,
        input.promo_deduct,
        input.purchased_deduct,
        EntryReason::AdminAdjust,
        &input.description,
        None,
        Some(input.actor_id),
        input.metadata.clone(),
    )
    .await
}

/// Deducts explicit per-tier amounts. Each tier must cover its own portion.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn tier_deduct_in_txn(
    txn: &DatabaseTransaction,
    account_id: Uuid,
    promo_deduct: i64,
    purchased_deduct: i64,
    reason: EntryReason,
    description: &str,
    reference: Option<&EntryReference>,
    actor_id: Option<Uuid>,
    metadata: Option<serde_json::Value>,
) -> Result<(credit_ledger_entries::Model, OperationReceipt), CreditError> {
    let account = lock_account(txn, account_id).await?;
    let balance = CreditBalance::new(account.promo_balance, account.purchased_balance);
    let applied = apply_admin_adjust(balance, promo_deduct, purchased_deduct)?;

    write_entry(
        txn,
        account,
        &applied,
        reason,
        description,
        reference,
        actor_id,
        metadata,
    )
    .await
}

/// Writes a zero-amount debit entry.
///
/// Used when an overrun settlement finds an empty account: the entry makes
/// the shortfall visible in the history without changing any balance.
pub(crate) async fn zero_adjust_in_txn(
    txn: &DatabaseTransaction,
    account_id: Uuid,
    reason: EntryReason,
    description: &str,
    reference: Option<&EntryReference>,
    metadata: Option<serde_json::Value>,
) -> Result<(credit_ledger_entries::Model, OperationReceipt), CreditError> {
    let account = lock_account(txn, account_id).await?;
    let balance = CreditBalance::new(account.promo_balance, account.purchased_balance);
    let applied = AppliedOperation::zero_debit(balance);

    write_entry(
        txn,
        account,
        &applied,
        reason,
        description,
        reference,
        None,
        metadata,
    )
    .await
}

/// Persists one applied operation: updates the account row and appends the
/// ledger entry. The caller must hold the account lock.
#[allow(clippy::too_many_arguments)]
async fn write_entry(
    txn: &DatabaseTransaction,
    account: credit_accounts::Model,
    applied: &AppliedOperation,
    reason: EntryReason,
    description: &str,
    reference: Option<&EntryReference>,
    actor_id: Option<Uuid>,
    metadata: Option<serde_json::Value>,
) -> Result<(credit_ledger_entries::Model, OperationReceipt), CreditError> {
    let now = Utc::now().into();
    let entry_id = Uuid::now_v7();
    let account_id = account.id;
    let balance_after = applied.balance_after;

    let mut active: credit_accounts::ActiveModel = account.into();
    active.promo_balance = Set(balance_after.promo);
    active.purchased_balance = Set(balance_after.purchased);
    active.updated_at = Set(now);
    active.update(txn).await.map_err(db_err)?;

    let kind = match applied.kind {
        OpKind::Credit => EntryKind::Credit,
        OpKind::Debit => EntryKind::Debit,
    };

    let entry = credit_ledger_entries::ActiveModel {
        id: Set(entry_id),
        account_id: Set(account_id),
        kind: Set(kind),
        reason: Set(reason),
        description: Set(description.to_string()),
        promo_delta: Set(applied.promo_delta),
        purchased_delta: Set(applied.purchased_delta),
        promo_balance_after: Set(balance_after.promo),
        purchased_balance_after: Set(balance_after.purchased),
        reference_id: Set(reference.map(|r| r.id)),
        reference_type: Set(reference.map(|r| r.kind.clone())),
        actor_id: Set(actor_id),
        metadata: Set(metadata),
        created_at: Set(now),
    };

    let inserted = entry.insert(txn).await.map_err(db_err)?;

    let receipt = OperationReceipt {
        transaction_id: entry_id,
        promo_balance_after: balance_after.promo,
        purchased_balance_after: balance_after.purchased,
        promo_used: applied.promo_used,
        purchased_used: applied.purchased_used,
    };

    Ok((inserted, receipt))
}
