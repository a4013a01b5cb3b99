//! Job repository: pre-charge at creation, settle exactly once.
//!
//! Settlement locks the job row before the account row, in that order
//! everywhere, so a replayed settlement either waits for the first one to
//! commit or observes `settled = true` and returns the stored result.

use chrono::Utc;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, DatabaseConnection, EntityTrait, QuerySelect, Set,
    TransactionTrait,
};
use uuid::Uuid;

use scriva_core::credit::{CreditError, OperationReceipt};
use scriva_core::settlement::{JobOutcome, PreCharge, SettlementPlan, plan_settlement};
use scriva_shared::types::CreditBalance;

use super::db_err;
use super::ledger::{
    DeductInput, EntryReference, RefundInput, deduct_in_txn, lock_account, refund_in_txn,
    zero_adjust_in_txn,
};
use crate::entities::{
    credit_jobs,
    sea_orm_active_enums::{EntryReason, JobKind, JobStatus},
};

/// Input for creating a pre-charged job.
#[derive(Debug, Clone)]
pub struct CreateJobInput {
    /// Account paying for the job.
    pub account_id: Uuid,
    /// What kind of work the job performs.
    pub kind: JobKind,
    /// Cost estimate held up front.
    pub estimated_cost: i64,
}

/// Result of a settlement call.
#[derive(Debug, Clone)]
pub struct SettlementResult {
    /// The job row after settlement.
    pub job: credit_jobs::Model,
    /// Receipt for the adjustment entry, when one was written.
    pub receipt: Option<OperationReceipt>,
    /// True when the job was already settled and nothing changed.
    pub replayed: bool,
}

/// Job repository.
#[derive(Debug, Clone)]
pub struct JobRepository {
    db: DatabaseConnection,
}

impl JobRepository {
    /// Creates a new job repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a job and holds its estimated cost in one transaction.
    ///
    /// The pre-charge is an ordinary promo-first deduction; the split it
    /// produces is stored on the job row so settlement can reverse it
    /// exactly.
    ///
    /// # Errors
    ///
    /// Returns [`CreditError::InsufficientBalance`] if the account cannot
    /// cover the estimate.
    pub async fn create_with_precharge(
        &self,
        input: CreateJobInput,
    ) -> Result<(credit_jobs::Model, OperationReceipt), CreditError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let job_id = Uuid::now_v7();

        let (entry, receipt) = deduct_in_txn(
            &txn,
            &DeductInput {
                account_id: input.account_id,
                amount: input.estimated_cost,
                reason: EntryReason::PreCharge,
                description: format!("pre-charge for {} job", input.kind.to_value()),
                reference: Some(EntryReference::job(job_id)),
                metadata: None,
            },
        )
        .await?;

        let now = Utc::now().into();
        let job = credit_jobs::ActiveModel {
            id: Set(job_id),
            account_id: Set(input.account_id),
            kind: Set(input.kind),
            status: Set(JobStatus::Pending),
            precharge_total: Set(input.estimated_cost),
            precharge_promo: Set(receipt.promo_used.unwrap_or(0)),
            precharge_purchased: Set(receipt.purchased_used.unwrap_or(0)),
            precharge_entry_id: Set(entry.id),
            settled: Set(false),
            actual_cost: Set(None),
            shortfall: Set(None),
            settlement_entry_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            settled_at: Set(None),
        };
        let job = job.insert(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok((job, receipt))
    }

    /// Settles a job against its actual outcome, exactly once.
    ///
    /// A second call for the same job is a no-op that returns the stored
    /// row with `replayed = true`.
    ///
    /// # Errors
    ///
    /// Returns [`CreditError::JobNotFound`] if the job does not exist.
    pub async fn settle(
        &self,
        job_id: Uuid,
        outcome: JobOutcome,
    ) -> Result<SettlementResult, CreditError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let job = credit_jobs::Entity::find_by_id(job_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(CreditError::JobNotFound(job_id))?;

        if job.settled {
            txn.commit().await.map_err(db_err)?;
            return Ok(SettlementResult {
                job,
                receipt: None,
                replayed: true,
            });
        }
        if job.status != JobStatus::Pending {
            return Err(CreditError::JobNotPending(job_id));
        }

        let account = lock_account(&txn, job.account_id).await?;
        let available = CreditBalance::new(account.promo_balance, account.purchased_balance);
        let pre_charge = PreCharge {
            total: job.precharge_total,
            promo: job.precharge_promo,
            purchased: job.precharge_purchased,
        };
        let plan = plan_settlement(pre_charge, outcome, available);

        let reference = EntryReference::job(job_id);
        let mut shortfall = None;
        let receipt = match plan {
            SettlementPlan::RefundPreCharge { promo, purchased } => {
                let (_, receipt) = refund_in_txn(
                    &txn,
                    &RefundInput {
                        account_id: job.account_id,
                        promo_amount: promo,
                        purchased_amount: purchased,
                        reason: EntryReason::Refund,
                        description: "pre-charge refund for failed job".to_string(),
                        reference: Some(reference),
                    },
                )
                .await?;
                Some(receipt)
            }
            SettlementPlan::NoAdjustment => None,
            SettlementPlan::CollectExtra {
                amount,
                shortfall: uncollected,
            } => {
                if uncollected > 0 {
                    shortfall = Some(uncollected);
                }
                let (_, receipt) = if amount > 0 {
                    deduct_in_txn(
                        &txn,
                        &DeductInput {
                            account_id: job.account_id,
                            amount,
                            reason: EntryReason::SettlementAdjust,
                            description: "settlement: actual cost above estimate".to_string(),
                            reference: Some(reference),
                            metadata: shortfall
                                .map(|s| serde_json::json!({ "shortfall": s })),
                        },
                    )
                    .await?
                } else {
                    // Empty account: a zero-amount entry keeps the shortfall
                    // visible in the history.
                    zero_adjust_in_txn(
                        &txn,
                        job.account_id,
                        EntryReason::SettlementAdjust,
                        "settlement: cost above estimate, balance exhausted",
                        Some(&reference),
                        shortfall.map(|s| serde_json::json!({ "shortfall": s })),
                    )
                    .await?
                };
                Some(receipt)
            }
            SettlementPlan::RefundDifference { promo, purchased } => {
                let (_, receipt) = refund_in_txn(
                    &txn,
                    &RefundInput {
                        account_id: job.account_id,
                        promo_amount: promo,
                        purchased_amount: purchased,
                        reason: EntryReason::SettlementAdjust,
                        description: "settlement: actual cost below estimate".to_string(),
                        reference: Some(reference),
                    },
                )
                .await?;
                Some(receipt)
            }
        };

        let now = Utc::now().into();
        // A failed job settles at actual cost zero.
        let (status, actual_cost) = match outcome {
            JobOutcome::Succeeded { actual_cost } => (JobStatus::Succeeded, Some(actual_cost)),
            JobOutcome::Failed => (JobStatus::Failed, Some(0)),
        };

        let mut active: credit_jobs::ActiveModel = job.into();
        active.status = Set(status);
        active.settled = Set(true);
        active.actual_cost = Set(actual_cost);
        active.shortfall = Set(shortfall);
        active.settlement_entry_id = Set(receipt.as_ref().map(|r| r.transaction_id));
        active.updated_at = Set(now);
        active.settled_at = Set(Some(now));
        let job = active.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(SettlementResult {
            job,
            receipt,
            replayed: false,
        })
    }

    /// Finds a job by id.
    ///
    /// # Errors
    ///
    /// Returns [`CreditError::JobNotFound`] if it does not exist.
    pub async fn find(&self, job_id: Uuid) -> Result<credit_jobs::Model, CreditError> {
        credit_jobs::Entity::find_by_id(job_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(CreditError::JobNotFound(job_id))
    }
}
