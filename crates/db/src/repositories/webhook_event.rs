//! Webhook event repository: exactly-once application of provider events.
//!
//! Each event is claimed by inserting a row keyed on
//! `(event_type, provider_event_id)` in the same transaction as the balance
//! change. A replayed delivery violates the unique constraint, the whole
//! transaction rolls back, and the balance change never lands twice.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use thiserror::Error;
use uuid::Uuid;

use scriva_core::credit::CreditError;

use super::ledger::{EntryReference, GrantInput, grant_in_txn, lock_account, tier_deduct_in_txn};
use super::{db_err, is_unique_violation};
use crate::entities::{
    sea_orm_active_enums::{EntryReason, WebhookOutcome},
    webhook_events,
};

/// Errors from recording a webhook event.
#[derive(Debug, Error)]
pub enum WebhookRecordError {
    /// This event was already processed; the delivery is a replay.
    #[error("webhook event already processed")]
    Duplicate,

    /// The balance change failed.
    #[error(transparent)]
    Credit(#[from] CreditError),
}

/// Webhook event repository.
#[derive(Debug, Clone)]
pub struct WebhookEventRepository {
    db: DatabaseConnection,
}

impl WebhookEventRepository {
    /// Creates a new webhook event repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds the record for an event, if it was already processed.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find(
        &self,
        event_type: &str,
        provider_event_id: &str,
    ) -> Result<Option<webhook_events::Model>, CreditError> {
        webhook_events::Entity::find()
            .filter(webhook_events::Column::EventType.eq(event_type))
            .filter(webhook_events::Column::ProviderEventId.eq(provider_event_id))
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    /// Applies a verified `payment.completed` event: grants purchased
    /// credit and records the event in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookRecordError::Duplicate`] on a replayed delivery.
    pub async fn apply_purchase(
        &self,
        event_type: &str,
        provider_event_id: &str,
        account_id: Uuid,
        credit_amount: i64,
        order_id: &str,
    ) -> Result<webhook_events::Model, WebhookRecordError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let record_id = Uuid::now_v7();

        let (entry, _) = grant_in_txn(
            &txn,
            &GrantInput {
                account_id,
                promo_amount: 0,
                purchased_amount: credit_amount,
                reason: EntryReason::Purchase,
                description: format!("credit purchase, order {order_id}"),
                reference: Some(EntryReference::webhook_event(record_id)),
                actor_id: None,
                metadata: Some(serde_json::json!({ "order_id": order_id })),
            },
        )
        .await?;

        let record = insert_record(
            &txn,
            record_id,
            event_type,
            provider_event_id,
            Some(account_id),
            WebhookOutcome::Applied,
            None,
            Some(entry.id),
        )
        .await?;

        txn.commit().await.map_err(db_err)?;
        Ok(record)
    }

    /// Applies a verified `payment.refunded` event: reclaims purchased
    /// credit, clamped to what the account still holds.
    ///
    /// A clamp below the refunded amount is recorded in the event detail; a
    /// clamp to zero records the event as skipped with no ledger entry.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookRecordError::Duplicate`] on a replayed delivery.
    pub async fn apply_refund(
        &self,
        event_type: &str,
        provider_event_id: &str,
        account_id: Uuid,
        credit_amount: i64,
        order_id: &str,
    ) -> Result<webhook_events::Model, WebhookRecordError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let record_id = Uuid::now_v7();

        let account = lock_account(&txn, account_id).await?;
        let reclaim = credit_amount.min(account.purchased_balance);

        let record = if reclaim > 0 {
            let (entry, _) = tier_deduct_in_txn(
                &txn,
                account_id,
                0,
                reclaim,
                EntryReason::Refund,
                &format!("purchase refund, order {order_id}"),
                Some(&EntryReference::webhook_event(record_id)),
                None,
                Some(serde_json::json!({ "order_id": order_id })),
            )
            .await?;

            let detail = (reclaim < credit_amount)
                .then(|| format!("reclaimed {reclaim} of {credit_amount} credits"));
            insert_record(
                &txn,
                record_id,
                event_type,
                provider_event_id,
                Some(account_id),
                WebhookOutcome::Applied,
                detail,
                Some(entry.id),
            )
            .await?
        } else {
            insert_record(
                &txn,
                record_id,
                event_type,
                provider_event_id,
                Some(account_id),
                WebhookOutcome::Skipped,
                Some("no purchased balance to reclaim".to_string()),
                None,
            )
            .await?
        };

        txn.commit().await.map_err(db_err)?;
        Ok(record)
    }

    /// Records an event that was acknowledged without a balance change.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookRecordError::Duplicate`] on a replayed delivery.
    pub async fn record_skipped(
        &self,
        event_type: &str,
        provider_event_id: &str,
        account_id: Option<Uuid>,
        detail: &str,
    ) -> Result<webhook_events::Model, WebhookRecordError> {
        self.record_without_entry(
            event_type,
            provider_event_id,
            account_id,
            WebhookOutcome::Skipped,
            detail,
        )
        .await
    }

    /// Records an event that failed after acceptance, so replays stop
    /// retrying it.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookRecordError::Duplicate`] on a replayed delivery.
    pub async fn record_error(
        &self,
        event_type: &str,
        provider_event_id: &str,
        account_id: Option<Uuid>,
        detail: &str,
    ) -> Result<webhook_events::Model, WebhookRecordError> {
        self.record_without_entry(
            event_type,
            provider_event_id,
            account_id,
            WebhookOutcome::Error,
            detail,
        )
        .await
    }

    async fn record_without_entry(
        &self,
        event_type: &str,
        provider_event_id: &str,
        account_id: Option<Uuid>,
        outcome: WebhookOutcome,
        detail: &str,
    ) -> Result<webhook_events::Model, WebhookRecordError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let record = insert_record(
            &txn,
            Uuid::now_v7(),
            event_type,
            provider_event_id,
            account_id,
            outcome,
            Some(detail.to_string()),
            None,
        )
        .await?;
        txn.commit().await.map_err(db_err)?;
        Ok(record)
    }
}

#[allow(clippy::too_many_arguments)]
async fn insert_record(
    txn: &DatabaseTransaction,
    record_id: Uuid,
    event_type: &str,
    provider_event_id: &str,
    account_id: Option<Uuid>,
    outcome: WebhookOutcome,
    detail: Option<String>,
    applied_entry_id: Option<Uuid>,
) -> Result<webhook_events::Model, WebhookRecordError> {
    let record = webhook_events::ActiveModel {
        id: Set(record_id),
        event_type: Set(event_type.to_string()),
        provider_event_id: Set(provider_event_id.to_string()),
        account_id: Set(account_id),
        outcome: Set(outcome),
        detail: Set(detail),
        applied_entry_id: Set(applied_entry_id),
        created_at: Set(Utc::now().into()),
    };

    record.insert(txn).await.map_err(|e| {
        if is_unique_violation(&e) {
            WebhookRecordError::Duplicate
        } else {
            WebhookRecordError::Credit(db_err(e))
        }
    })
}
