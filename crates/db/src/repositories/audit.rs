//! Integrity auditor: replays ledger histories against stored balances.

use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use scriva_core::audit::{IntegrityReport, LedgerSum};
use scriva_core::credit::CreditError;
use scriva_shared::types::CreditBalance;

use super::db_err;
use crate::entities::{credit_accounts, credit_ledger_entries};

/// Entries fetched per batch while replaying a history.
const AUDIT_BATCH_SIZE: u64 = 500;

/// Audit repository.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    db: DatabaseConnection,
}

impl AuditRepository {
    /// Creates a new audit repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Replays one account's ledger and compares it to the stored balance.
    ///
    /// The scan is keyset-paginated on `(created_at, id)` so an arbitrarily
    /// long history is processed in constant memory. Entries committed
    /// after the stored balance is read can make a healthy account look
    /// briefly ahead of its replay; callers treat reports as advisory.
    ///
    /// # Errors
    ///
    /// Returns [`CreditError::AccountNotFound`] if the account does not
    /// exist.
    pub async fn verify(&self, account_id: Uuid) -> Result<IntegrityReport, CreditError> {
        let account = credit_accounts::Entity::find_by_id(account_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(CreditError::AccountNotFound(account_id))?;
        let stored = CreditBalance::new(account.promo_balance, account.purchased_balance);

        let mut sum = LedgerSum::default();
        let mut cursor: Option<(sea_orm::prelude::DateTimeWithTimeZone, Uuid)> = None;

        loop {
            let mut query = credit_ledger_entries::Entity::find()
                .filter(credit_ledger_entries::Column::AccountId.eq(account_id))
                .order_by_asc(credit_ledger_entries::Column::CreatedAt)
                .order_by_asc(credit_ledger_entries::Column::Id)
                .limit(AUDIT_BATCH_SIZE);

            if let Some((created_at, id)) = cursor {
                query = query.filter(
                    Condition::any()
                        .add(credit_ledger_entries::Column::CreatedAt.gt(created_at))
                        .add(
                            Condition::all()
                                .add(credit_ledger_entries::Column::CreatedAt.eq(created_at))
                                .add(credit_ledger_entries::Column::Id.gt(id)),
                        ),
                );
            }

            let batch = query.all(&self.db).await.map_err(db_err)?;
            let Some(last) = batch.last() else {
                break;
            };
            cursor = Some((last.created_at, last.id));

            let batch_len = batch.len() as u64;
            for entry in batch {
                sum.add(entry.promo_delta, entry.purchased_delta);
            }
            if batch_len < AUDIT_BATCH_SIZE {
                break;
            }
        }

        Ok(IntegrityReport::compare(account_id, stored, &sum))
    }
}
