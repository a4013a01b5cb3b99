//! Account repository for credit account lifecycle.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;

use scriva_core::credit::{CreditError, OperationReceipt};

use super::ledger::{GrantInput, grant_in_txn};
use super::{db_err, is_unique_violation};
use crate::entities::{credit_accounts, sea_orm_active_enums::EntryReason};

/// Account repository for creation and lookup.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a credit account for a user, writing the signup grant in the
    /// same transaction when one is configured.
    ///
    /// # Errors
    ///
    /// Returns [`CreditError::AccountExists`] if the user already has an
    /// account.
    pub async fn create(
        &self,
        user_id: Uuid,
        signup_grant: i64,
    ) -> Result<(credit_accounts::Model, Option<OperationReceipt>), CreditError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let now = Utc::now().into();
        let account_id = Uuid::now_v7();

        let account = credit_accounts::ActiveModel {
            id: Set(account_id),
            user_id: Set(user_id),
            promo_balance: Set(0),
            purchased_balance: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let mut account = account.insert(&txn).await.map_err(|e| {
            if is_unique_violation(&e) {
                CreditError::AccountExists(user_id)
            } else {
                db_err(e)
            }
        })?;

        let receipt = if signup_grant > 0 {
            let (entry, receipt) = grant_in_txn(
                &txn,
                &GrantInput {
                    account_id,
                    promo_amount: signup_grant,
                    purchased_amount: 0,
                    reason: EntryReason::SignupGrant,
                    description: "signup welcome credits".to_string(),
                    reference: None,
                    actor_id: None,
                    metadata: None,
                },
            )
            .await?;
            account.promo_balance = entry.promo_balance_after;
            account.updated_at = entry.created_at;
            Some(receipt)
        } else {
            None
        };

        txn.commit().await.map_err(db_err)?;
        Ok((account, receipt))
    }

    /// Finds an account by id.
    ///
    /// # Errors
    ///
    /// Returns [`CreditError::AccountNotFound`] if it does not exist.
    pub async fn find(&self, account_id: Uuid) -> Result<credit_accounts::Model, CreditError> {
        credit_accounts::Entity::find_by_id(account_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(CreditError::AccountNotFound(account_id))
    }

    /// Finds the account belonging to a user, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<credit_accounts::Model>, CreditError> {
        credit_accounts::Entity::find()
            .filter(credit_accounts::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(db_err)
    }
}
