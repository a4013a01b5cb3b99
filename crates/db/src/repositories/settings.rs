//! Platform settings repository.
//!
//! Settings are JSON documents keyed by name. Pricing is the only document
//! the credit system reads today.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

use scriva_core::credit::{CreditError, CreditPricing};

use super::db_err;
use crate::entities::platform_settings;

const PRICING_KEY: &str = "credit_pricing";

/// Settings repository.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    db: DatabaseConnection,
}

impl SettingsRepository {
    /// Creates a new settings repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Loads the stored pricing document, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`CreditError::Internal`] if the stored document does not
    /// parse.
    pub async fn credit_pricing(&self) -> Result<Option<CreditPricing>, CreditError> {
        let row = platform_settings::Entity::find_by_id(PRICING_KEY)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        row.map(|r| {
            serde_json::from_value(r.value)
                .map_err(|e| CreditError::Internal(format!("invalid pricing document: {e}")))
        })
        .transpose()
    }

    /// Stores the pricing document, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn set_credit_pricing(&self, pricing: &CreditPricing) -> Result<(), CreditError> {
        let value = serde_json::to_value(pricing)
            .map_err(|e| CreditError::Internal(format!("pricing serialization: {e}")))?;
        let now = Utc::now().into();

        let existing = platform_settings::Entity::find_by_id(PRICING_KEY)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        if let Some(row) = existing {
            let mut active: platform_settings::ActiveModel = row.into();
            active.value = Set(value);
            active.updated_at = Set(now);
            active.update(&self.db).await.map_err(db_err)?;
        } else {
            platform_settings::ActiveModel {
                key: Set(PRICING_KEY.to_string()),
                value: Set(value),
                updated_at: Set(now),
            }
            .insert(&self.db)
            .await
            .map_err(db_err)?;
        }

        Ok(())
    }
}
