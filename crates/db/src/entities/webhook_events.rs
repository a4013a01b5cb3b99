//! `SeaORM` Entity for the webhook_events table.
//!
//! The idempotency record for provider events. The unique index on
//! `(event_type, provider_event_id)` is what makes replayed deliveries
//! harmless.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::WebhookOutcome;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "webhook_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub event_type: String,
    pub provider_event_id: String,
    /// Account the event targeted, when it named a resolvable one.
    pub account_id: Option<Uuid>,
    pub outcome: WebhookOutcome,
    pub detail: Option<String>,
    /// Ledger entry written for this event, when one was.
    pub applied_entry_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
