//! `SeaORM` Entity for the credit_ledger_entries table.
//!
//! Entries are append-only. Each row carries the signed per-tier deltas and
//! the balances after the entry, so any account can be audited by replaying
//! its history.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{EntryKind, EntryReason};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "credit_ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub kind: EntryKind,
    pub reason: EntryReason,
    pub description: String,
    pub promo_delta: i64,
    pub purchased_delta: i64,
    pub promo_balance_after: i64,
    pub purchased_balance_after: i64,
    /// Domain object this entry relates to (job id, webhook event id, ...).
    pub reference_id: Option<Uuid>,
    pub reference_type: Option<String>,
    /// Admin who initiated the operation, for manual corrections.
    pub actor_id: Option<Uuid>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub metadata: Option<Json>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::credit_accounts::Entity",
        from = "Column::AccountId",
        to = "super::credit_accounts::Column::Id"
    )]
    CreditAccounts,
}

impl Related<super::credit_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreditAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
