//! `SeaORM` Entity for the credit_jobs table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{JobKind, JobStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "credit_jobs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub kind: JobKind,
    pub status: JobStatus,
    pub precharge_total: i64,
    pub precharge_promo: i64,
    pub precharge_purchased: i64,
    pub precharge_entry_id: Uuid,
    /// Set exactly once; replayed settlements are no-ops.
    pub settled: bool,
    pub actual_cost: Option<i64>,
    /// Overrun credits that could not be collected at settlement.
    pub shortfall: Option<i64>,
    pub settlement_entry_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub settled_at: Option<DateTimeWithTimeZone>,
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
