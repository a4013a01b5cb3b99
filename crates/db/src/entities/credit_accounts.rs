//! `SeaORM` Entity for the credit_accounts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "credit_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub promo_balance: i64,
    pub purchased_balance: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::credit_ledger_entries::Entity")]
    CreditLedgerEntries,
    #[sea_orm(has_many = "super::credit_jobs::Entity")]
    CreditJobs,
}

impl Related<super::credit_ledger_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreditLedgerEntries.def()
    }
}

impl Related<super::credit_jobs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreditJobs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
