//! `SeaORM` entity definitions.

pub mod credit_accounts;
pub mod credit_jobs;
pub mod credit_ledger_entries;
pub mod platform_settings;
pub mod sea_orm_active_enums;
pub mod webhook_events;
