//! Repository abstractions for data access.
//!
//! Each repository owns a [`sea_orm::DatabaseConnection`] clone and exposes
//! async methods for a single aggregate. Balance-changing methods run in one
//! database transaction and take the account row lock first.

pub mod account;
pub mod audit;
pub mod job;
pub mod ledger;
pub mod settings;
pub mod webhook_event;

pub use account::AccountRepository;
pub use audit::AuditRepository;
pub use job::{CreateJobInput, JobRepository, SettlementResult};
pub use ledger::{
    AdminAdjustInput, CheckinGrant, DeductInput, EntryReference, GrantInput, LedgerRepository,
    RefundInput,
};
pub use settings::SettingsRepository;
pub use webhook_event::{WebhookEventRepository, WebhookRecordError};

use scriva_core::credit::CreditError;
use sea_orm::{DbErr, SqlErr};

/// Maps a database error into the credit error space.
///
/// `CreditError` lives in a crate with no database dependency, so the
/// conversion is by message rather than `From`.
pub(crate) fn db_err(e: DbErr) -> CreditError {
    CreditError::Database(e.to_string())
}

/// True when the error is a unique constraint violation.
pub(crate) fn is_unique_violation(e: &DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
