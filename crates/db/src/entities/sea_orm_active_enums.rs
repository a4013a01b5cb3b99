//! Postgres enum types shared across entities.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "entry_kind")]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Credits added to the account.
    #[sea_orm(string_value = "credit")]
    Credit,
    /// Credits removed from the account.
    #[sea_orm(string_value = "debit")]
    Debit,
}

/// Business reason attached to every ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "entry_reason")]
#[serde(rename_all = "snake_case")]
pub enum EntryReason {
    /// Promo credit granted at account creation.
    #[sea_orm(string_value = "signup_grant")]
    SignupGrant,
    /// Purchased credit granted by a verified payment.
    #[sea_orm(string_value = "purchase")]
    Purchase,
    /// Promo credit granted by the daily check-in.
    #[sea_orm(string_value = "daily_checkin")]
    DailyCheckin,
    /// Promo credit granted by an admin promotion.
    #[sea_orm(string_value = "promotion")]
    Promotion,
    /// Estimate held when a job is created.
    #[sea_orm(string_value = "pre_charge")]
    PreCharge,
    /// Adjustment written at job settlement.
    #[sea_orm(string_value = "settlement_adjust")]
    SettlementAdjust,
    /// Credit returned to the account.
    #[sea_orm(string_value = "refund")]
    Refund,
    /// Manual correction by an admin.
    #[sea_orm(string_value = "admin_adjust")]
    AdminAdjust,
}

/// What kind of work a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "job_kind")]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Text generation job.
    #[sea_orm(string_value = "text_generation")]
    TextGeneration,
    /// Image generation job.
    #[sea_orm(string_value = "image_generation")]
    ImageGeneration,
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "job_status")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Created and pre-charged, awaiting settlement.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Settled with a successful outcome.
    #[sea_orm(string_value = "succeeded")]
    Succeeded,
    /// Settled with a failed outcome.
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// How an inbound webhook event was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "webhook_outcome")]
#[serde(rename_all = "lowercase")]
pub enum WebhookOutcome {
    /// The event changed a balance.
    #[sea_orm(string_value = "applied")]
    Applied,
    /// The event was recorded but changed nothing.
    #[sea_orm(string_value = "skipped")]
    Skipped,
    /// Processing failed after the event was accepted.
    #[sea_orm(string_value = "error")]
    Error,
}
