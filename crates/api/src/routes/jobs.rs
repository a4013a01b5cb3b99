//! AI job routes: create with pre-charge, settle, inspect.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use sea_orm::ActiveEnum;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use crate::routes::{credit_error_response, resolve_account};
use scriva_core::credit::{CreditError, CreditPricing};
use scriva_core::settlement::JobOutcome;
use scriva_db::JobRepository;
use scriva_db::entities::{credit_jobs, sea_orm_active_enums::JobKind};
use scriva_db::repositories::CreateJobInput;

/// Creates the job routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/jobs", post(create_job))
        .route("/jobs/{job_id}", get(get_job))
        .route("/jobs/{job_id}/settle", post(settle_job))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a job.
#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    /// Job kind: "text_generation" or "image_generation".
    pub kind: String,
}

/// Request body for settling a job.
#[derive(Debug, Deserialize)]
pub struct SettleJobRequest {
    /// Whether the job completed successfully.
    pub succeeded: bool,
    /// Actual cost in credits; required when `succeeded` is true.
    pub actual_cost: Option<i64>,
}

/// Response for a job and its billing state.
#[derive(Debug, Serialize)]
pub struct JobResponse {
    /// Job ID.
    pub id: Uuid,
    /// Job kind.
    pub kind: String,
    /// Job status.
    pub status: String,
    /// Credits held up front.
    pub precharge_total: i64,
    /// Portion held from the promo tier.
    pub precharge_promo: i64,
    /// Portion held from the purchased tier.
    pub precharge_purchased: i64,
    /// True once settlement has run.
    pub settled: bool,
    /// Actual cost reported at settlement.
    pub actual_cost: Option<i64>,
    /// Overrun credits that could not be collected.
    pub shortfall: Option<i64>,
    /// Created at timestamp.
    pub created_at: String,
    /// Settled at timestamp.
    pub settled_at: Option<String>,
}

impl From<credit_jobs::Model> for JobResponse {
    fn from(job: credit_jobs::Model) -> Self {
        Self {
            id: job.id,
            kind: job.kind.to_value(),
            status: job.status.to_value(),
            precharge_total: job.precharge_total,
            precharge_promo: job.precharge_promo,
            precharge_purchased: job.precharge_purchased,
            settled: job.settled,
            actual_cost: job.actual_cost,
            shortfall: job.shortfall,
            created_at: job.created_at.to_rfc3339(),
            settled_at: job.settled_at.map(|t| t.to_rfc3339()),
        }
    }
}

fn parse_job_kind(kind: &str) -> Option<JobKind> {
    match kind {
        "text_generation" => Some(JobKind::TextGeneration),
        "image_generation" => Some(JobKind::ImageGeneration),
        _ => None,
    }
}

const fn estimated_cost(pricing: &CreditPricing, kind: JobKind) -> i64 {
    match kind {
        JobKind::TextGeneration => pricing.text_generation_cost,
        JobKind::ImageGeneration => pricing.image_generation_cost,
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/jobs` - Create a job and hold its estimated cost.
async fn create_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateJobRequest>,
) -> Response {
    let account = match resolve_account(&state, auth.user_id()).await {
        Ok(account) => account,
        Err(response) => return response,
    };

    let Some(kind) = parse_job_kind(&payload.kind) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "INVALID_JOB_KIND",
                "message": "kind must be \"text_generation\" or \"image_generation\""
            })),
        )
            .into_response();
    };

    let pricing = state.pricing().await;
    let jobs = JobRepository::new((*state.db).clone());

    match jobs
        .create_with_precharge(CreateJobInput {
            account_id: account.id,
            kind,
            estimated_cost: estimated_cost(&pricing, kind),
        })
        .await
    {
        Ok((job, receipt)) => {
            info!(job_id = %job.id, account_id = %account.id, held = job.precharge_total, "Job pre-charged");
            (
                StatusCode::CREATED,
                Json(json!({
                    "job": JobResponse::from(job),
                    "promo": receipt.promo_balance_after,
                    "purchased": receipt.purchased_balance_after,
                })),
            )
                .into_response()
        }
        Err(e) => credit_error_response(&e),
    }
}

/// GET `/jobs/{job_id}` - Job and billing state, own jobs only.
async fn get_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(job_id): Path<Uuid>,
) -> Response {
    let account = match resolve_account(&state, auth.user_id()).await {
        Ok(account) => account,
        Err(response) => return response,
    };

    let jobs = JobRepository::new((*state.db).clone());
    match jobs.find(job_id).await {
        // Another account's job is indistinguishable from a missing one.
        Ok(job) if job.account_id != account.id && !auth.is_admin() => {
            credit_error_response(&CreditError::JobNotFound(job_id))
        }
        Ok(job) => (StatusCode::OK, Json(JobResponse::from(job))).into_response(),
        Err(e) => credit_error_response(&e),
    }
}

/// POST `/jobs/{job_id}/settle` - Settle a job against its actual outcome.
///
/// Safe to retry: a replayed settlement answers with the stored result and
/// `replayed: true`.
async fn settle_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(job_id): Path<Uuid>,
    Json(payload): Json<SettleJobRequest>,
) -> Response {
    let account = match resolve_account(&state, auth.user_id()).await {
        Ok(account) => account,
        Err(response) => return response,
    };

    let outcome = if payload.succeeded {
        match payload.actual_cost {
            Some(actual_cost) if actual_cost >= 0 => JobOutcome::Succeeded { actual_cost },
            _ => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "INVALID_AMOUNT",
                        "message": "actual_cost must be a non-negative integer for a succeeded job"
                    })),
                )
                    .into_response();
            }
        }
    } else {
        JobOutcome::Failed
    };

    let jobs = JobRepository::new((*state.db).clone());

    // Ownership check before any settlement work.
    match jobs.find(job_id).await {
        Ok(job) if job.account_id != account.id && !auth.is_admin() => {
            return credit_error_response(&CreditError::JobNotFound(job_id));
        }
        Ok(_) => {}
        Err(e) => return credit_error_response(&e),
    }

    match jobs.settle(job_id, outcome).await {
        Ok(result) => {
            if !result.replayed {
                info!(
                    job_id = %job_id,
                    status = %result.job.status.to_value(),
                    shortfall = ?result.job.shortfall,
                    "Job settled"
                );
            }
            (
                StatusCode::OK,
                Json(json!({
                    "job": JobResponse::from(result.job),
                    "replayed": result.replayed,
                })),
            )
                .into_response()
        }
        Err(e) => credit_error_response(&e),
    }
}
