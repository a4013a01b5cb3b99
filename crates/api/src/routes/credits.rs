//! Credit balance, history, and daily check-in routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{NaiveTime, Utc};
use sea_orm::ActiveEnum;
use serde::Serialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use crate::routes::{credit_error_response, resolve_account};
use scriva_db::LedgerRepository;
use scriva_db::entities::credit_ledger_entries;
use scriva_shared::types::{PageRequest, PageResponse};

/// Creates the credit routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/credits/balance", get(get_balance))
        .route("/credits/history", get(get_history))
        .route("/credits/checkin", post(daily_checkin))
}

// ============================================================================
// Response Types
// ============================================================================

/// One ledger entry in a history page.
#[derive(Debug, Serialize)]
pub struct EntryResponse {
    /// Entry ID.
    pub id: Uuid,
    /// "credit" or "debit".
    pub kind: String,
    /// Business reason for the entry.
    pub reason: String,
    /// Human-readable line.
    pub description: String,
    /// Signed promo tier change.
    pub promo_delta: i64,
    /// Signed purchased tier change.
    pub purchased_delta: i64,
    /// Promo balance after the entry.
    pub promo_balance_after: i64,
    /// Purchased balance after the entry.
    pub purchased_balance_after: i64,
    /// Referenced object id (job, webhook event), if any.
    pub reference_id: Option<Uuid>,
    /// What the reference points at.
    pub reference_type: Option<String>,
    /// Entry timestamp.
    pub created_at: String,
}

impl From<credit_ledger_entries::Model> for EntryResponse {
    fn from(entry: credit_ledger_entries::Model) -> Self {
        Self {
            id: entry.id,
            kind: entry.kind.to_value(),
            reason: entry.reason.to_value(),
            description: entry.description,
            promo_delta: entry.promo_delta,
            purchased_delta: entry.purchased_delta,
            promo_balance_after: entry.promo_balance_after,
            purchased_balance_after: entry.purchased_balance_after,
            reference_id: entry.reference_id,
            reference_type: entry.reference_type,
            created_at: entry.created_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/credits/balance` - The caller's two-tier balance.
async fn get_balance(State(state): State<AppState>, auth: AuthUser) -> Response {
    let account = match resolve_account(&state, auth.user_id()).await {
        Ok(account) => account,
        Err(response) => return response,
    };

    (
        StatusCode::OK,
        Json(json!({
            "account_id": account.id,
            "promo": account.promo_balance,
            "purchased": account.purchased_balance,
            "total": account.promo_balance + account.purchased_balance,
        })),
    )
        .into_response()
}

/// GET `/credits/history` - The caller's ledger entries, newest first.
async fn get_history(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
) -> Response {
    let account = match resolve_account(&state, auth.user_id()).await {
        Ok(account) => account,
        Err(response) => return response,
    };

    let ledger = LedgerRepository::new((*state.db).clone());
    match ledger.history(account.id, page).await {
        Ok(entries) => {
            let response = PageResponse {
                data: entries
                    .data
                    .into_iter()
                    .map(EntryResponse::from)
                    .collect::<Vec<_>>(),
                meta: entries.meta,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => credit_error_response(&e),
    }
}

/// POST `/credits/checkin` - Daily check-in reward, capped per UTC day.
///
/// The reward is clamped to what remains under the daily cap; a consumed cap
/// answers `granted: 0` without writing anything. The cap check and the
/// grant run under one account row lock, so concurrent check-ins cannot
/// overshoot the cap.
async fn daily_checkin(State(state): State<AppState>, auth: AuthUser) -> Response {
    let account = match resolve_account(&state, auth.user_id()).await {
        Ok(account) => account,
        Err(response) => return response,
    };

    let pricing = state.pricing().await;
    let today_start = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();

    let ledger = LedgerRepository::new((*state.db).clone());
    match ledger
        .checkin_grant(
            account.id,
            pricing.daily_checkin_reward,
            pricing.daily_checkin_cap,
            today_start,
        )
        .await
    {
        Ok(result) => {
            if result.granted > 0 {
                info!(account_id = %account.id, granted = result.granted, "Daily check-in granted");
            }
            (
                StatusCode::OK,
                Json(json!({
                    "granted": result.granted,
                    "promo": result.promo_balance,
                    "purchased": result.purchased_balance,
                    "entry_id": result.entry_id,
                })),
            )
                .into_response()
        }
        Err(e) => credit_error_response(&e),
    }
}
