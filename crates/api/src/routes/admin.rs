//! Admin routes for manual credit operations and integrity audits.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use crate::routes::credit_error_response;
use scriva_db::{AccountRepository, AuditRepository, LedgerRepository};
use scriva_db::entities::sea_orm_active_enums::EntryReason;
use scriva_db::repositories::{AdminAdjustInput, GrantInput};

/// Creates the admin routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/credits/grant", post(admin_grant))
        .route("/admin/credits/adjust", post(admin_adjust))
        .route("/admin/credits/{account_id}", get(admin_balance))
        .route("/admin/credits/{account_id}/audit", get(admin_audit))
}

// ============================================================================
// Request Types
// ============================================================================

/// Request body for a manual grant.
#[derive(Debug, Deserialize)]
pub struct AdminGrantRequest {
    /// Account to credit.
    pub account_id: Uuid,
    /// Promo credit to add.
    #[serde(default)]
    pub promo_amount: i64,
    /// Purchased credit to add.
    #[serde(default)]
    pub purchased_amount: i64,
    /// Reason line recorded on the entry.
    pub description: String,
    /// Optional free-form metadata (ticket id, campaign, ...).
    pub metadata: Option<serde_json::Value>,
}

/// Request body for a manual per-tier deduction.
#[derive(Debug, Deserialize)]
pub struct AdminAdjustRequest {
    /// Account to debit.
    pub account_id: Uuid,
    /// Promo credit to remove.
    #[serde(default)]
    pub promo_deduct: i64,
    /// Purchased credit to remove.
    #[serde(default)]
    pub purchased_deduct: i64,
    /// Reason line recorded on the entry.
    pub description: String,
    /// Optional free-form metadata.
    pub metadata: Option<serde_json::Value>,
}

/// Rejects callers without the admin role.
fn require_admin(auth: &AuthUser) -> Result<(), Response> {
    if auth.is_admin() {
        Ok(())
    } else {
        Err((
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "FORBIDDEN",
                "message": "Admin role required"
            })),
        )
            .into_response())
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/admin/credits/grant` - Manually credit an account.
async fn admin_grant(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<AdminGrantRequest>,
) -> Response {
    if let Err(response) = require_admin(&auth) {
        return response;
    }

    let ledger = LedgerRepository::new((*state.db).clone());
    match ledger
        .grant(GrantInput {
            account_id: payload.account_id,
            promo_amount: payload.promo_amount,
            purchased_amount: payload.purchased_amount,
            reason: EntryReason::Promotion,
            description: payload.description,
            reference: None,
            actor_id: Some(auth.user_id()),
            metadata: payload.metadata,
        })
        .await
    {
        Ok(receipt) => {
            info!(
                account_id = %payload.account_id,
                actor_id = %auth.user_id(),
                promo = payload.promo_amount,
                purchased = payload.purchased_amount,
                "Admin grant applied"
            );
            (
                StatusCode::OK,
                Json(json!({
                    "entry_id": receipt.transaction_id,
                    "promo": receipt.promo_balance_after,
                    "purchased": receipt.purchased_balance_after,
                })),
            )
                .into_response()
        }
        Err(e) => credit_error_response(&e),
    }
}

/// POST `/admin/credits/adjust` - Manually remove credit, per tier.
async fn admin_adjust(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<AdminAdjustRequest>,
) -> Response {
    if let Err(response) = require_admin(&auth) {
        return response;
    }

    let ledger = LedgerRepository::new((*state.db).clone());
    match ledger
        .admin_adjust(AdminAdjustInput {
            account_id: payload.account_id,
            promo_deduct: payload.promo_deduct,
            purchased_deduct: payload.purchased_deduct,
            description: payload.description,
            actor_id: auth.user_id(),
            metadata: payload.metadata,
        })
        .await
    {
        Ok(receipt) => {
            info!(
                account_id = %payload.account_id,
                actor_id = %auth.user_id(),
                promo = payload.promo_deduct,
                purchased = payload.purchased_deduct,
                "Admin adjustment applied"
            );
            (
                StatusCode::OK,
                Json(json!({
                    "entry_id": receipt.transaction_id,
                    "promo": receipt.promo_balance_after,
                    "purchased": receipt.purchased_balance_after,
                })),
            )
                .into_response()
        }
        Err(e) => credit_error_response(&e),
    }
}

/// GET `/admin/credits/{account_id}` - Balances of any account.
async fn admin_balance(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<Uuid>,
) -> Response {
    if let Err(response) = require_admin(&auth) {
        return response;
    }

    let accounts = AccountRepository::new((*state.db).clone());
    match accounts.find(account_id).await {
        Ok(account) => (
            StatusCode::OK,
            Json(json!({
                "account_id": account.id,
                "user_id": account.user_id,
                "promo": account.promo_balance,
                "purchased": account.purchased_balance,
                "total": account.promo_balance + account.purchased_balance,
            })),
        )
            .into_response(),
        Err(e) => credit_error_response(&e),
    }
}

/// GET `/admin/credits/{account_id}/audit` - Replay the ledger and compare.
async fn admin_audit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<Uuid>,
) -> Response {
    if let Err(response) = require_admin(&auth) {
        return response;
    }

    let audit = AuditRepository::new((*state.db).clone());
    match audit.verify(account_id).await {
        Ok(report) => {
            if !report.is_valid {
                error!(
                    account_id = %account_id,
                    stored = ?report.stored,
                    calculated = ?report.calculated,
                    "Ledger integrity mismatch"
                );
            }
            (StatusCode::OK, Json(report)).into_response()
        }
        Err(e) => credit_error_response(&e),
    }
}
