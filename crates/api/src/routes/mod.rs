//! API route definitions.

use axum::{Json, Router, http::StatusCode, middleware, response::IntoResponse, response::Response};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::{AppState, middleware::auth::auth_middleware};
use scriva_core::credit::CreditError;
use scriva_db::AccountRepository;
use scriva_db::entities::credit_accounts;

pub mod admin;
pub mod credits;
pub mod health;
pub mod jobs;
pub mod webhooks;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(credits::routes())
        .merge(jobs::routes())
        .merge(admin::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine public and protected routes
    Router::new()
        .merge(health::routes())
        .merge(webhooks::routes())
        .merge(protected_routes)
}

/// Maps a credit error onto its HTTP response.
///
/// Domain errors carry their own status and stable code; server-side failures
/// are logged and answered with a generic message.
pub(crate) fn credit_error_response(e: &CreditError) -> Response {
    let status = StatusCode::from_u16(e.http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if status.is_server_error() {
        error!(error = %e, "Credit operation failed");
        return (
            status,
            Json(json!({
                "error": e.error_code(),
                "message": "An error occurred"
            })),
        )
            .into_response();
    }

    (
        status,
        Json(json!({
            "error": e.error_code(),
            "message": e.to_string()
        })),
    )
        .into_response()
}

/// Looks up the caller's credit account, answering 404 when none exists.
pub(crate) async fn resolve_account(
    state: &AppState,
    user_id: Uuid,
) -> Result<credit_accounts::Model, Response> {
    match AccountRepository::new((*state.db).clone())
        .find_by_user(user_id)
        .await
    {
        Ok(Some(account)) => Ok(account),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "ACCOUNT_NOT_FOUND",
                "message": "No credit account for this user"
            })),
        )
            .into_response()),
        Err(e) => Err(credit_error_response(&e)),
    }
}
