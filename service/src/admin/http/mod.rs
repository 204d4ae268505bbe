//! HTTP handlers for the promo dashboard.
//!
//! Reads are open; writes check the shared promo admin token. Leaving the
//! token unset disables the guard, which is the local-development default.

pub mod accounts;
pub mod queue;
pub mod settings;

use crate::http::ErrorResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

pub fn router() -> Router {
    Router::new()
        .route(
            "/admin-settings",
            get(settings::get_settings).post(settings::update_settings),
        )
        .route(
            "/admin-accounts",
            get(accounts::list_accounts)
                .post(accounts::upsert_account)
                .delete(accounts::delete_account),
        )
        .route("/queue-promo", get(queue::list_queue).post(queue::queue_post))
}

pub(crate) fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "Unauthorized".to_string(),
        }),
    )
        .into_response()
}

pub(crate) fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Trim a field to `None` when empty or missing.
pub(crate) fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}
