//! Shared HTTP surface: error body, CORS origin matching, security headers,
//! health endpoint, and OpenAPI documentation.

pub mod cors;
pub mod docs;
pub mod health;
pub mod security;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use cors::OriginMatcher;
pub use security::{security_headers_middleware, SecurityHeaders};

/// Error body returned by every endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// 500 for endpoints that need Postgres when no pool is configured.
#[must_use]
pub fn database_unconfigured() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Database not configured".to_string(),
        }),
    )
        .into_response()
}

/// Generic 500 body. Details go to the log, not the client.
#[must_use]
pub fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal server error".to_string(),
        }),
    )
        .into_response()
}
