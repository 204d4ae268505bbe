//! HTTP handlers for the verification flow.

use std::sync::Arc;

use axum::extract::Extension;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::http::ErrorResponse;
use crate::verification::limits::client_ip;
use crate::verification::service::{SendError, VerificationService, VerifyError};

/// Request body for `/send-sms`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SendRequest {
    #[serde(default)]
    pub phone: String,
    /// Accepted for client compatibility; normalization is US-first regardless.
    #[serde(default)]
    pub country: Option<String>,
}

/// Response body for `/send-sms`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SendResponse {
    pub ok: bool,
    /// `"sent"` or `"demo"`.
    pub status: String,
    pub to: String,
    pub expires_in: u64,
    /// Plaintext code, demo mode only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo_code: Option<String>,
}

/// Request body for `/verify-sms`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyRequest {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub code: String,
}

/// Session summary returned alongside the token.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionPayload {
    pub phone: String,
    pub verified: bool,
    pub issued_at: u64,
    pub expires_in: u64,
}

/// Response body for `/verify-sms`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyResponse {
    pub ok: bool,
    pub token: String,
    pub phone: String,
    pub session: SessionPayload,
}

/// Verification routes, with legacy aliases kept for deployed clients.
pub fn router() -> Router {
    Router::new()
        .route("/send-sms", post(send_sms))
        .route("/send-code", post(send_sms))
        .route("/verify-sms", post(verify_sms))
        .route("/verify-code", post(verify_sms))
}

/// Issue a verification code over SMS
///
/// Normalizes the phone to E.164, applies per-IP and per-phone rate limits,
/// and dispatches a fresh 6-digit code. Without SMS credentials the service
/// runs in demo mode and returns the code in the response body.
#[utoipa::path(
    post,
    path = "/send-sms",
    tag = "Verification",
    request_body = SendRequest,
    responses(
        (status = 200, description = "Code issued", body = SendResponse),
        (status = 400, description = "Missing or invalid phone", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse),
        (status = 500, description = "SMS dispatch failed", body = ErrorResponse)
    )
)]
pub async fn send_sms(
    Extension(service): Extension<Arc<VerificationService>>,
    headers: HeaderMap,
    Json(req): Json<SendRequest>,
) -> Response {
    if req.phone.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Missing phone".to_string(),
            }),
        )
            .into_response();
    }

    let ip = client_ip(&headers);
    match service.send_code(&req.phone, ip.as_deref()).await {
        Ok(issued) => {
            let status = if issued.demo_code.is_some() {
                "demo"
            } else {
                "sent"
            };
            Json(SendResponse {
                ok: true,
                status: status.to_string(),
                to: issued.phone.into_string(),
                expires_in: issued.expires_in,
                demo_code: issued.demo_code,
            })
            .into_response()
        }
        Err(err) => send_error_response(&err),
    }
}

/// Verify a submitted code and issue a session token
///
/// On a match the code is consumed (single use) and the session JWT is
/// returned both in the body and as an `sf_token` cookie. Absent, expired,
/// and mismatched codes all get the same response.
#[utoipa::path(
    post,
    path = "/verify-sms",
    tag = "Verification",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Code verified, session issued", body = VerifyResponse),
        (status = 400, description = "Invalid phone, code, or expired", body = ErrorResponse),
        (status = 429, description = "Attempt cap reached", body = ErrorResponse),
        (status = 500, description = "Session signing failed", body = ErrorResponse)
    )
)]
pub async fn verify_sms(
    Extension(service): Extension<Arc<VerificationService>>,
    Json(req): Json<VerifyRequest>,
) -> Response {
    match service.verify_code(&req.phone, &req.code).await {
        Ok(session) => {
            let cookie = session_cookie(&session.token, session.expires_in);
            let body = Json(VerifyResponse {
                ok: true,
                token: session.token.clone(),
                phone: session.phone.as_str().to_string(),
                session: SessionPayload {
                    phone: session.phone.into_string(),
                    verified: true,
                    issued_at: session.issued_at,
                    expires_in: session.expires_in,
                },
            });
            ([(header::SET_COOKIE, cookie)], body).into_response()
        }
        Err(err) => verify_error_response(&err),
    }
}

fn session_cookie(token: &str, max_age: u64) -> String {
    format!("sf_token={token}; HttpOnly; SameSite=Lax; Secure; Path=/; Max-Age={max_age}")
}

fn send_error_response(err: &SendError) -> Response {
    let status = match err {
        SendError::InvalidPhone(_) => StatusCode::BAD_REQUEST,
        SendError::IpRateLimited | SendError::PhoneRateLimited => StatusCode::TOO_MANY_REQUESTS,
        SendError::Dispatch(source) => {
            tracing::error!("SMS dispatch failed: {source}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

fn verify_error_response(err: &VerifyError) -> Response {
    let status = match err {
        VerifyError::MalformedCode | VerifyError::InvalidPhone(_) | VerifyError::CodeMismatch => {
            StatusCode::BAD_REQUEST
        }
        VerifyError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
        VerifyError::Token(source) => {
            tracing::error!("Session signing failed: {source}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}
