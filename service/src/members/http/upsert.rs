//! `POST /members-upsert`: create or update a member keyed by phone or email.
//!
//! Callers authenticate with either a verified session token or the shared
//! admin key. The credential may arrive in the body (`tokenOrAdminKey`), the
//! `X-Admin-Key` header, or a bearer `Authorization` header.

use crate::auth::bearer_token;
use crate::config::Config;
use crate::db::Db;
use crate::http::{database_unconfigured, internal_error, ErrorResponse};
use crate::members::http::clean;
use crate::members::repo::members::{self, MemberRow, MemberUpsert};
use crate::verification::VerificationService;
use axum::extract::Extension;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct MembersUpsertRequest {
    #[serde(default, rename = "tokenOrAdminKey")]
    pub token_or_admin_key: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MembersUpsertResponse {
    pub ok: bool,
    pub member: MemberRow,
}

pub async fn members_upsert(
    Extension(config): Extension<Arc<Config>>,
    Extension(service): Extension<Arc<VerificationService>>,
    Extension(db): Extension<Db>,
    headers: HeaderMap,
    Json(request): Json<MembersUpsertRequest>,
) -> Response {
    let presented = request
        .token_or_admin_key
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .or_else(|| header_value(&headers, "x-admin-key"))
        .or_else(|| bearer_token(&headers));

    let Some(credential) = presented else {
        return unauthorized("Unauthorized: No token provided");
    };

    // The shared admin key writes as "admin"; otherwise the credential must
    // be a live session token and the write is attributed to its phone.
    let member_key = &config.admin.member_key;
    let updated_by = if !member_key.is_empty() && credential == member_key {
        "admin".to_string()
    } else {
        match service.verify_session(credential) {
            Some(claims) => claims.sub,
            None => return unauthorized("Unauthorized: Invalid or expired token"),
        }
    };

    let phone = clean(request.phone.as_deref());
    let email = clean(request.email.as_deref()).map(|e| e.to_lowercase());
    if phone.is_none() && email.is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "phone or email required".to_string(),
            }),
        )
            .into_response();
    }

    let Some(pool) = db.pool() else {
        return database_unconfigured();
    };

    let member = MemberUpsert {
        phone,
        email,
        tier: clean(request.tier.as_deref()),
        source: clean(request.source.as_deref()),
        updated_by,
    };

    match members::upsert(pool, &member).await {
        Ok(row) => Json(MembersUpsertResponse {
            ok: true,
            member: row,
        })
        .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Member upsert failed");
            internal_error()
        }
    }
}

fn header_value<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}
