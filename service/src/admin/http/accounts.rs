//! `/admin-accounts`: per-platform posting credentials.

use super::{bad_request, trimmed, unauthorized};
use crate::admin::repo::accounts::{self, AccountRow, AccountWrite};
use crate::auth::admin_authorized;
use crate::config::Config;
use crate::db::Db;
use crate::http::{database_unconfigured, internal_error};
use axum::extract::{Extension, Query};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct AccountsQuery {
    pub platform: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AccountUpsertRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub credentials: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AccountDeleteRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccountsListResponse {
    pub success: bool,
    pub accounts: Vec<AccountRow>,
}

/// `account` is absent when an update matched nothing.
#[derive(Debug, Serialize)]
pub struct AccountUpsertResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountRow>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

pub async fn list_accounts(
    Extension(db): Extension<Db>,
    Query(query): Query<AccountsQuery>,
) -> Response {
    let Some(pool) = db.pool() else {
        return database_unconfigured();
    };

    let platform = trimmed(query.platform.as_deref());
    match accounts::list(pool, platform.as_deref()).await {
        Ok(accounts) => Json(AccountsListResponse {
            success: true,
            accounts,
        })
        .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Listing accounts failed");
            internal_error()
        }
    }
}

/// Insert, or overwrite when `id` is given.
pub async fn upsert_account(
    Extension(config): Extension<Arc<Config>>,
    Extension(db): Extension<Db>,
    headers: HeaderMap,
    Json(request): Json<AccountUpsertRequest>,
) -> Response {
    let Some(pool) = db.pool() else {
        return database_unconfigured();
    };
    if !admin_authorized(&headers, &config.admin.promo_token) {
        return unauthorized();
    }

    let platform = trimmed(request.platform.as_deref());
    let label = trimmed(request.label.as_deref());
    let credentials = request.credentials.filter(|c| !c.is_null());
    let (Some(platform), Some(label), Some(credentials)) = (platform, label, credentials) else {
        return bad_request("platform, label, credentials required");
    };

    let write = AccountWrite {
        platform,
        label,
        credentials,
        is_active: request.is_active.unwrap_or(true),
    };

    let result = match request.id {
        Some(id) => accounts::update(pool, id, &write).await,
        None => accounts::insert(pool, &write).await.map(Some),
    };
    match result {
        Ok(account) => Json(AccountUpsertResponse {
            success: true,
            account,
        })
        .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Account upsert failed");
            internal_error()
        }
    }
}

pub async fn delete_account(
    Extension(config): Extension<Arc<Config>>,
    Extension(db): Extension<Db>,
    headers: HeaderMap,
    Json(request): Json<AccountDeleteRequest>,
) -> Response {
    let Some(pool) = db.pool() else {
        return database_unconfigured();
    };
    if !admin_authorized(&headers, &config.admin.promo_token) {
        return unauthorized();
    }
    let Some(id) = request.id else {
        return bad_request("id required");
    };

    match accounts::delete(pool, id).await {
        Ok(_) => Json(SuccessResponse { success: true }).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Account delete failed");
            internal_error()
        }
    }
}
