//! `/admin-settings`: key/value storage for dashboard preferences.

use super::{bad_request, unauthorized};
use crate::admin::repo::settings;
use crate::auth::admin_authorized;
use crate::config::Config;
use crate::db::Db;
use crate::http::{database_unconfigured, internal_error};
use axum::extract::Extension;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
pub struct SettingsResponse {
    pub success: bool,
    pub settings: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SettingsUpdatedResponse {
    pub success: bool,
    pub updated: u64,
}

/// All settings folded into one object. Open to anyone; the dashboard reads
/// these before login.
pub async fn get_settings(Extension(db): Extension<Db>) -> Response {
    let Some(pool) = db.pool() else {
        return database_unconfigured();
    };

    match settings::list(pool).await {
        Ok(rows) => {
            let settings = rows.into_iter().map(|row| (row.key, row.value)).collect();
            Json(SettingsResponse {
                success: true,
                settings,
            })
            .into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "Listing settings failed");
            internal_error()
        }
    }
}

/// Upsert every key/value pair of the JSON object body.
pub async fn update_settings(
    Extension(config): Extension<Arc<Config>>,
    Extension(db): Extension<Db>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let Some(pool) = db.pool() else {
        return database_unconfigured();
    };
    if !admin_authorized(&headers, &config.admin.promo_token) {
        return unauthorized();
    }
    let Value::Object(entries) = body else {
        return bad_request("Invalid payload");
    };

    let entries: Vec<(String, Value)> = entries.into_iter().collect();
    match settings::upsert_many(pool, &entries).await {
        Ok(updated) => Json(SettingsUpdatedResponse {
            success: true,
            updated,
        })
        .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Updating settings failed");
            internal_error()
        }
    }
}
