//! `/queue-promo`: the scheduled-post queue feeding the external scheduler.

use super::{bad_request, trimmed, unauthorized};
use crate::admin::repo::posts::{self, NewPost, PostRow};
use crate::auth::admin_authorized;
use crate::config::Config;
use crate::db::Db;
use crate::http::{database_unconfigured, internal_error};
use axum::extract::Extension;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Platforms the external scheduler can post to.
pub const QUEUE_PLATFORMS: [&str; 5] = ["tiktok", "twitter", "facebook", "instagram", "whatsapp"];

const RECENT_LIMIT: i64 = 20;

#[derive(Debug, Default, Deserialize)]
pub struct QueuePostRequest {
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default, alias = "videoUrl")]
    pub video_url: Option<String>,
    /// RFC 3339, `YYYY-MM-DDTHH:MM:SS`, or a bare date.
    #[serde(default, alias = "scheduledFor")]
    pub scheduled_for: Option<String>,
    #[serde(default, alias = "accountId")]
    pub account_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueueListResponse {
    pub success: bool,
    pub posts: Vec<PostRow>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueuedPostResponse {
    pub success: bool,
    pub post: PostRow,
}

/// The twenty most recently scheduled posts.
pub async fn list_queue(Extension(db): Extension<Db>) -> Response {
    let Some(pool) = db.pool() else {
        return database_unconfigured();
    };

    match posts::recent(pool, RECENT_LIMIT).await {
        Ok(posts) => Json(QueueListResponse {
            success: true,
            posts,
        })
        .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Listing queued posts failed");
            internal_error()
        }
    }
}

pub async fn queue_post(
    Extension(config): Extension<Arc<Config>>,
    Extension(db): Extension<Db>,
    headers: HeaderMap,
    Json(request): Json<QueuePostRequest>,
) -> Response {
    let Some(pool) = db.pool() else {
        return database_unconfigured();
    };
    if !admin_authorized(&headers, &config.admin.promo_token) {
        return unauthorized();
    }

    let platform = trimmed(request.platform.as_deref())
        .unwrap_or_else(|| "tiktok".to_string())
        .to_lowercase();
    let Some(caption) = trimmed(request.caption.as_deref()) else {
        return bad_request("caption required");
    };
    let Some(scheduled_for) = request.scheduled_for.as_deref().and_then(parse_timestamp) else {
        return bad_request("scheduled_for required (ISO string)");
    };
    if !QUEUE_PLATFORMS.contains(&platform.as_str()) {
        return bad_request("invalid platform");
    }

    let post = NewPost {
        platform,
        caption,
        video_url: trimmed(request.video_url.as_deref()),
        scheduled_for,
        account_id: request.account_id,
    };
    match posts::insert(pool, &post).await {
        Ok(row) => Json(QueuedPostResponse {
            success: true,
            post: row,
        })
        .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Queueing post failed");
            internal_error()
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })?;
    Some(naive.and_utc())
}
