//! Scheduled promo posts.
//!
//! Rows are written here and drained by an external scheduler cron. Status
//! starts at `pending`; the scheduler owns every later transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Errors from scheduled-post operations.
#[derive(Debug, thiserror::Error)]
pub enum PostRepoError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub platform: String,
    pub caption: String,
    pub video_url: Option<String>,
    pub scheduled_for: DateTime<Utc>,
    pub status: String,
    pub account_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewPost {
    pub platform: String,
    pub caption: String,
    pub video_url: Option<String>,
    pub scheduled_for: DateTime<Utc>,
    pub account_id: Option<Uuid>,
}

/// Most recently scheduled posts first.
///
/// # Errors
///
/// Returns [`PostRepoError::Database`] on connection or query failure.
pub async fn recent(pool: &PgPool, limit: i64) -> Result<Vec<PostRow>, PostRepoError> {
    let rows = sqlx::query_as::<_, PostRow>(
        "SELECT * FROM scheduled_posts ORDER BY scheduled_for DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Queue a post as `pending`.
///
/// # Errors
///
/// Returns [`PostRepoError::Database`] on connection or query failure.
pub async fn insert(pool: &PgPool, post: &NewPost) -> Result<PostRow, PostRepoError> {
    let row = sqlx::query_as::<_, PostRow>(
        r"
        INSERT INTO scheduled_posts (platform, caption, video_url, scheduled_for, status, account_id)
        VALUES ($1, $2, $3, $4, 'pending', $5)
        RETURNING *
        ",
    )
    .bind(&post.platform)
    .bind(&post.caption)
    .bind(&post.video_url)
    .bind(post.scheduled_for)
    .bind(post.account_id)
    .fetch_one(pool)
    .await?;

    Ok(row)
}
