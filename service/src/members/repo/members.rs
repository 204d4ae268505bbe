//! Member repository: one row per person, keyed by phone or email.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

/// Errors from member operations.
#[derive(Debug, thiserror::Error)]
pub enum MemberRepoError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct MemberRow {
    pub id: Uuid,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub tier: String,
    pub last_source: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for an upsert. `None` leaves the stored value untouched.
#[derive(Debug, Default)]
pub struct MemberUpsert {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub tier: Option<String>,
    pub source: Option<String>,
    pub updated_by: String,
}

/// Upsert keyed by phone when present, email otherwise. Omitted fields keep
/// their stored values; `tier` defaults to `"free"` on first insert.
///
/// # Errors
///
/// Returns [`MemberRepoError::Database`] on connection or query failure.
pub async fn upsert(pool: &PgPool, member: &MemberUpsert) -> Result<MemberRow, MemberRepoError> {
    let sql = if member.phone.is_some() {
        r"
        INSERT INTO members (phone, email, tier, last_source, updated_by)
        VALUES ($1, $2, COALESCE($3, 'free'), $4, $5)
        ON CONFLICT (phone) DO UPDATE SET
            email = COALESCE(EXCLUDED.email, members.email),
            tier = COALESCE($3, members.tier),
            last_source = COALESCE(EXCLUDED.last_source, members.last_source),
            updated_by = EXCLUDED.updated_by,
            updated_at = now()
        RETURNING id, phone, email, tier, last_source, updated_by, created_at, updated_at
        "
    } else {
        r"
        INSERT INTO members (phone, email, tier, last_source, updated_by)
        VALUES ($1, $2, COALESCE($3, 'free'), $4, $5)
        ON CONFLICT (email) DO UPDATE SET
            phone = COALESCE(EXCLUDED.phone, members.phone),
            tier = COALESCE($3, members.tier),
            last_source = COALESCE(EXCLUDED.last_source, members.last_source),
            updated_by = EXCLUDED.updated_by,
            updated_at = now()
        RETURNING id, phone, email, tier, last_source, updated_by, created_at, updated_at
        "
    };

    let row = sqlx::query_as::<_, MemberRow>(sql)
        .bind(&member.phone)
        .bind(&member.email)
        .bind(&member.tier)
        .bind(&member.source)
        .bind(&member.updated_by)
        .fetch_one(pool)
        .await?;

    Ok(row)
}
