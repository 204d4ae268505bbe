//! Fan repository: audience rows with consent, attribution, and bucketing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use utoipa::ToSchema;
use uuid::Uuid;

/// Errors from fan operations.
#[derive(Debug, thiserror::Error)]
pub enum FanRepoError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct FanRow {
    pub id: Uuid,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub platform: Option<String>,
    pub source: Option<String>,
    pub audience_bucket: String,
    pub invite_code: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
    pub consent: bool,
    pub consent_ts: Option<DateTime<Utc>>,
    pub email_status: Option<String>,
    pub bounce_count: i32,
    pub last_email_check_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Normalized fan values ready to upsert. `consent_ts` is only set when the
/// submission consented, so an earlier consent timestamp is never erased.
#[derive(Debug, Clone, Default)]
pub struct NewFan {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub platform: Option<String>,
    pub source: Option<String>,
    pub invite_code: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
    pub consent: bool,
    pub consent_ts: Option<DateTime<Utc>>,
    pub audience_bucket: String,
}

impl NewFan {
    #[must_use]
    pub fn has_identifier(&self) -> bool {
        self.phone.is_some() || self.email.is_some()
    }
}

/// List filters, all optional. `limit` is already capped by the handler.
#[derive(Debug, Default)]
pub struct FanFilters {
    pub consent: Option<bool>,
    pub source: Option<String>,
    pub platform: Option<String>,
    pub audience_bucket: Option<String>,
    pub email_status: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub search: Option<String>,
    pub limit: i64,
}

/// List fans newest-first with the given filters.
///
/// # Errors
///
/// Returns [`FanRepoError::Database`] on connection or query failure.
pub async fn list(pool: &PgPool, filters: &FanFilters) -> Result<Vec<FanRow>, FanRepoError> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM fans WHERE 1=1");

    if let Some(consent) = filters.consent {
        query.push(" AND consent = ").push_bind(consent);
    }
    if let Some(source) = &filters.source {
        query.push(" AND source = ").push_bind(source);
    }
    if let Some(platform) = &filters.platform {
        query.push(" AND platform = ").push_bind(platform);
    }
    if let Some(bucket) = &filters.audience_bucket {
        query.push(" AND audience_bucket = ").push_bind(bucket);
    }
    if let Some(status) = &filters.email_status {
        query.push(" AND email_status = ").push_bind(status);
    }
    if let Some(since) = filters.since {
        query.push(" AND updated_at >= ").push_bind(since);
    }
    if let Some(search) = &filters.search {
        let pattern = format!("%{search}%");
        query.push(" AND (name ILIKE ").push_bind(pattern.clone());
        query.push(" OR email ILIKE ").push_bind(pattern.clone());
        query.push(" OR phone ILIKE ").push_bind(pattern);
        query.push(")");
    }

    query
        .push(" ORDER BY updated_at DESC LIMIT ")
        .push_bind(filters.limit);

    let rows = query.build_query_as::<FanRow>().fetch_all(pool).await?;
    Ok(rows)
}

/// Upsert one fan, conflicting on phone when present, email otherwise.
/// Supplied values replace stored ones wholesale; only `consent_ts` keeps
/// its earlier value when the new submission did not consent.
///
/// # Errors
///
/// Returns [`FanRepoError::Database`] on connection or query failure.
pub async fn upsert(pool: &PgPool, fan: &NewFan) -> Result<FanRow, FanRepoError> {
    let sql = if fan.phone.is_some() {
        UPSERT_BY_PHONE
    } else {
        UPSERT_BY_EMAIL
    };

    let row = sqlx::query_as::<_, FanRow>(sql)
        .bind(&fan.phone)
        .bind(&fan.email)
        .bind(&fan.name)
        .bind(&fan.platform)
        .bind(&fan.source)
        .bind(&fan.invite_code)
        .bind(&fan.utm_source)
        .bind(&fan.utm_medium)
        .bind(&fan.utm_campaign)
        .bind(&fan.utm_term)
        .bind(&fan.utm_content)
        .bind(fan.consent)
        .bind(fan.consent_ts)
        .bind(&fan.audience_bucket)
        .fetch_one(pool)
        .await?;

    Ok(row)
}

const UPSERT_BY_PHONE: &str = r"
    INSERT INTO fans (phone, email, name, platform, source, invite_code,
        utm_source, utm_medium, utm_campaign, utm_term, utm_content,
        consent, consent_ts, audience_bucket)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
    ON CONFLICT (phone) DO UPDATE SET
        email = EXCLUDED.email,
        name = EXCLUDED.name,
        platform = EXCLUDED.platform,
        source = EXCLUDED.source,
        invite_code = EXCLUDED.invite_code,
        utm_source = EXCLUDED.utm_source,
        utm_medium = EXCLUDED.utm_medium,
        utm_campaign = EXCLUDED.utm_campaign,
        utm_term = EXCLUDED.utm_term,
        utm_content = EXCLUDED.utm_content,
        consent = EXCLUDED.consent,
        consent_ts = COALESCE(EXCLUDED.consent_ts, fans.consent_ts),
        audience_bucket = EXCLUDED.audience_bucket,
        updated_at = now()
    RETURNING *
    ";

const UPSERT_BY_EMAIL: &str = r"
    INSERT INTO fans (phone, email, name, platform, source, invite_code,
        utm_source, utm_medium, utm_campaign, utm_term, utm_content,
        consent, consent_ts, audience_bucket)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
    ON CONFLICT (email) DO UPDATE SET
        phone = EXCLUDED.phone,
        name = EXCLUDED.name,
        platform = EXCLUDED.platform,
        source = EXCLUDED.source,
        invite_code = EXCLUDED.invite_code,
        utm_source = EXCLUDED.utm_source,
        utm_medium = EXCLUDED.utm_medium,
        utm_campaign = EXCLUDED.utm_campaign,
        utm_term = EXCLUDED.utm_term,
        utm_content = EXCLUDED.utm_content,
        consent = EXCLUDED.consent,
        consent_ts = COALESCE(EXCLUDED.consent_ts, fans.consent_ts),
        audience_bucket = EXCLUDED.audience_bucket,
        updated_at = now()
    RETURNING *
    ";

/// A fan picked up by the email-cleaning pass.
#[derive(Debug, sqlx::FromRow)]
pub struct CleanCandidate {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Fans of a bucket with an email that has never been checked.
///
/// # Errors
///
/// Returns [`FanRepoError::Database`] on connection or query failure.
pub async fn clean_candidates(
    pool: &PgPool,
    bucket: &str,
    limit: i64,
) -> Result<Vec<CleanCandidate>, FanRepoError> {
    let rows = sqlx::query_as::<_, CleanCandidate>(
        r"
        SELECT id, email FROM fans
        WHERE audience_bucket = $1 AND email_status IS NULL AND email IS NOT NULL
        LIMIT $2
        ",
    )
    .bind(bucket)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Explicit id selection for the cleaning pass.
///
/// # Errors
///
/// Returns [`FanRepoError::Database`] on connection or query failure.
pub async fn fans_by_ids(
    pool: &PgPool,
    ids: &[Uuid],
    limit: i64,
) -> Result<Vec<CleanCandidate>, FanRepoError> {
    let rows = sqlx::query_as::<_, CleanCandidate>(
        "SELECT id, email FROM fans WHERE id = ANY($1) LIMIT $2",
    )
    .bind(ids)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Record the outcome of an email check.
///
/// # Errors
///
/// Returns [`FanRepoError::Database`] on connection or query failure.
pub async fn record_email_status(
    pool: &PgPool,
    id: Uuid,
    status: &str,
) -> Result<(), FanRepoError> {
    sqlx::query("UPDATE fans SET email_status = $2, last_email_check_at = now() WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(pool)
        .await?;

    Ok(())
}

/// Move fans into a bucket. Returns the number of rows updated.
///
/// # Errors
///
/// Returns [`FanRepoError::Database`] on connection or query failure.
pub async fn promote(pool: &PgPool, ids: &[Uuid], bucket: &str) -> Result<u64, FanRepoError> {
    let result =
        sqlx::query("UPDATE fans SET audience_bucket = $2, updated_at = now() WHERE id = ANY($1)")
            .bind(ids)
            .bind(bucket)
            .execute(pool)
            .await?;

    Ok(result.rows_affected())
}
