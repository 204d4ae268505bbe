//! Postgres mirror for issued verification codes.
//!
//! The in-memory store is authoritative for a single instance; these rows
//! let a replacement instance (or a second one behind the balancer) honor
//! codes it did not issue. Writes are best-effort from the caller's point
//! of view: a failed mirror write is logged, never surfaced.

use chrono::{DateTime, Utc};
use sqlx::{query, query_as, PgPool};
use uuid::Uuid;

/// Errors from verification mirror operations.
#[derive(Debug, thiserror::Error)]
pub enum VerificationRepoError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A mirrored verification row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredVerification {
    pub id: Uuid,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub attempts: i32,
}

/// Insert a freshly issued code. Attempts start at zero.
///
/// # Errors
/// Returns [`VerificationRepoError::Database`] on connection or query failure.
pub async fn insert(
    pool: &PgPool,
    phone: &str,
    code_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), VerificationRepoError> {
    query(
        r"
        INSERT INTO phone_verifications (phone, code_hash, expires_at, attempts)
        VALUES ($1, $2, $3, 0)
        ",
    )
    .bind(phone)
    .bind(code_hash)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Fetch the newest unconsumed, unexpired row for a phone number.
///
/// # Errors
/// Returns [`VerificationRepoError::Database`] on connection or query failure.
pub async fn fetch_active(
    pool: &PgPool,
    phone: &str,
) -> Result<Option<StoredVerification>, VerificationRepoError> {
    let row = query_as::<_, StoredVerification>(
        r"
        SELECT id, code_hash, expires_at, attempts
        FROM phone_verifications
        WHERE phone = $1 AND consumed_at IS NULL AND expires_at > now()
        ORDER BY created_at DESC
        LIMIT 1
        ",
    )
    .bind(phone)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Persist the attempt counter on the active row after a wrong guess.
/// Keyed by phone because the caller usually holds a memory record with no
/// row id.
///
/// # Errors
/// Returns [`VerificationRepoError::Database`] on connection or query failure.
pub async fn record_attempts(
    pool: &PgPool,
    phone: &str,
    attempts: u32,
) -> Result<(), VerificationRepoError> {
    query("UPDATE phone_verifications SET attempts = $2 WHERE phone = $1 AND consumed_at IS NULL")
        .bind(phone)
        .bind(i64::from(attempts))
        .execute(pool)
        .await?;
    Ok(())
}

/// Mark the active row consumed after a successful verification. Consumed
/// rows are never matched again.
///
/// # Errors
/// Returns [`VerificationRepoError::Database`] on connection or query failure.
pub async fn consume(pool: &PgPool, phone: &str, attempts: u32) -> Result<(), VerificationRepoError> {
    query(
        r"
        UPDATE phone_verifications
        SET consumed_at = now(), attempts = $2
        WHERE phone = $1 AND consumed_at IS NULL
        ",
    )
    .bind(phone)
    .bind(i64::from(attempts))
    .execute(pool)
    .await?;
    Ok(())
}

/// Delete rows whose expiry passed more than `grace_secs` ago. The grace
/// period keeps just-expired rows visible long enough for in-flight
/// verifications to fail with the uniform error rather than a missing row.
/// Returns the count of deleted rows.
///
/// # Errors
/// Returns [`VerificationRepoError::Database`] on connection or query failure.
pub async fn cleanup_expired(
    pool: &PgPool,
    grace_secs: i64,
) -> Result<u64, VerificationRepoError> {
    let result = query(
        "DELETE FROM phone_verifications WHERE expires_at < now() - make_interval(secs => $1::float8)",
    )
    .bind(grace_secs)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
