//! Key/value settings behind the promo dashboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;

/// Errors from settings operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsRepoError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// One setting. `value` is arbitrary JSON; the dashboard decides what each
/// key means.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct SettingRow {
    pub key: String,
    pub value: Value,
    pub updated_at: DateTime<Utc>,
}

/// All settings rows.
///
/// # Errors
///
/// Returns [`SettingsRepoError::Database`] on connection or query failure.
pub async fn list(pool: &PgPool) -> Result<Vec<SettingRow>, SettingsRepoError> {
    let rows =
        sqlx::query_as::<_, SettingRow>("SELECT key, value, updated_at FROM admin_settings")
            .fetch_all(pool)
            .await?;

    Ok(rows)
}

/// Upsert every entry, returning how many were written.
///
/// # Errors
///
/// Returns [`SettingsRepoError::Database`] on connection or query failure.
pub async fn upsert_many(
    pool: &PgPool,
    entries: &[(String, Value)],
) -> Result<u64, SettingsRepoError> {
    let mut updated = 0u64;
    for (key, value) in entries {
        sqlx::query(
            r"
            INSERT INTO admin_settings (key, value) VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()
            ",
        )
        .bind(key)
        .bind(value)
        .execute(pool)
        .await?;
        updated += 1;
    }

    Ok(updated)
}
