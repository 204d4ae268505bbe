//! Platform accounts the promo tools post through.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

/// Errors from account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountRepoError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// `credentials` is opaque JSON; each platform stores whatever it needs.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct AccountRow {
    pub id: Uuid,
    pub platform: String,
    pub label: String,
    pub credentials: Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields written by create and update alike.
#[derive(Debug)]
pub struct AccountWrite {
    pub platform: String,
    pub label: String,
    pub credentials: Value,
    pub is_active: bool,
}

/// Accounts newest-first, optionally narrowed to one platform.
///
/// # Errors
///
/// Returns [`AccountRepoError::Database`] on connection or query failure.
pub async fn list(
    pool: &PgPool,
    platform: Option<&str>,
) -> Result<Vec<AccountRow>, AccountRepoError> {
    let rows = match platform {
        Some(platform) => {
            sqlx::query_as::<_, AccountRow>(
                "SELECT * FROM admin_accounts WHERE platform = $1 ORDER BY created_at DESC",
            )
            .bind(platform)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, AccountRow>("SELECT * FROM admin_accounts ORDER BY created_at DESC")
                .fetch_all(pool)
                .await?
        }
    };

    Ok(rows)
}

/// Create an account.
///
/// # Errors
///
/// Returns [`AccountRepoError::Database`] on connection or query failure.
pub async fn insert(pool: &PgPool, account: &AccountWrite) -> Result<AccountRow, AccountRepoError> {
    let row = sqlx::query_as::<_, AccountRow>(
        r"
        INSERT INTO admin_accounts (platform, label, credentials, is_active)
        VALUES ($1, $2, $3, $4)
        RETURNING id, platform, label, credentials, is_active, created_at, updated_at
        ",
    )
    .bind(&account.platform)
    .bind(&account.label)
    .bind(&account.credentials)
    .bind(account.is_active)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Overwrite an account by id. `None` when no such account exists.
///
/// # Errors
///
/// Returns [`AccountRepoError::Database`] on connection or query failure.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    account: &AccountWrite,
) -> Result<Option<AccountRow>, AccountRepoError> {
    let row = sqlx::query_as::<_, AccountRow>(
        r"
        UPDATE admin_accounts
        SET platform = $2, label = $3, credentials = $4, is_active = $5, updated_at = now()
        WHERE id = $1
        RETURNING id, platform, label, credentials, is_active, created_at, updated_at
        ",
    )
    .bind(id)
    .bind(&account.platform)
    .bind(&account.label)
    .bind(&account.credentials)
    .bind(account.is_active)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Delete by id. Deleting a missing id is not an error.
///
/// # Errors
///
/// Returns [`AccountRepoError::Database`] on connection or query failure.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, AccountRepoError> {
    let result = sqlx::query("DELETE FROM admin_accounts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
