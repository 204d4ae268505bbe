use crate::config::DatabaseConfig;
use sqlx_core::migrate::Migrator;
use sqlx_postgres::{PgPool, PgPoolOptions};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{info, warn};

/// Shared handle to the optional Postgres mirror.
///
/// The service runs fine without a database: verification codes live in
/// memory and the member/fan/admin endpoints report the database as
/// unavailable. Handlers that need Postgres go through [`Db::pool`].
#[derive(Clone, Default)]
pub struct Db(Option<PgPool>);

impl Db {
    /// Wrap a connected pool.
    #[must_use]
    pub const fn connected(pool: PgPool) -> Self {
        Self(Some(pool))
    }

    /// Handle for a deployment with no database configured.
    #[must_use]
    pub const fn none() -> Self {
        Self(None)
    }

    /// The pool, when one is configured.
    #[must_use]
    pub const fn pool(&self) -> Option<&PgPool> {
        self.0.as_ref()
    }

    /// True when a pool is configured.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.0.is_some()
    }
}

/// Connect to the database and run migrations
pub async fn setup_database(config: &DatabaseConfig) -> Result<PgPool, anyhow::Error> {
    let database_url = config.connection_url();
    let retry_deadline = Duration::from_secs(60); // overall retry budget
    let max_interval = Duration::from_secs(30); // cap single waits
    let mut delay = Duration::from_millis(500);
    let start = Instant::now();

    let pool = loop {
        info!("Attempting to connect to Postgres...");

        match PgPoolOptions::new()
            .max_connections(config.max_connections)
            // Allow extra time to acquire a connection during startup bursts
            .acquire_timeout(Duration::from_secs(30))
            .connect(&database_url)
            .await
        {
            Ok(pool) => break pool,
            Err(err) => {
                if start.elapsed() >= retry_deadline {
                    warn!(error = %err, "Postgres not ready; retries exhausted");
                    return Err(err.into());
                }

                warn!(error = %err, "Postgres not ready yet; retrying");
                sleep(delay).await;
                delay = (delay.saturating_mul(2)).min(max_interval);
            }
        }
    };

    // Run database migrations from the crate's migrations directory
    let migrations_path = config.migrations_dir.as_ref().map_or_else(
        || PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/migrations")),
        PathBuf::from,
    );
    let migrator = Migrator::new(migrations_path.as_path()).await?;
    migrator.run(&pool).await?;
    info!("Migrations applied");
    Ok(pool)
}
