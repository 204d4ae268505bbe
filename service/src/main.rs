#![deny(
    clippy::expect_used,
    clippy::panic,
    clippy::print_stdout,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used
)]

use axum::{middleware, routing::get, Extension, Router};
use axum_prometheus::PrometheusMetricLayer;
use soundfactory_api::{
    admin,
    config::Config,
    db::{setup_database, Db},
    http::{cors, docs, health, security_headers_middleware, OriginMatcher, SecurityHeaders},
    members,
    sms::{SmsSender, TwilioSender},
    verification::{self, store::MemoryCodeStore, VerificationService},
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Consumed and expired verification rows are swept once they are this stale.
const CLEANUP_GRACE_SECS: i64 = 3600;

const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load and validate configuration first (fail-fast)
    let config = Config::load().map_err(|e| anyhow::anyhow!("{e}"))?;

    // Set up logging from config
    std::env::set_var("RUST_LOG", &config.logging.level);
    tracing_subscriber::fmt::init();

    // Init banner so container logs clearly show startup
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        demo = config.sms.is_demo(),
        "soundfactory-api starting up"
    );
    if config.sms.is_demo() {
        tracing::warn!("SMS demo mode is on: codes are returned in responses, nothing is sent");
    }

    // Postgres is optional; without it verification runs memory-only and the
    // member, fan, and admin endpoints report the database as unconfigured.
    let db = if config.database.enabled {
        tracing::info!("Connecting to database...");
        Db::connected(setup_database(&config.database).await?)
    } else {
        tracing::info!("Database disabled - running with in-memory verification only");
        Db::none()
    };

    let config = Arc::new(config);
    let sender: Arc<dyn SmsSender> = Arc::new(TwilioSender::new(&config.sms));
    let service = Arc::new(VerificationService::new(
        &config,
        Arc::new(MemoryCodeStore::new()),
        sender,
        db.clone(),
    ));

    spawn_maintenance(service.clone(), db.clone());

    // Build the API
    let mut app = Router::new()
        .merge(verification::http::router())
        .merge(members::http::router())
        .merge(admin::http::router())
        .route("/health", get(health::health));

    if config.swagger.enabled {
        tracing::info!("Swagger UI enabled at /swagger-ui");
        app = app.merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
        );
    }

    if config.metrics.enabled {
        tracing::info!("Prometheus metrics enabled at /metrics");
        let (metric_layer, metric_handle) = PrometheusMetricLayer::pair();
        app = app
            .route("/metrics", get(|| async move { metric_handle.render() }))
            .layer(metric_layer);
    }

    // CORS allow-list; strict mode also refuses disallowed origins outright
    let matcher = OriginMatcher::new(&config.cors.allowed_origins);
    if config.cors.strict {
        tracing::info!("Strict origin checking enabled");
        app = app
            .layer(middleware::from_fn(cors::strict_origin_middleware))
            .layer(Extension(matcher.clone()));
    }

    app = app
        .layer(Extension(config.clone()))
        .layer(Extension(service))
        .layer(Extension(db))
        .layer(matcher.cors_layer());

    // Add security headers middleware if enabled
    if config.security_headers.enabled {
        tracing::info!("Security headers enabled");
        app = app
            .layer(middleware::from_fn(security_headers_middleware))
            .layer(Extension(SecurityHeaders::from_config(
                &config.security_headers,
            )));
    }

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodic sweep: drop idle rate-limiter entries and, when Postgres is
/// configured, purge stale verification rows.
fn spawn_maintenance(service: Arc<VerificationService>, db: Db) {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(MAINTENANCE_INTERVAL);
        loop {
            tick.tick().await;
            service.limits().retain_recent();
            if let Some(pool) = db.pool() {
                match verification::repo::cleanup_expired(pool, CLEANUP_GRACE_SECS).await {
                    Ok(0) => {}
                    Ok(purged) => tracing::debug!(purged, "swept stale verification rows"),
                    Err(err) => tracing::warn!(error = %err, "verification sweep failed"),
                }
            }
        }
    });
}
