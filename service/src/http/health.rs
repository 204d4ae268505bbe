//! Service health endpoint.

use std::sync::Arc;

use axum::extract::Extension;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::Db;
use crate::verification::VerificationService;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ServicesStatus {
    /// True when live SMS dispatch is configured (not demo mode).
    pub sms: bool,
    /// True when the Postgres pool is connected.
    pub database: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub services: ServicesStatus,
    pub demo_mode: bool,
}

/// Service health and configuration summary
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse)
    )
)]
#[allow(clippy::unused_async)] // Required for Axum handler signature
pub async fn health(
    Extension(service): Extension<Arc<VerificationService>>,
    Extension(db): Extension<Db>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services: ServicesStatus {
            sms: !service.is_demo(),
            database: db.is_connected(),
        },
        demo_mode: service.is_demo(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::sms::mock::MockSmsSender;
    use crate::verification::store::MemoryCodeStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn app(config: &Config) -> Router {
        let service = Arc::new(VerificationService::new(
            config,
            Arc::new(MemoryCodeStore::new()),
            Arc::new(MockSmsSender::new()),
            Db::none(),
        ));
        Router::new()
            .route("/health", get(health))
            .layer(Extension(service))
            .layer(Extension(Db::none()))
    }

    #[tokio::test]
    async fn health_reports_demo_without_credentials() {
        let mut config = Config::default();
        config.session.secret = "test-secret".into();

        let response = app(&config)
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request builder"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body bytes");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json payload");

        assert_eq!(body["status"], "healthy");
        assert_eq!(body["demo_mode"], true);
        assert_eq!(body["services"]["sms"], false);
        assert_eq!(body["services"]["database"], false);
        assert!(!body["version"].as_str().expect("version").is_empty());
        assert!(body["timestamp"].as_str().is_some());
    }

    #[tokio::test]
    async fn health_reports_live_sms_with_credentials() {
        let mut config = Config::default();
        config.session.secret = "test-secret".into();
        config.sms.account_sid = "AC000".into();
        config.sms.auth_token = "token".into();
        config.sms.from = "+15555550100".into();

        let response = app(&config)
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request builder"),
            )
            .await
            .expect("response");

        let bytes = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body bytes");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json payload");

        assert_eq!(body["demo_mode"], false);
        assert_eq!(body["services"]["sms"], true);
    }
}
