//! Test app builder that mirrors main.rs wiring with injectable deps/mocks.
//!
//! The builder constructs an Axum router matching the production wiring in
//! `main.rs`: the same routers, the same extensions, the same layer ordering.
//! SMS goes to [`MockSmsSender`], verification codes live in memory, and the
//! database handle defaults to [`Db::none`].
//!
//! Default config is demo mode with a fixed session secret, so tests can
//! drive the whole send/verify flow without external services.

use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Router};
use soundfactory_api::{
    admin,
    config::Config,
    db::Db,
    http::{cors, docs, health, security_headers_middleware, OriginMatcher, SecurityHeaders},
    members,
    sms::{mock::MockSmsSender, SmsSender},
    verification::{self, store::MemoryCodeStore, VerificationService},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Session secret every test app signs tokens with.
pub const TEST_SESSION_SECRET: &str = "integration-test-secret";

/// Builder for test applications that mirrors main.rs wiring.
pub struct TestAppBuilder {
    config: Config,
    db: Db,
    sender: Arc<MockSmsSender>,
    include_swagger: bool,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAppBuilder {
    /// Demo-mode app: no SMS credentials, no database, default limits.
    #[must_use]
    pub fn new() -> Self {
        let mut config = Config::default();
        config.session.secret = TEST_SESSION_SECRET.to_string();
        Self {
            config,
            db: Db::none(),
            sender: Arc::new(MockSmsSender::new()),
            include_swagger: false,
        }
    }

    /// Edit the config before the app is built.
    #[must_use]
    pub fn map_config(mut self, f: impl FnOnce(&mut Config)) -> Self {
        f(&mut self.config);
        self
    }

    /// Use a specific database handle instead of [`Db::none`].
    #[must_use]
    pub fn with_db(mut self, db: Db) -> Self {
        self.db = db;
        self
    }

    /// Include Swagger UI and the OpenAPI JSON route.
    #[must_use]
    pub fn with_swagger(mut self) -> Self {
        self.include_swagger = true;
        self
    }

    /// Handle to the mock sender, for asserting on dispatched messages.
    #[must_use]
    pub fn sender(&self) -> Arc<MockSmsSender> {
        self.sender.clone()
    }

    /// Build the router with the same layer ordering as main.rs:
    /// routes, then strict-origin gate, then extensions, CORS, and
    /// security headers outermost.
    #[must_use]
    pub fn build(self) -> Router {
        let config = Arc::new(self.config);
        let sender: Arc<dyn SmsSender> = self.sender;
        let service = Arc::new(VerificationService::new(
            &config,
            Arc::new(MemoryCodeStore::new()),
            sender,
            self.db.clone(),
        ));

        let mut app = Router::new()
            .merge(verification::http::router())
            .merge(members::http::router())
            .merge(admin::http::router())
            .route("/health", get(health::health));

        if self.include_swagger {
            app = app.merge(
                SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
            );
        }

        let matcher = OriginMatcher::new(&config.cors.allowed_origins);
        if config.cors.strict {
            app = app
                .layer(middleware::from_fn(cors::strict_origin_middleware))
                .layer(Extension(matcher.clone()));
        }

        app = app
            .layer(Extension(config.clone()))
            .layer(Extension(service))
            .layer(Extension(self.db))
            .layer(matcher.cors_layer());

        if config.security_headers.enabled {
            app = app
                .layer(middleware::from_fn(security_headers_middleware))
                .layer(Extension(SecurityHeaders::from_config(
                    &config.security_headers,
                )));
        }

        app
    }
}
