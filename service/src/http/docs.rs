//! `OpenAPI` documentation for the public API surface.
//!
//! Only the endpoints embedded pages call are documented here; the admin
//! surface is bearer-token tooling and stays out of the published spec.

// The OpenApi derive macro generates code that triggers this lint
#![allow(clippy::needless_for_each)]

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Sound Factory API",
        description = "Phone verification, sessions, and fan signup for the Sound Factory site"
    ),
    paths(
        crate::verification::http::send_sms,
        crate::verification::http::verify_sms,
        crate::members::http::fans::submit_fan,
        crate::http::health::health
    ),
    components(schemas(
        crate::http::ErrorResponse,
        crate::http::health::HealthResponse,
        crate::http::health::ServicesStatus,
        crate::verification::http::SendRequest,
        crate::verification::http::SendResponse,
        crate::verification::http::VerifyRequest,
        crate::verification::http::VerifyResponse,
        crate::verification::http::SessionPayload,
        crate::members::http::fans::FanPayload,
        crate::members::http::fans::UtmBlock,
        crate::members::http::fans::FanUpsertResponse,
        crate::members::repo::fans::FanRow
    ))
)]
pub struct ApiDoc;
