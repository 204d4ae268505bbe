//! Response security headers.

use std::sync::Arc;

use axum::extract::Request;
use axum::http::header::{
    CONTENT_SECURITY_POLICY, REFERRER_POLICY, STRICT_TRANSPORT_SECURITY, X_CONTENT_TYPE_OPTIONS,
    X_FRAME_OPTIONS, X_XSS_PROTECTION,
};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use axum::Extension;

use crate::config::SecurityHeadersConfig;

/// Header set built once from config and stamped onto every response.
#[derive(Debug, Clone)]
pub struct SecurityHeaders(Arc<HeaderMap>);

impl SecurityHeaders {
    #[must_use]
    pub fn from_config(config: &SecurityHeadersConfig) -> Self {
        let mut headers = HeaderMap::new();

        headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        headers.insert(X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block"));

        if let Ok(value) = HeaderValue::from_str(&config.frame_options) {
            headers.insert(X_FRAME_OPTIONS, value);
        }
        if let Ok(value) = HeaderValue::from_str(&config.content_security_policy) {
            headers.insert(CONTENT_SECURITY_POLICY, value);
        }
        if let Ok(value) = HeaderValue::from_str(&config.referrer_policy) {
            headers.insert(REFERRER_POLICY, value);
        }

        // HSTS is opt-in; it only makes sense behind TLS.
        if config.hsts_enabled {
            let hsts = if config.hsts_include_subdomains {
                format!("max-age={}; includeSubDomains", config.hsts_max_age)
            } else {
                format!("max-age={}", config.hsts_max_age)
            };
            if let Ok(value) = HeaderValue::from_str(&hsts) {
                headers.insert(STRICT_TRANSPORT_SECURITY, value);
            }
        }

        Self(Arc::new(headers))
    }

    fn apply(&self, target: &mut HeaderMap) {
        for (name, value) in self.0.iter() {
            target.insert(name.clone(), value.clone());
        }
    }
}

/// Middleware stamping the prepared headers on every response. Added as the
/// outermost layer so it covers all routes, error responses included.
pub async fn security_headers_middleware(
    Extension(headers): Extension<SecurityHeaders>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    headers.apply(response.headers_mut());
    response
}
