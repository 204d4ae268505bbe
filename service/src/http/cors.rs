//! CORS origin allow-list with wildcard patterns.
//!
//! Patterns are literal except `*`, which matches any run of characters, so
//! `https://*.example.com` admits every subdomain. A non-matching origin is
//! never echoed back; in strict mode it is refused outright.

use axum::extract::Request;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, ORIGIN};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use tower_http::cors::{AllowOrigin, CorsLayer};

use super::ErrorResponse;

/// Compiled origin allow-list.
#[derive(Debug, Clone)]
pub struct OriginMatcher {
    patterns: Vec<String>,
    allow_any: bool,
}

impl OriginMatcher {
    /// Build from the configured list. An empty list or a `"*"` entry allows
    /// every origin.
    #[must_use]
    pub fn new(allowed: &[String]) -> Self {
        let patterns: Vec<String> = allowed
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        let allow_any = patterns.is_empty() || patterns.iter().any(|p| p == "*");
        Self {
            patterns,
            allow_any,
        }
    }

    #[must_use]
    pub fn matches(&self, origin: &str) -> bool {
        if self.allow_any {
            return true;
        }
        self.patterns.iter().any(|p| pattern_matches(p, origin))
    }

    /// CORS layer echoing back origins the matcher admits.
    #[must_use]
    pub fn cors_layer(&self) -> CorsLayer {
        let layer = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([
                CONTENT_TYPE,
                AUTHORIZATION,
                HeaderName::from_static("x-admin-key"),
            ]);

        if self.allow_any {
            // Credentials cannot be combined with a wildcard origin.
            layer.allow_origin(AllowOrigin::any())
        } else {
            let matcher = self.clone();
            layer
                .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
                    origin.to_str().is_ok_and(|o| matcher.matches(o))
                }))
                .allow_credentials(true)
        }
    }
}

/// Anchored wildcard match: literal segments must appear in order, `*` spans
/// any run of characters.
fn pattern_matches(pattern: &str, value: &str) -> bool {
    if pattern == value {
        return true;
    }
    if !pattern.contains('*') {
        return false;
    }

    let mut segments = pattern.split('*');
    let Some(first) = segments.next() else {
        return false;
    };
    let Some(mut rest) = value.strip_prefix(first) else {
        return false;
    };

    let mut middle: Vec<&str> = segments.collect();
    let Some(last) = middle.pop() else {
        return false;
    };

    for segment in middle {
        if segment.is_empty() {
            continue;
        }
        match rest.find(segment) {
            Some(idx) => rest = &rest[idx + segment.len()..],
            None => return false,
        }
    }

    rest.ends_with(last)
}

/// Strict-mode gate: requests bearing a disallowed `Origin` are refused with
/// 403 instead of merely losing their CORS headers.
pub async fn strict_origin_middleware(
    Extension(matcher): Extension<OriginMatcher>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(origin) = request.headers().get(ORIGIN) {
        let allowed = origin.to_str().is_ok_and(|o| matcher.matches(o));
        if !allowed {
            return (
                StatusCode::FORBIDDEN,
                Json(ErrorResponse {
                    error: "Origin not allowed".to_string(),
                }),
            )
                .into_response();
        }
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::middleware;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn matcher(patterns: &[&str]) -> OriginMatcher {
        let list: Vec<String> = patterns.iter().map(ToString::to_string).collect();
        OriginMatcher::new(&list)
    }

    #[test]
    fn exact_origins_match() {
        let m = matcher(&["https://soundfactory.nyc"]);
        assert!(m.matches("https://soundfactory.nyc"));
        assert!(!m.matches("https://soundfactory.nyc.evil.com"));
        assert!(!m.matches("http://soundfactory.nyc"));
    }

    #[test]
    fn wildcard_subdomains_match() {
        let m = matcher(&["https://*.example.com"]);
        assert!(m.matches("https://foo.example.com"));
        assert!(m.matches("https://deep.foo.example.com"));
        assert!(!m.matches("https://evil.com"));
        assert!(!m.matches("https://example.com.evil.com"));
    }

    #[test]
    fn wildcard_must_anchor_both_ends() {
        let m = matcher(&["https://*.example.com"]);
        assert!(!m.matches("http://foo.example.com"));
        assert!(!m.matches("https://foo.example.common"));
    }

    #[test]
    fn star_allows_everything() {
        let m = matcher(&["*"]);
        assert!(m.matches("https://anywhere.at.all"));
        assert!(matcher(&[]).matches("https://anywhere.at.all"));
    }

    #[test]
    fn mixed_list_checks_every_pattern() {
        let m = matcher(&["https://soundfactory.nyc", "https://*.netlify.app"]);
        assert!(m.matches("https://soundfactory.nyc"));
        assert!(m.matches("https://preview-42.netlify.app"));
        assert!(!m.matches("https://other.site"));
    }

    fn strict_app(m: OriginMatcher) -> Router {
        Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(middleware::from_fn(strict_origin_middleware))
            .layer(Extension(m))
    }

    #[tokio::test]
    async fn strict_mode_rejects_disallowed_origin() {
        let app = strict_app(matcher(&["https://*.example.com"]));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/ping")
                    .header("origin", "https://evil.com")
                    .body(Body::empty())
                    .expect("request builder"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn strict_mode_passes_allowed_origin() {
        let app = strict_app(matcher(&["https://*.example.com"]));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/ping")
                    .header("origin", "https://foo.example.com")
                    .body(Body::empty())
                    .expect("request builder"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn strict_mode_ignores_requests_without_origin() {
        let app = strict_app(matcher(&["https://only.example.com"]));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/ping")
                    .body(Body::empty())
                    .expect("request builder"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
    }
}
