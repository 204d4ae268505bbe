//! Bearer-token helpers for admin-guarded endpoints.
//!
//! Admin auth is a static shared token per endpoint group, not per-user
//! accounts. An empty configured token leaves that group open, which is the
//! local-development default.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

/// Extract a bearer token from the `Authorization` header. The scheme is
/// matched case-insensitively.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Check a request against a configured admin token. Empty `required` means
/// the guard is disabled.
#[must_use]
pub fn admin_authorized(headers: &HeaderMap, required: &str) -> bool {
    if required.is_empty() {
        return true;
    }
    bearer_token(headers) == Some(required)
}
