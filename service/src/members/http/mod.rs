//! HTTP handlers for member and fan endpoints

pub mod fans;
pub mod upsert;

use axum::routing::{get, post};
use axum::Router;

/// Member routes. The `/api/members/upsert` alias matches the path deployed
/// clients already call.
pub fn router() -> Router {
    Router::new()
        .route("/members-upsert", post(upsert::members_upsert))
        .route("/api/members/upsert", post(upsert::members_upsert))
        .route("/fans", get(fans::list_fans).post(fans::submit_fan))
}

/// Trim a field to `None` when empty or missing.
pub(crate) fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_trims_and_drops_empty() {
        assert_eq!(clean(Some("  Sound Factory  ")), Some("Sound Factory".to_string()));
        assert_eq!(clean(Some("   ")), None);
        assert_eq!(clean(Some("")), None);
        assert_eq!(clean(None), None);
    }
}
