//! `/fans`: the fan roster behind signup forms and street-team tooling.
//!
//! `GET` lists or exports the roster (admin bearer token). `POST` is a
//! dispatcher on the body's `mode` field: `bulk`, `clean`, and `promote` are
//! admin operations, anything else is the public consent-first upsert that
//! signup forms call directly.

use crate::auth::admin_authorized;
use crate::config::Config;
use crate::db::Db;
use crate::http::{database_unconfigured, internal_error, ErrorResponse};
use crate::members::http::clean;
use crate::members::repo::fans::{self, FanFilters, FanRow, NewFan};
use axum::extract::{Extension, Query};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

const DEFAULT_LIST_LIMIT: i64 = 1000;
const MAX_LIST_LIMIT: i64 = 5000;
const DEFAULT_CLEAN_LIMIT: i64 = 500;
const MAX_CLEAN_LIMIT: i64 = 2000;

#[derive(Debug, Default, Deserialize)]
pub struct FansQuery {
    pub format: Option<String>,
    pub limit: Option<i64>,
    pub consent: Option<bool>,
    pub source: Option<String>,
    pub platform: Option<String>,
    pub audience_bucket: Option<String>,
    pub email_status: Option<String>,
    /// RFC 3339 timestamp or bare `YYYY-MM-DD` date.
    pub since: Option<String>,
    pub search: Option<String>,
}

/// Body for `POST /fans`. One type covers all four modes; unused fields are
/// simply absent.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct FanPayload {
    #[serde(default)]
    pub mode: Option<String>,

    // Single/bulk fan fields
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub invite_code: Option<String>,
    #[serde(default)]
    pub r#ref: Option<String>,
    #[serde(default)]
    pub ref_code: Option<String>,
    #[serde(default)]
    pub utm_source: Option<String>,
    #[serde(default)]
    pub utm_medium: Option<String>,
    #[serde(default)]
    pub utm_campaign: Option<String>,
    #[serde(default)]
    pub utm_term: Option<String>,
    #[serde(default)]
    pub utm_content: Option<String>,
    #[serde(default)]
    pub utm: Option<UtmBlock>,
    #[serde(default)]
    pub consent: Option<bool>,
    #[serde(default)]
    pub consent_sms: Option<bool>,
    #[serde(default)]
    pub audience_bucket: Option<String>,

    // Admin mode fields
    #[serde(default)]
    #[schema(no_recursion)]
    pub items: Option<Vec<FanPayload>>,
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub ids: Option<Vec<Uuid>>,
}

/// Nested UTM object some trackers send instead of flat `utm_*` fields.
/// Both the prefixed and bare key spellings occur in the wild.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UtmBlock {
    #[serde(default)]
    pub utm_source: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub utm_medium: Option<String>,
    #[serde(default)]
    pub medium: Option<String>,
    #[serde(default)]
    pub utm_campaign: Option<String>,
    #[serde(default)]
    pub campaign: Option<String>,
    #[serde(default)]
    pub utm_term: Option<String>,
    #[serde(default)]
    pub term: Option<String>,
    #[serde(default)]
    pub utm_content: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FansListResponse {
    pub fans: Vec<FanRow>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FanUpsertResponse {
    pub ok: bool,
    pub fan: FanRow,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkUpsertResponse {
    pub ok: bool,
    pub inserted: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CleanResponse {
    pub ok: bool,
    pub checked: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PromoteResponse {
    pub ok: bool,
    pub updated: u64,
    pub bucket: String,
}

/// Signup clients read both fields of this 400.
#[derive(Debug, Serialize)]
struct MissingIdentifierResponse {
    error: &'static str,
    message: &'static str,
}

pub async fn list_fans(
    Extension(config): Extension<Arc<Config>>,
    Extension(db): Extension<Db>,
    headers: HeaderMap,
    Query(query): Query<FansQuery>,
) -> Response {
    let Some(pool) = db.pool() else {
        return database_unconfigured();
    };
    if !admin_authorized(&headers, config.admin.fans_bearer()) {
        return unauthorized();
    }

    let filters = FanFilters {
        consent: query.consent,
        source: clean(query.source.as_deref()),
        platform: clean(query.platform.as_deref()),
        audience_bucket: clean(query.audience_bucket.as_deref()),
        email_status: clean(query.email_status.as_deref()),
        since: query.since.as_deref().and_then(parse_since),
        search: clean(query.search.as_deref()),
        limit: query
            .limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(0, MAX_LIST_LIMIT),
    };

    let rows = match fans::list(pool, &filters).await {
        Ok(rows) => rows,
        Err(err) => {
            tracing::error!(error = %err, "Fan list failed");
            return internal_error();
        }
    };

    let wants_csv = query
        .format
        .as_deref()
        .is_some_and(|f| f.eq_ignore_ascii_case("csv"));
    if wants_csv {
        match csv_export(&rows) {
            Ok(csv) => {
                ([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], csv).into_response()
            }
            Err(err) => {
                tracing::error!(error = %err, "Fan CSV export failed");
                internal_error()
            }
        }
    } else {
        Json(FansListResponse { fans: rows }).into_response()
    }
}

#[utoipa::path(
    post,
    path = "/fans",
    tag = "Fans",
    request_body = FanPayload,
    responses(
        (status = 200, description = "Fan stored", body = FanUpsertResponse),
        (status = 400, description = "Neither phone nor email provided"),
        (status = 500, description = "Database unavailable", body = ErrorResponse)
    )
)]
pub async fn submit_fan(
    Extension(config): Extension<Arc<Config>>,
    Extension(db): Extension<Db>,
    headers: HeaderMap,
    Json(payload): Json<FanPayload>,
) -> Response {
    let Some(pool) = db.pool() else {
        return database_unconfigured();
    };

    match payload.mode.as_deref() {
        Some("bulk") => bulk_upsert(pool, &config, &headers, &payload).await,
        Some("clean") => clean_emails(pool, &config, &headers, &payload).await,
        Some("promote") => promote_fans(pool, &config, &headers, &payload).await,
        _ => single_upsert(pool, &payload).await,
    }
}

/// Public consent-first upsert, the default mode.
async fn single_upsert(pool: &PgPool, payload: &FanPayload) -> Response {
    let fan = normalize_fan(payload);
    if !fan.has_identifier() {
        return (
            StatusCode::BAD_REQUEST,
            Json(MissingIdentifierResponse {
                error: "missing_identifier",
                message: "phone or email required",
            }),
        )
            .into_response();
    }

    match fans::upsert(pool, &fan).await {
        Ok(row) => Json(FanUpsertResponse { ok: true, fan: row }).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Fan upsert failed");
            internal_error()
        }
    }
}

async fn bulk_upsert(
    pool: &PgPool,
    config: &Config,
    headers: &HeaderMap,
    payload: &FanPayload,
) -> Response {
    if !admin_authorized(headers, config.admin.fans_bearer()) {
        return unauthorized();
    }
    let items = payload.items.as_deref().unwrap_or_default();
    if items.is_empty() {
        return bad_request("no-items");
    }

    // Items without an identifier are skipped, not rejected, so one bad row
    // cannot sink an import.
    let mut inserted = 0u64;
    for item in items {
        let fan = normalize_fan(item);
        if !fan.has_identifier() {
            continue;
        }
        if let Err(err) = fans::upsert(pool, &fan).await {
            tracing::error!(error = %err, "Bulk fan upsert failed");
            return internal_error();
        }
        inserted += 1;
    }

    Json(BulkUpsertResponse { ok: true, inserted }).into_response()
}

/// Syntax-check stored emails and record the verdict on each row.
async fn clean_emails(
    pool: &PgPool,
    config: &Config,
    headers: &HeaderMap,
    payload: &FanPayload,
) -> Response {
    if !admin_authorized(headers, config.admin.fans_bearer()) {
        return unauthorized();
    }

    let limit = payload
        .limit
        .unwrap_or(DEFAULT_CLEAN_LIMIT)
        .clamp(0, MAX_CLEAN_LIMIT);
    let candidates = match payload.ids.as_deref() {
        Some(ids) if !ids.is_empty() => fans::fans_by_ids(pool, ids, limit).await,
        _ => {
            let bucket =
                clean(payload.bucket.as_deref()).unwrap_or_else(|| "probation".to_string());
            fans::clean_candidates(pool, &bucket, limit).await
        }
    };
    let candidates = match candidates {
        Ok(candidates) => candidates,
        Err(err) => {
            tracing::error!(error = %err, "Fetching clean candidates failed");
            return internal_error();
        }
    };

    let mut checked = 0u64;
    for candidate in candidates {
        let status = match candidate.email.as_deref() {
            Some(email) if valid_email_syntax(email) => "valid_syntax",
            _ => "invalid_syntax",
        };
        if let Err(err) = fans::record_email_status(pool, candidate.id, status).await {
            tracing::error!(error = %err, "Recording email status failed");
            return internal_error();
        }
        checked += 1;
    }

    Json(CleanResponse { ok: true, checked }).into_response()
}

async fn promote_fans(
    pool: &PgPool,
    config: &Config,
    headers: &HeaderMap,
    payload: &FanPayload,
) -> Response {
    if !admin_authorized(headers, config.admin.fans_bearer()) {
        return unauthorized();
    }
    let ids = payload.ids.as_deref().unwrap_or_default();
    if ids.is_empty() {
        return bad_request("no-ids");
    }
    let bucket = clean(payload.bucket.as_deref()).unwrap_or_else(|| "core".to_string());

    match fans::promote(pool, ids, &bucket).await {
        Ok(updated) => Json(PromoteResponse {
            ok: true,
            updated,
            bucket,
        })
        .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Fan promote failed");
            internal_error()
        }
    }
}

/// Fold a raw payload into row values.
///
/// Consent comes from either `consent` or `consent_sms`; the consent
/// timestamp is only stamped when consent is being granted. A consenting fan
/// defaults into the `core` audience, everyone else into `probation`, unless
/// the payload names a bucket outright. Referral codes and UTM fields accept
/// the alias spellings embedded forms actually send.
fn normalize_fan(payload: &FanPayload) -> NewFan {
    let consent = payload.consent == Some(true) || payload.consent_sms == Some(true);
    let utm = payload.utm.as_ref();
    let audience_bucket = clean(payload.audience_bucket.as_deref())
        .unwrap_or_else(|| if consent { "core" } else { "probation" }.to_string());

    NewFan {
        phone: clean(payload.phone.as_deref()),
        email: clean(payload.email.as_deref()),
        name: clean(payload.name.as_deref()),
        platform: clean(payload.platform.as_deref()),
        source: clean(payload.source.as_deref()),
        invite_code: clean(payload.invite_code.as_deref())
            .or_else(|| clean(payload.r#ref.as_deref()))
            .or_else(|| clean(payload.ref_code.as_deref())),
        utm_source: pick(
            payload.utm_source.as_deref(),
            utm.and_then(|u| u.utm_source.as_deref().or(u.source.as_deref())),
        ),
        utm_medium: pick(
            payload.utm_medium.as_deref(),
            utm.and_then(|u| u.utm_medium.as_deref().or(u.medium.as_deref())),
        ),
        utm_campaign: pick(
            payload.utm_campaign.as_deref(),
            utm.and_then(|u| u.utm_campaign.as_deref().or(u.campaign.as_deref())),
        ),
        utm_term: pick(
            payload.utm_term.as_deref(),
            utm.and_then(|u| u.utm_term.as_deref().or(u.term.as_deref())),
        ),
        utm_content: pick(
            payload.utm_content.as_deref(),
            utm.and_then(|u| u.utm_content.as_deref().or(u.content.as_deref())),
        ),
        consent,
        consent_ts: consent.then(Utc::now),
        audience_bucket,
    }
}

fn pick(flat: Option<&str>, nested: Option<&str>) -> Option<String> {
    clean(flat).or_else(|| clean(nested))
}

/// Shape check only: `local@domain.tld` with no whitespace and a TLD of at
/// least two characters. Deliverability is out of scope here.
fn valid_email_syntax(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, host)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || host.contains('@') {
        return false;
    }
    let Some((domain, tld)) = host.rsplit_once('.') else {
        return false;
    };
    !domain.is_empty() && tld.chars().count() >= 2
}

fn parse_since(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(date.and_time(NaiveTime::MIN).and_utc())
}

/// Export columns, in the order the street-team spreadsheets expect.
const CSV_COLUMNS: [&str; 20] = [
    "id",
    "name",
    "phone",
    "email",
    "platform",
    "source",
    "audience_bucket",
    "invite_code",
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "consent",
    "consent_ts",
    "email_status",
    "bounce_count",
    "last_email_check_at",
    "created_at",
    "updated_at",
];

fn csv_export(rows: &[FanRow]) -> Result<String, serde_json::Error> {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(CSV_COLUMNS.join(","));
    for row in rows {
        let record = serde_json::to_value(row)?;
        let line = CSV_COLUMNS
            .iter()
            .map(|column| match record.get(column) {
                None | Some(serde_json::Value::Null) => String::new(),
                Some(serde_json::Value::String(s)) => csv_field(s),
                Some(other) => csv_field(&other.to_string()),
            })
            .collect::<Vec<_>>()
            .join(",");
        lines.push(line);
    }
    Ok(lines.join("\n"))
}

/// Double embedded quotes, then quote the field if it holds a quote, comma,
/// or newline.
fn csv_field(value: &str) -> String {
    let escaped = value.replace('"', "\"\"");
    if escaped.contains(['"', ',', '\n']) {
        format!("\"{escaped}\"")
    } else {
        escaped
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "unauthorized".to_string(),
        }),
    )
        .into_response()
}

fn bad_request(code: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: code.to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn test_config(fans_token: &str) -> Arc<Config> {
        let mut config = Config::default();
        config.session.secret = "test-secret".to_string();
        config.admin.fans_token = fans_token.to_string();
        Arc::new(config)
    }

    /// Pool that parses but never connects; only pre-query paths may run.
    fn unreachable_db() -> Db {
        let pool =
            PgPool::connect_lazy("postgres://sf:sf@127.0.0.1:9/soundfactory").expect("lazy pool");
        Db::connected(pool)
    }

    fn test_router(config: Arc<Config>, db: Db) -> Router {
        Router::new()
            .route("/fans", get(list_fans).post(submit_fan))
            .layer(Extension(config))
            .layer(Extension(db))
    }

    async fn get_fans(router: Router, uri: &str, auth: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = auth {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let response = router
            .oneshot(builder.body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 1024 * 1024).await.expect("body");
        let json = serde_json::from_slice(&bytes).expect("json body");
        (status, json)
    }

    async fn post_fans(
        router: Router,
        body: serde_json::Value,
        auth: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/fans")
            .header("content-type", "application/json");
        if let Some(token) = auth {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let response = router
            .oneshot(builder.body(Body::from(body.to_string())).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 1024 * 1024).await.expect("body");
        let json = serde_json::from_slice(&bytes).expect("json body");
        (status, json)
    }

    #[tokio::test]
    async fn list_requires_admin_token() {
        let router = test_router(test_config("fans-secret"), unreachable_db());
        let (status, body) = get_fans(router.clone(), "/fans", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");

        let (status, _) = get_fans(router, "/fans", Some("wrong")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn database_check_precedes_auth() {
        let router = test_router(test_config("fans-secret"), Db::none());
        let (status, body) = get_fans(router.clone(), "/fans", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Database not configured");

        let (status, body) = post_fans(router, serde_json::json!({"phone": "+12125551234"}), None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Database not configured");
    }

    #[tokio::test]
    async fn single_upsert_requires_identifier() {
        let router = test_router(test_config(""), unreachable_db());
        let (status, body) = post_fans(
            router,
            serde_json::json!({"name": "DJ Nobody", "consent": true}),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing_identifier");
        assert_eq!(body["message"], "phone or email required");
    }

    #[tokio::test]
    async fn unknown_mode_falls_back_to_single_upsert() {
        let router = test_router(test_config(""), unreachable_db());
        let (status, body) = post_fans(router, serde_json::json!({"mode": "mystery"}), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing_identifier");
    }

    #[tokio::test]
    async fn bulk_mode_is_guarded_and_validates_items() {
        let router = test_router(test_config("fans-secret"), unreachable_db());
        let (status, body) = post_fans(
            router.clone(),
            serde_json::json!({"mode": "bulk", "items": [{"phone": "+12125551234"}]}),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");

        let (status, body) = post_fans(
            router,
            serde_json::json!({"mode": "bulk", "items": []}),
            Some("fans-secret"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "no-items");
    }

    #[tokio::test]
    async fn clean_mode_is_guarded() {
        let router = test_router(test_config("fans-secret"), unreachable_db());
        let (status, body) = post_fans(router, serde_json::json!({"mode": "clean"}), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
    }

    #[tokio::test]
    async fn promote_requires_ids() {
        let router = test_router(test_config(""), unreachable_db());
        let (status, body) = post_fans(router, serde_json::json!({"mode": "promote"}), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "no-ids");
    }

    #[test]
    fn normalize_derives_bucket_from_consent() {
        let consenting = normalize_fan(&FanPayload {
            phone: Some("+12125551234".to_string()),
            consent: Some(true),
            ..FanPayload::default()
        });
        assert_eq!(consenting.audience_bucket, "core");
        assert!(consenting.consent);
        assert!(consenting.consent_ts.is_some());

        let silent = normalize_fan(&FanPayload {
            phone: Some("+12125551234".to_string()),
            ..FanPayload::default()
        });
        assert_eq!(silent.audience_bucket, "probation");
        assert!(!silent.consent);
        assert!(silent.consent_ts.is_none());
    }

    #[test]
    fn normalize_accepts_consent_sms_alias() {
        let fan = normalize_fan(&FanPayload {
            email: Some("fan@example.com".to_string()),
            consent_sms: Some(true),
            ..FanPayload::default()
        });
        assert!(fan.consent);
        assert_eq!(fan.audience_bucket, "core");
    }

    #[test]
    fn normalize_keeps_explicit_bucket() {
        let fan = normalize_fan(&FanPayload {
            email: Some("fan@example.com".to_string()),
            consent: Some(true),
            audience_bucket: Some("vip".to_string()),
            ..FanPayload::default()
        });
        assert_eq!(fan.audience_bucket, "vip");
    }

    #[test]
    fn normalize_resolves_referral_aliases_in_order() {
        let fan = normalize_fan(&FanPayload {
            phone: Some("+12125551234".to_string()),
            r#ref: Some("from-ref".to_string()),
            ref_code: Some("from-ref-code".to_string()),
            ..FanPayload::default()
        });
        assert_eq!(fan.invite_code.as_deref(), Some("from-ref"));

        let fan = normalize_fan(&FanPayload {
            phone: Some("+12125551234".to_string()),
            invite_code: Some("direct".to_string()),
            r#ref: Some("from-ref".to_string()),
            ..FanPayload::default()
        });
        assert_eq!(fan.invite_code.as_deref(), Some("direct"));
    }

    #[test]
    fn normalize_prefers_flat_utm_over_nested() {
        let fan = normalize_fan(&FanPayload {
            email: Some("fan@example.com".to_string()),
            utm_source: Some("flyer".to_string()),
            utm: Some(UtmBlock {
                source: Some("instagram".to_string()),
                medium: Some("bio-link".to_string()),
                utm_campaign: Some("reopening".to_string()),
                ..UtmBlock::default()
            }),
            ..FanPayload::default()
        });
        assert_eq!(fan.utm_source.as_deref(), Some("flyer"));
        assert_eq!(fan.utm_medium.as_deref(), Some("bio-link"));
        assert_eq!(fan.utm_campaign.as_deref(), Some("reopening"));
        assert_eq!(fan.utm_term, None);
    }

    #[test]
    fn normalize_trims_blank_fields_to_none() {
        let fan = normalize_fan(&FanPayload {
            phone: Some("  ".to_string()),
            email: Some(" fan@example.com ".to_string()),
            name: Some(String::new()),
            ..FanPayload::default()
        });
        assert_eq!(fan.phone, None);
        assert_eq!(fan.email.as_deref(), Some("fan@example.com"));
        assert_eq!(fan.name, None);
        assert!(fan.has_identifier());
    }

    #[test]
    fn email_syntax_accepts_plausible_addresses() {
        assert!(valid_email_syntax("fan@example.com"));
        assert!(valid_email_syntax("first.last+tag@mail.example.co"));
        assert!(valid_email_syntax("x@sub.domain.io"));
    }

    #[test]
    fn email_syntax_rejects_malformed_addresses() {
        assert!(!valid_email_syntax(""));
        assert!(!valid_email_syntax("plainaddress"));
        assert!(!valid_email_syntax("no@tld"));
        assert!(!valid_email_syntax("short@tld.x"));
        assert!(!valid_email_syntax("@example.com"));
        assert!(!valid_email_syntax("a@.com"));
        assert!(!valid_email_syntax("spaced name@example.com"));
        assert!(!valid_email_syntax("two@@example.com"));
    }

    #[test]
    fn since_accepts_rfc3339_and_bare_dates() {
        assert_eq!(
            parse_since("2026-03-01T12:30:00Z").map(|t| t.to_rfc3339()),
            Some("2026-03-01T12:30:00+00:00".to_string())
        );
        assert_eq!(
            parse_since("2026-03-01").map(|t| t.to_rfc3339()),
            Some("2026-03-01T00:00:00+00:00".to_string())
        );
        assert_eq!(parse_since("last tuesday"), None);
    }

    #[test]
    fn csv_field_quotes_only_when_needed() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("line\nbreak"), "\"line\nbreak\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn csv_export_emits_header_and_all_columns() {
        let row = FanRow {
            id: Uuid::nil(),
            name: Some("Ana, DJ".to_string()),
            phone: Some("+12125551234".to_string()),
            email: None,
            platform: Some("instagram".to_string()),
            source: None,
            audience_bucket: "core".to_string(),
            invite_code: None,
            utm_source: None,
            utm_medium: None,
            utm_campaign: None,
            utm_term: None,
            utm_content: None,
            consent: true,
            consent_ts: None,
            email_status: None,
            bounce_count: 0,
            last_email_check_at: None,
            created_at: DateTime::default(),
            updated_at: DateTime::default(),
        };

        let csv = csv_export(&[row]).expect("export");
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(CSV_COLUMNS.join(",")).as_deref());

        let data = lines.next().expect("data row");
        assert!(data.starts_with("00000000-0000-0000-0000-000000000000,\"Ana, DJ\",+12125551234,"));
        assert!(data.contains(",core,"));
        assert!(data.contains(",true,"));
        assert!(data.ends_with(",1970-01-01T00:00:00Z,1970-01-01T00:00:00Z"));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// An escaped field never leaks a bare quote outside its surrounding
        /// quotes: every interior quote comes doubled.
        #[test]
        fn csv_field_is_always_safe_to_embed(value in "(?s).{0,64}") {
            let field = csv_field(&value);
            if field.contains(['"', ',', '\n']) {
                prop_assert!(field.starts_with('"') && field.ends_with('"'));
                let interior = &field[1..field.len() - 1];
                let mut chars = interior.chars();
                while let Some(c) = chars.next() {
                    if c == '"' {
                        prop_assert_eq!(chars.next(), Some('"'));
                    }
                }
            }
        }

        /// Whitespace anywhere always fails the email shape check.
        #[test]
        fn email_with_whitespace_never_passes(
            head in "[a-z]{1,8}",
            tail in "[a-z]{1,8}",
            ws in " |\t|\n",
        ) {
            let email = format!("{head}{ws}{tail}@example.com");
            prop_assert!(!valid_email_syntax(&email));
        }
    }
}
