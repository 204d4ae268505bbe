//! Send-side rate limiting.
//!
//! Two independent keyed limiters guard `/send-sms`: one per client IP
//! (fast window, absorbs scripted abuse) and one per phone number (slow
//! window, stops SMS-bombing a victim). The client IP comes from the first
//! `X-Forwarded-For` entry; requests with no forwarded address bypass the
//! IP limiter, matching the proxy-fronted deployments this service targets.

use axum::http::HeaderMap;
use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;

use crate::config::LimitsConfig;

type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Keyed limiters shared across requests.
pub struct RateLimits {
    per_ip: KeyedLimiter,
    per_phone: KeyedLimiter,
}

impl RateLimits {
    #[must_use]
    pub fn new(config: &LimitsConfig) -> Self {
        Self {
            per_ip: RateLimiter::keyed(Quota::per_minute(nonzero(config.ip_per_minute))),
            per_phone: RateLimiter::keyed(Quota::per_hour(nonzero(config.phone_per_hour))),
        }
    }

    /// Check the per-IP quota. `None` (no forwarded address) is allowed.
    #[must_use]
    pub fn check_ip(&self, ip: Option<&str>) -> bool {
        ip.map_or(true, |ip| self.per_ip.check_key(&ip.to_string()).is_ok())
    }

    /// Check the per-phone quota.
    #[must_use]
    pub fn check_phone(&self, phone: &str) -> bool {
        self.per_phone.check_key(&phone.to_string()).is_ok()
    }

    /// Drop limiter state for keys that have gone quiet. Called from the
    /// periodic cleanup task so the maps stay bounded.
    pub fn retain_recent(&self) {
        self.per_ip.retain_recent();
        self.per_phone.retain_recent();
    }
}

/// First entry of `X-Forwarded-For`, trimmed. `None` when the header is
/// missing or empty.
#[must_use]
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get("x-forwarded-for")?.to_str().ok()?;
    let first = raw.split(',').next()?.trim();
    if first.is_empty() {
        None
    } else {
        Some(first.to_string())
    }
}

// Config validation rejects zero quotas before this is reached.
fn nonzero(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN)
}
