//! The verification pipelines: issue a code over SMS, check a guess, mint a
//! session token.
//!
//! All policy lives here (rate limits, attempt caps, expiry, demo mode) so
//! the HTTP layer only translates outcomes to responses. Error variants
//! carry the exact client-facing messages; anything more specific is logged
//! server-side only.

use chrono::{DateTime, Utc};
use sf_auth::{Claims, SessionKeys, TokenError};
use sf_phone::{Phone, PhoneError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::Db;
use crate::sms::{SmsError, SmsSender};
use crate::verification::limits::RateLimits;
use crate::verification::repo;
use crate::verification::store::{CodeRecord, CodeStore};

/// Pause before answering any failed guess. "No code", "expired", and
/// "wrong code" all take the same time and return the same message.
const ANTI_ENUMERATION_DELAY: Duration = Duration::from_millis(150);

/// Errors from issuing a code. `Display` is the client-facing message.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("Invalid phone format")]
    InvalidPhone(#[from] PhoneError),
    #[error("Too many requests")]
    IpRateLimited,
    #[error("Send limit reached, try later")]
    PhoneRateLimited,
    #[error("Failed to dispatch SMS")]
    Dispatch(#[source] SmsError),
}

/// Errors from verifying a guess. `Display` is the client-facing message.
///
/// `CodeMismatch` covers no active code, an expired code, and a wrong code
/// alike, so responses never reveal whether a given phone number is
/// mid-verification.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("Invalid code")]
    MalformedCode,
    #[error("Invalid phone format")]
    InvalidPhone(#[from] PhoneError),
    #[error("Invalid code or expired")]
    CodeMismatch,
    #[error("Too many attempts")]
    TooManyAttempts,
    #[error("Failed to issue session")]
    Token(#[from] TokenError),
}

/// Outcome of a successful `/send-sms`.
#[derive(Debug)]
pub struct CodeIssued {
    pub phone: Phone,
    pub expires_in: u64,
    /// The plaintext code, present only in demo mode.
    pub demo_code: Option<String>,
}

/// Outcome of a successful `/verify-sms`.
#[derive(Debug)]
pub struct SessionIssued {
    pub phone: Phone,
    pub token: String,
    pub issued_at: u64,
    pub expires_in: u64,
}

/// Shared verification engine, one per process.
pub struct VerificationService {
    store: Arc<dyn CodeStore>,
    sender: Arc<dyn SmsSender>,
    db: Db,
    limits: RateLimits,
    keys: SessionKeys,
    demo: bool,
    pepper: String,
    code_ttl_secs: u64,
    session_ttl_secs: u64,
    max_attempts: u32,
}

impl VerificationService {
    #[must_use]
    pub fn new(
        config: &Config,
        store: Arc<dyn CodeStore>,
        sender: Arc<dyn SmsSender>,
        db: Db,
    ) -> Self {
        Self {
            store,
            sender,
            db,
            limits: RateLimits::new(&config.limits),
            keys: SessionKeys::new(&config.session.secret),
            demo: config.sms.is_demo(),
            pepper: config.sms.pepper.clone(),
            code_ttl_secs: config.sms.code_ttl_secs,
            session_ttl_secs: config.session.ttl_secs,
            max_attempts: config.limits.max_attempts,
        }
    }

    /// True when codes are returned in responses instead of sent over SMS.
    #[must_use]
    pub const fn is_demo(&self) -> bool {
        self.demo
    }

    /// Shared limiter handle, for the periodic maintenance task.
    #[must_use]
    pub const fn limits(&self) -> &RateLimits {
        &self.limits
    }

    /// Verify a bearer session token, returning its claims.
    #[must_use]
    pub fn verify_session(&self, token: &str) -> Option<Claims> {
        self.keys.verify(token)
    }

    /// Issue a fresh code for a phone number and dispatch it.
    ///
    /// A new code always replaces any active one for the same number, with
    /// the attempt counter reset.
    ///
    /// # Errors
    /// Returns [`SendError`] when the caller is rate limited, the phone
    /// cannot be normalized, or dispatch fails.
    pub async fn send_code(
        &self,
        raw_phone: &str,
        client_ip: Option<&str>,
    ) -> Result<CodeIssued, SendError> {
        if !self.limits.check_ip(client_ip) {
            info!(ip = ?client_ip, "send rejected: IP rate limit");
            return Err(SendError::IpRateLimited);
        }

        let phone = sf_phone::normalize(raw_phone)?;

        if !self.limits.check_phone(phone.as_str()) {
            info!(phone = %phone, "send rejected: per-phone rate limit");
            return Err(SendError::PhoneRateLimited);
        }

        let code = sf_auth::generate_code();
        let code_hash = sf_auth::hash_code(&code, phone.as_str(), &self.pepper);
        let expires_at = expiry_from_now(self.code_ttl_secs);

        self.store
            .put(
                phone.as_str(),
                CodeRecord {
                    code_hash: code_hash.clone(),
                    expires_at,
                    attempts: 0,
                },
            )
            .await;
        self.mirror_insert(phone.as_str(), &code_hash, expires_at)
            .await;

        if self.demo {
            info!(phone = %phone, "demo mode: code returned in response, no SMS sent");
            return Ok(CodeIssued {
                phone,
                expires_in: self.code_ttl_secs,
                demo_code: Some(code),
            });
        }

        let body = format!("Your Sound Factory code: {code}");
        self.sender
            .send(phone.as_str(), &body)
            .await
            .map_err(|err| {
                warn!(phone = %phone, error = %err, "SMS dispatch failed");
                SendError::Dispatch(err)
            })?;

        info!(phone = %phone, "verification code sent");
        Ok(CodeIssued {
            phone,
            expires_in: self.code_ttl_secs,
            demo_code: None,
        })
    }

    /// Check a guessed code and, on success, consume it and mint a session
    /// token.
    ///
    /// # Errors
    /// Returns [`VerifyError`] on malformed input, mismatch, expiry, or when
    /// the attempt cap is reached. The cap is checked before the comparison,
    /// so a correct guess after the cap still fails.
    pub async fn verify_code(
        &self,
        raw_phone: &str,
        code: &str,
    ) -> Result<SessionIssued, VerifyError> {
        if !is_well_formed_code(code) {
            return Err(VerifyError::MalformedCode);
        }

        let phone = sf_phone::normalize(raw_phone)?;

        let Some(record) = self.lookup_active(phone.as_str()).await else {
            sleep(ANTI_ENUMERATION_DELAY).await;
            return Err(VerifyError::CodeMismatch);
        };

        if record.attempts >= self.max_attempts {
            info!(phone = %phone, "verification locked: attempt cap reached");
            return Err(VerifyError::TooManyAttempts);
        }

        let attempts = self
            .store
            .increment_attempts(phone.as_str())
            .await
            .unwrap_or_else(|| record.attempts.saturating_add(1));

        let expected = sf_auth::hash_code(code, phone.as_str(), &self.pepper);
        if expected != record.code_hash {
            self.mirror_attempts(phone.as_str(), attempts).await;
            sleep(ANTI_ENUMERATION_DELAY).await;
            return Err(VerifyError::CodeMismatch);
        }

        // Single use: the code dies on first success.
        self.store.delete(phone.as_str()).await;
        self.mirror_consume(phone.as_str(), attempts).await;

        let claims = Claims::new(phone.as_str(), Duration::from_secs(self.session_ttl_secs));
        let token = self.keys.sign(&claims)?;

        info!(phone = %phone, "phone verified, session issued");
        Ok(SessionIssued {
            phone,
            token,
            issued_at: claims.iat,
            expires_in: self.session_ttl_secs,
        })
    }

    /// Active record for a phone: memory first, then the Postgres mirror.
    /// A mirror hit is cached back into memory so the attempt counter
    /// advances locally from then on.
    async fn lookup_active(&self, phone: &str) -> Option<CodeRecord> {
        if let Some(record) = self.store.get(phone).await {
            return Some(record);
        }

        let pool = self.db.pool()?;
        match repo::fetch_active(pool, phone).await {
            Ok(Some(row)) => {
                let record = CodeRecord {
                    code_hash: row.code_hash,
                    expires_at: row.expires_at,
                    attempts: u32::try_from(row.attempts).unwrap_or(0),
                };
                self.store.put(phone, record.clone()).await;
                Some(record)
            }
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, "verification mirror lookup failed");
                None
            }
        }
    }

    async fn mirror_insert(&self, phone: &str, code_hash: &str, expires_at: DateTime<Utc>) {
        if let Some(pool) = self.db.pool() {
            if let Err(err) = repo::insert(pool, phone, code_hash, expires_at).await {
                warn!(error = %err, "failed to mirror issued code");
            }
        }
    }

    async fn mirror_attempts(&self, phone: &str, attempts: u32) {
        if let Some(pool) = self.db.pool() {
            if let Err(err) = repo::record_attempts(pool, phone, attempts).await {
                warn!(error = %err, "failed to mirror attempt count");
            }
        }
    }

    async fn mirror_consume(&self, phone: &str, attempts: u32) {
        if let Some(pool) = self.db.pool() {
            if let Err(err) = repo::consume(pool, phone, attempts).await {
                warn!(error = %err, "failed to mirror consumption");
            }
        }
    }
}

fn is_well_formed_code(code: &str) -> bool {
    code.len() == sf_auth::CODE_LENGTH && code.chars().all(|c| c.is_ascii_digit())
}

fn expiry_from_now(ttl_secs: u64) -> DateTime<Utc> {
    Utc::now() + chrono::Duration::seconds(i64::try_from(ttl_secs).unwrap_or(i64::MAX))
}
