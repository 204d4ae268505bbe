//! In-memory verification code store.
//!
//! A record lives for the configured TTL and is removed on first successful
//! verification. The trait exists so a shared backend can slot in behind the
//! same service logic; [`MemoryCodeStore`] is the per-instance default.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One issued verification code, stored hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRecord {
    /// `SHA-256(code:phone:pepper)` as lowercase hex.
    pub code_hash: String,
    /// Instant after which the code is dead regardless of attempts left.
    pub expires_at: DateTime<Utc>,
    /// Wrong guesses so far.
    pub attempts: u32,
}

impl CodeRecord {
    /// True once the expiry has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Storage for active verification codes, keyed by E.164 phone number.
///
/// Implementations enforce the single-active-code rule (`put` replaces any
/// existing record) and never hand back expired records.
#[async_trait]
pub trait CodeStore: Send + Sync {
    /// Insert or replace the record for a phone number.
    async fn put(&self, phone: &str, record: CodeRecord);

    /// Fetch the active record, if one exists and has not expired.
    async fn get(&self, phone: &str) -> Option<CodeRecord>;

    /// Bump the attempt counter, returning the new count. `None` when no
    /// active record exists.
    async fn increment_attempts(&self, phone: &str) -> Option<u32>;

    /// Drop the record, if any.
    async fn delete(&self, phone: &str);
}

/// Per-instance store backed by a `HashMap`. Expired entries are pruned on
/// every write.
#[derive(Clone, Default)]
pub struct MemoryCodeStore {
    entries: Arc<RwLock<HashMap<String, CodeRecord>>>,
}

impl MemoryCodeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn prune_expired(entries: &mut HashMap<String, CodeRecord>) {
        let now = Utc::now();
        entries.retain(|_, record| record.expires_at > now);
    }
}

#[async_trait]
impl CodeStore for MemoryCodeStore {
    async fn put(&self, phone: &str, record: CodeRecord) {
        let mut entries = self.entries.write().await;
        Self::prune_expired(&mut entries);
        entries.insert(phone.to_string(), record);
    }

    async fn get(&self, phone: &str) -> Option<CodeRecord> {
        let entries = self.entries.read().await;
        entries.get(phone).filter(|r| !r.is_expired()).cloned()
    }

    async fn increment_attempts(&self, phone: &str) -> Option<u32> {
        let mut entries = self.entries.write().await;
        Self::prune_expired(&mut entries);
        let record = entries.get_mut(phone)?;
        record.attempts = record.attempts.saturating_add(1);
        Some(record.attempts)
    }

    async fn delete(&self, phone: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(phone);
    }
}
