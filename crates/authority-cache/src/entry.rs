//! The persisted wrapper around a cached decision.

use std::time::Duration;

use authority_core::Decision;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Default time-to-live for cached decisions: 5 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// A cached decision with its creation time and time-to-live.
///
/// An entry is valid iff `now - created_at < ttl_ms`. Backends without
/// native expiration delete invalid entries lazily on read; entries are
/// never mutated in place, only replaced wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The stored decision, with `cached = false` baked in so a future
    /// read can rewrite it.
    pub decision: Decision,

    /// Creation time, unix milliseconds.
    pub created_at: i64,

    /// Time-to-live in milliseconds.
    pub ttl_ms: u64,
}

impl CacheEntry {
    /// Wrap a decision in a fresh entry.
    #[must_use]
    pub fn new(decision: Decision, ttl: Duration) -> Self {
        Self {
            decision,
            created_at: now_ms(),
            ttl_ms: ttl.as_millis() as u64,
        }
    }

    /// Whether this entry is past its time-to-live.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        now_ms().saturating_sub(self.created_at) >= self.ttl_ms as i64
    }
}

fn now_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
