//! Authorization decision types.
//!
//! A [`Decision`] is produced by the decision engine with `cached = false`
//! and is only ever marked as cached by the cache store on a successful
//! hit. The engine itself is cache-unaware.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Which cache backend served a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheSource {
    /// The persistent key-value store.
    Store,
    /// The in-process fallback map.
    Memory,
}

impl std::fmt::Display for CacheSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store => write!(f, "store"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Observability metadata attached to every decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionMetadata {
    /// Resource the decision applies to.
    pub resource: String,

    /// Operation the decision applies to.
    pub operation: String,

    /// Roles that were in effect when the decision was made.
    pub roles: Vec<String>,

    /// Wall-clock time spent computing the decision, in milliseconds.
    ///
    /// Recorded for observability only; not part of the decision's truth
    /// value and excluded from determinism comparisons.
    pub execution_time_ms: f64,

    /// When the decision was computed.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,

    /// Whether this decision was served from the cache.
    pub cached: bool,

    /// Backend that served the cached decision, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_source: Option<CacheSource>,
}

/// Result of an authorization check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    /// Whether access is granted.
    pub allowed: bool,

    /// Human-readable justification, always present.
    pub reason: String,

    /// Observability metadata.
    pub metadata: DecisionMetadata,
}

impl Decision {
    /// Create an allow decision. `cached` starts out `false`.
    #[must_use]
    pub fn allow(reason: impl Into<String>, metadata: DecisionMetadata) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
            metadata,
        }
    }

    /// Create a deny decision. `cached` starts out `false`.
    #[must_use]
    pub fn deny(reason: impl Into<String>, metadata: DecisionMetadata) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
            metadata,
        }
    }

    /// Rewrite the decision as served-from-cache.
    ///
    /// Only the cache store calls this, on a successful hit.
    pub fn mark_cached(&mut self, source: CacheSource) {
        self.metadata.cached = true;
        self.metadata.cache_source = Some(source);
    }
}

impl DecisionMetadata {
    /// Metadata for a freshly computed decision.
    #[must_use]
    pub fn computed(
        resource: impl Into<String>,
        operation: impl Into<String>,
        roles: Vec<String>,
        execution_time_ms: f64,
    ) -> Self {
        Self {
            resource: resource.into(),
            operation: operation.into(),
            roles,
            execution_time_ms,
            timestamp: OffsetDateTime::now_utc(),
            cached: false,
            cache_source: None,
        }
    }
}
