//! Dual-backend decision cache: Redis (persistent) or DashMap (fallback).

use std::sync::Arc;
use std::time::Duration;

use authority_core::{CacheSource, Decision};
use dashmap::DashMap;
use deadpool_redis::Pool;
use redis::AsyncCommands;
use serde::Serialize;

use crate::entry::CacheEntry;
use crate::error::CacheError;
use crate::key;

/// Decision cache over one of two interchangeable backends.
///
/// ## Backends
///
/// - **Redis**: persistent, survives restarts, native per-key expiration.
/// - **Memory**: in-process DashMap, volatile, lazy expiry-on-read.
///
/// The backend is chosen once at startup (see the server's factory) and
/// never re-selected. All failure paths degrade to a miss or no-op; a
/// cache fault never fails the authorization request it serves.
#[derive(Clone)]
pub enum DecisionCache {
    /// Persistent key-value store.
    Redis { pool: Pool },

    /// In-process fallback map.
    Memory(Arc<DashMap<String, CacheEntry>>),
}

impl DecisionCache {
    /// Create an in-process, memory-only cache.
    #[must_use]
    pub fn new_memory() -> Self {
        DecisionCache::Memory(Arc::new(DashMap::new()))
    }

    /// Create a Redis-backed cache from an established pool.
    #[must_use]
    pub fn new_redis(pool: Pool) -> Self {
        DecisionCache::Redis { pool }
    }

    /// Name of the active backend, for diagnostics.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        match self {
            DecisionCache::Redis { .. } => "redis",
            DecisionCache::Memory(_) => "memory",
        }
    }

    /// Cache source recorded on decisions served by this backend.
    #[must_use]
    pub fn source(&self) -> CacheSource {
        match self {
            DecisionCache::Redis { .. } => CacheSource::Store,
            DecisionCache::Memory(_) => CacheSource::Memory,
        }
    }

    /// Look up a cached decision.
    ///
    /// An expired entry is deleted and reported absent. On a hit the
    /// decision comes back with `cached = true` and the active backend as
    /// its `cache_source`.
    pub async fn get(&self, cache_key: &str) -> Option<Decision> {
        let result = match self {
            DecisionCache::Memory(map) => Self::memory_get(map, cache_key),
            DecisionCache::Redis { pool } => match Self::redis_get(pool, cache_key).await {
                Ok(decision) => decision,
                Err(e) => {
                    tracing::warn!(key = %cache_key, error = %e, "cache get failed, treating as miss");
                    None
                }
            },
        };

        if result.is_some() {
            metrics::counter!("authority_cache_hits_total", "backend" => self.backend_name())
                .increment(1);
        } else {
            metrics::counter!("authority_cache_misses_total", "backend" => self.backend_name())
                .increment(1);
        }

        result
    }

    /// Store a decision with the given time-to-live.
    ///
    /// The stored copy always carries `cached = false`, whatever the input
    /// says, so a future `get` can safely rewrite it. Write failures are
    /// logged and dropped.
    pub async fn set(&self, cache_key: &str, decision: &Decision, ttl: Duration) {
        let mut stored = decision.clone();
        stored.metadata.cached = false;
        stored.metadata.cache_source = None;
        let entry = CacheEntry::new(stored, ttl);

        match self {
            DecisionCache::Memory(map) => {
                map.insert(cache_key.to_string(), entry);
            }
            DecisionCache::Redis { pool } => {
                if let Err(e) = Self::redis_set(pool, cache_key, &entry, ttl).await {
                    tracing::warn!(key = %cache_key, error = %e, "cache set failed, dropping entry");
                }
            }
        }
    }

    /// Delete every entry belonging to one principal.
    ///
    /// Returns the number of entries removed. Entries of other principals
    /// are never touched.
    pub async fn invalidate_principal(&self, principal_id: &str) -> usize {
        let prefix = key::principal_prefix(principal_id);

        let removed = match self {
            DecisionCache::Memory(map) => Self::memory_remove_prefix(map, &prefix),
            DecisionCache::Redis { pool } => {
                match Self::redis_remove_pattern(pool, &format!("{prefix}*")).await {
                    Ok(count) => count,
                    Err(e) => {
                        tracing::warn!(principal = %principal_id, error = %e, "cache invalidation failed");
                        0
                    }
                }
            }
        };

        tracing::debug!(principal = %principal_id, removed, "invalidated cached decisions");
        removed
    }

    /// Delete every entry under the `authority:` namespace.
    ///
    /// Keys outside the namespace are untouched, so sharing the backend
    /// with other subsystems is safe.
    pub async fn clear(&self) {
        match self {
            DecisionCache::Memory(map) => {
                Self::memory_remove_prefix(map, key::NAMESPACE);
            }
            DecisionCache::Redis { pool } => {
                let pattern = format!("{}*", key::NAMESPACE);
                if let Err(e) = Self::redis_remove_pattern(pool, &pattern).await {
                    tracing::warn!(error = %e, "cache clear failed");
                }
            }
        }
        tracing::debug!("authorization cache cleared");
    }

    /// Best-effort count of live entries plus backend diagnostics.
    ///
    /// On Redis this is a full namespace scan; the count is approximate
    /// under concurrent writes.
    pub async fn stats(&self) -> CacheStats {
        match self {
            DecisionCache::Memory(map) => CacheStats {
                entries: map.len(),
                backend: "memory",
                durable: false,
            },
            DecisionCache::Redis { pool } => {
                let pattern = format!("{}*", key::NAMESPACE);
                let entries = match Self::redis_count_pattern(pool, &pattern).await {
                    Ok(count) => count,
                    Err(e) => {
                        tracing::warn!(error = %e, "cache stats scan failed");
                        0
                    }
                };
                CacheStats {
                    entries,
                    backend: "redis",
                    durable: true,
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Memory backend
    // -------------------------------------------------------------------------

    fn memory_get(map: &DashMap<String, CacheEntry>, cache_key: &str) -> Option<Decision> {
        let entry = map.get(cache_key)?;
        if entry.is_expired() {
            drop(entry);
            map.remove(cache_key);
            return None;
        }
        let mut decision = entry.decision.clone();
        decision.mark_cached(CacheSource::Memory);
        Some(decision)
    }

    fn memory_remove_prefix(map: &DashMap<String, CacheEntry>, prefix: &str) -> usize {
        let keys: Vec<String> = map
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect();

        keys.into_iter()
            .filter(|k| map.remove(k).is_some())
            .count()
    }

    // -------------------------------------------------------------------------
    // Redis backend
    // -------------------------------------------------------------------------

    async fn redis_get(pool: &Pool, cache_key: &str) -> Result<Option<Decision>, CacheError> {
        let mut conn = pool.get().await?;

        let raw: Option<Vec<u8>> = conn.get(cache_key).await?;
        let Some(raw) = raw else {
            return Ok(None);
        };

        let entry: CacheEntry = rmp_serde::from_slice(&raw)?;
        if entry.is_expired() {
            // Native expiry rounds to whole seconds; delete the stale tail.
            let _: () = conn.del(cache_key).await?;
            return Ok(None);
        }

        let mut decision = entry.decision;
        decision.mark_cached(CacheSource::Store);
        Ok(Some(decision))
    }

    async fn redis_set(
        pool: &Pool,
        cache_key: &str,
        entry: &CacheEntry,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let payload = rmp_serde::to_vec_named(entry)?;
        let mut conn = pool.get().await?;

        // SETEX rejects a zero TTL; entries carry their own ttl_ms and are
        // re-checked on read, so rounding up is safe.
        let ttl_secs = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(cache_key, payload, ttl_secs).await?;
        Ok(())
    }

    async fn redis_remove_pattern(pool: &Pool, pattern: &str) -> Result<usize, CacheError> {
        let mut conn = pool.get().await?;

        let keys = {
            let mut iter: redis::AsyncIter<'_, String> = conn.scan_match(pattern).await?;
            let mut keys = Vec::new();
            while let Some(k) = iter.next_item().await {
                keys.push(k);
            }
            keys
        };

        if keys.is_empty() {
            return Ok(0);
        }

        let removed: usize = conn.del(&keys).await?;
        Ok(removed)
    }

    async fn redis_count_pattern(pool: &Pool, pattern: &str) -> Result<usize, CacheError> {
        let mut conn = pool.get().await?;
        let mut iter: redis::AsyncIter<'_, String> = conn.scan_match(pattern).await?;
        let mut count = 0;
        while iter.next_item().await.is_some() {
            count += 1;
        }
        Ok(count)
    }
}

/// Diagnostics snapshot of the cache.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Best-effort count of live entries.
    pub entries: usize,

    /// Active backend: `"redis"` or `"memory"`.
    pub backend: &'static str,

    /// Whether entries survive a process restart.
    pub durable: bool,
}
