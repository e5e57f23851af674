//! HTTP surface of the authority decision gateway.
//!
//! Wires the decision engine and the dual-backend cache into four flows:
//! single check, batch check, scoped invalidation, and status
//! introspection.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod identity;
pub mod metrics;
pub mod observability;
pub mod server;

pub use config::{AppConfig, AuthSettings, CacheSettings, RedisConfig, ServerConfig};
pub use error::ApiError;
pub use identity::{IdentityResolver, ResolvedIdentity, StaticTokenResolver};
pub use observability::{apply_logging_level, init_tracing};
pub use server::{AppState, AuthorityServer, ServerBuilder, build_app};

use authority_cache::DecisionCache;

/// Create the decision cache backend from configuration.
///
/// ## Backend selection
///
/// - **Redis disabled**: in-process cache only.
/// - **Redis enabled**: attempt to connect; any failure falls back to the
///   in-process cache for the lifetime of the process (no later retry).
pub async fn create_decision_cache(config: &RedisConfig) -> DecisionCache {
    use std::time::Duration;

    if !config.enabled {
        tracing::info!("Redis disabled, using in-process cache only");
        return DecisionCache::new_memory();
    }

    tracing::info!(url = %config.url, "Connecting to Redis");

    let mut redis_config = deadpool_redis::Config::from_url(&config.url);
    if let Some(ref mut pool_config) = redis_config.pool {
        pool_config.max_size = config.pool_size;
        pool_config.timeouts.wait = Some(Duration::from_millis(config.timeout_ms));
        pool_config.timeouts.create = Some(Duration::from_millis(config.timeout_ms));
        pool_config.timeouts.recycle = Some(Duration::from_millis(config.timeout_ms));
    }

    let pool = match redis_config.create_pool(Some(deadpool_redis::Runtime::Tokio1)) {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Failed to create Redis pool. Falling back to in-process cache."
            );
            return DecisionCache::new_memory();
        }
    };

    match pool.get().await {
        Ok(_) => {
            tracing::info!("Connected to Redis, decisions cached durably");
            DecisionCache::new_redis(pool)
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Failed to connect to Redis. Falling back to in-process cache."
            );
            DecisionCache::new_memory()
        }
    }
}
