//! Cache-internal error types.
//!
//! These never cross the crate boundary as failures: the public
//! [`DecisionCache`](crate::DecisionCache) operations catch them, log them,
//! and degrade to a miss or no-op.

/// Errors that can occur inside a cache backend operation.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Could not check out a connection from the Redis pool.
    #[error("Redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    /// A Redis command failed.
    #[error("Redis command error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Failed to encode a cache entry for storage.
    #[error("Failed to encode cache entry: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Failed to decode a stored cache entry.
    #[error("Failed to decode cache entry: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}
