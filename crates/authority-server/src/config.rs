use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Redis configuration for the persistent decision cache
    #[serde(default)]
    pub redis: RedisConfig,
    /// Cache behavior configuration
    #[serde(default)]
    pub cache: CacheSettings,
    /// Bearer token resolution configuration
    #[serde(default)]
    pub auth: AuthSettings,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        if self.cache.decision_ttl_ms == 0 {
            return Err("cache.decision_ttl_ms must be > 0".into());
        }
        if self.redis.enabled {
            if self.redis.url.is_empty() {
                return Err("redis.enabled=true requires redis.url".into());
            }
            if self.redis.pool_size == 0 {
                return Err("redis.pool_size must be > 0".into());
            }
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    /// Time-to-live applied to cached decisions.
    pub fn decision_ttl(&self) -> Duration {
        Duration::from_millis(self.cache.decision_ttl_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Redis configuration for the persistent decision cache.
///
/// The persistent backend is attempted once at startup; on any failure the
/// service falls back to the in-process map for its whole lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Attempt the persistent backend (gracefully degrades without it)
    #[serde(default = "default_redis_enabled")]
    pub enabled: bool,

    /// Redis connection URL (e.g., "redis://localhost:6379")
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Connection pool size
    #[serde(default = "default_redis_pool_size")]
    pub pool_size: usize,

    /// Connection timeout in milliseconds
    #[serde(default = "default_redis_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_redis_enabled() -> bool {
    true
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_redis_pool_size() -> usize {
    10
}

fn default_redis_timeout_ms() -> u64 {
    5000
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            enabled: default_redis_enabled(),
            url: default_redis_url(),
            pool_size: default_redis_pool_size(),
            timeout_ms: default_redis_timeout_ms(),
        }
    }
}

/// Cache behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Decision cache TTL in milliseconds
    #[serde(default = "default_decision_ttl_ms")]
    pub decision_ttl_ms: u64,
}

fn default_decision_ttl_ms() -> u64 {
    300_000 // 5 minutes
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            decision_ttl_ms: default_decision_ttl_ms(),
        }
    }
}

/// Bearer token resolution configuration.
///
/// Maps opaque bearer tokens to a principal id and a single role. The role
/// defaults to `customer` when omitted; tokens not in the map resolve to
/// the anonymous principal.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthSettings {
    #[serde(default)]
    pub tokens: HashMap<String, TokenIdentity>,
}

/// Identity behind one configured bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenIdentity {
    pub user_id: String,
    #[serde(default)]
    pub role: Option<String>,
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if pathbuf.exists() {
                    builder = builder.add_source(File::from(pathbuf));
                }
            }
            None => {
                let default_path = PathBuf::from("authority.toml");
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Environment variable overrides, e.g., AUTHORITY__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("AUTHORITY")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_port_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.server.port = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.cache.decision_ttl_ms = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn bad_log_level_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.logging.level = "verbose".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn decision_ttl_converts_to_duration() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.decision_ttl(), std::time::Duration::from_secs(300));
    }
}
