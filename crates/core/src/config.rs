//! Configuration types

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Tiered cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Empty means memory only
    pub redis_url: String,
    pub default_ttl_secs: u64,
    pub health_check_interval_ms: u64,
    pub operation_timeout_ms: u64,
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    /// Never zero
    pub fn health_check_interval(&self) -> Duration {
        Duration::from_millis(self.health_check_interval_ms.max(1))
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            default_ttl_secs: 30,
            health_check_interval_ms: 2000,
            operation_timeout_ms: 1000,
        }
    }
}

/// Per-upstream client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub enabled: bool,
    /// Empty uses the provider's public endpoint
    pub base_url: String,
    pub min_request_interval_ms: u64,
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_retry_delay_ms: u64,
    pub request_timeout_secs: u64,
}

impl SourceConfig {
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Default::default()
        }
    }

    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }

    pub fn base_retry_delay(&self) -> Duration {
        Duration::from_millis(self.base_retry_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: String::new(),
            min_request_interval_ms: 200,  // 5 req/s
            max_retries: 3,
            base_retry_delay_ms: 500,
            request_timeout_secs: 10,
        }
    }
}

/// Both upstream providers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub dexscreener: SourceConfig,
    pub jupiter: SourceConfig,
}

/// Search, merge and listing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    pub search_ttl_secs: u64,
    pub default_query: String,
    pub default_limit: usize,
}

impl AggregatorConfig {
    pub fn search_ttl(&self) -> Duration {
        Duration::from_secs(self.search_ttl_secs)
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            search_ttl_secs: 60,
            default_query: "SOL".to_string(),
            default_limit: 20,
        }
    }
}

/// Background refresh configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub enabled: bool,
    pub interval_ms: u64,
    pub query: String,
    /// Multiplicative price jitter bound (0.005 = ±0.5%)
    pub price_jitter: f64,
    /// Absolute jitter bound on the 24h change
    pub change_jitter: f64,
    pub seed_tracked: Vec<String>,
}

impl RefreshConfig {
    /// Never zero
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 5000,
            query: "MOODENG".to_string(),
            price_jitter: 0.005,
            change_jitter: 0.1,
            seed_tracked: vec!["MOODENG".to_string()],
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub sources: SourcesConfig,
    pub aggregator: AggregatorConfig,
    pub refresh: RefreshConfig,
}
