//! Configuration for the standings service.

use serde::{Deserialize, Serialize};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

fn default_database_path() -> String {
    "data/f1.sqlite".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

/// OpenF1 API client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenF1Config {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
    /// Minimum pause between requests, in seconds
    #[serde(default = "default_min_delay_secs")]
    pub min_delay_secs: f64,
    /// Maximum pause between requests, in seconds
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: f64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    crate::openf1::BASE_URL.to_string()
}

fn default_requests_per_minute() -> u32 {
    30
}

fn default_min_delay_secs() -> f64 {
    0.0
}

fn default_max_delay_secs() -> f64 {
    1.0
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for OpenF1Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            requests_per_minute: default_requests_per_minute(),
            min_delay_secs: default_min_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Standings cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_cache_dir")]
    pub dir: String,
    /// Entry lifetime in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_dir() -> String {
    "data/cache/standings".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            dir: default_cache_dir(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub openf1: OpenF1Config,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Load configuration from environment and config file
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config").required(false))
            // F1_SERVER__PORT, F1_DATABASE__PATH, F1_CACHE__TTL_SECS, ...
            .add_source(
                config::Environment::with_prefix("F1")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
