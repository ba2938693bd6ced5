//! # Configuration Management for TagCache
//!
//! This crate provides centralized configuration structures for the tagged
//! cache adapter and its event system.
//!
//! ## Quick Start
//!
//! ### Programmatic Configuration
//! ```rust
//! use config::{CacheConfig, SignalConfig};
//!
//! let cache_config = CacheConfig::new("redis://localhost:6379".to_string())
//!     .with_default_ttl(3600)
//!     .with_namespace("myapp");
//!
//! let signal_config = SignalConfig::new(true, 64);
//! ```
//!
//! ### TOML File Configuration
//! ```toml
//! [cache]
//! redis_url = "redis://localhost:6379"
//! key_prefix = ""
//! default_ttl = 0
//! namespace = "tagcache"
//! namespace_separator = ":"
//! connection_timeout_ms = 5000
//!
//! [signal]
//! enabled = true
//! max_callbacks = 64
//! ```
//!
//! Load configuration:
//! ```rust,no_run
//! use config::AppConfig;
//!
//! // Load from tagcache.toml
//! let config = AppConfig::load()?;
//!
//! // Or load from custom path
//! let config = AppConfig::from_file("config/production.toml")?;
//! # Ok::<(), config::ConfigError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::{env, path::Path};
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "./tagcache.toml";
const CONFIG_PATH_ENV: &str = "TAGCACHE_CONFIG";

/// Largest TTL Redis accepts: the expiry is kept in milliseconds as an i64
pub const MAX_TTL_SECONDS: u64 = (i64::MAX / 1000) as u64;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Environment variable error: {0}")]
    Env(#[from] env::VarError),
    #[error("Dotenvy error: {0}")]
    Dotenvy(#[from] dotenvy::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub signal: SignalConfig,
}

/// Cache adapter configuration
///
/// Built once per adapter and never mutated afterwards. Changing the TTL or
/// namespace means building a new adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Redis connection string (redis://localhost:6379)
    pub redis_url: String,
    /// Client-level prefix the backend adds to every key it sends
    pub key_prefix: String,
    /// Default TTL in seconds, 0 disables expiry
    pub default_ttl: u64,
    /// Namespace applied in front of every logical key
    pub namespace: String,
    /// Separator between namespace and logical key
    pub namespace_separator: String,
    pub connection_timeout_ms: u64,
}

/// Event system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub enabled: bool,
    pub max_callbacks: usize,
}

impl AppConfig {
    /// Load configuration from TOML file specified in .env or defaults
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env file is fine, the variable may come from the environment
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                return Err(err.into());
            }
        }

        if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            Self::from_file(&config_path)
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::from_file(DEFAULT_CONFIG_PATH)
        } else {
            Err(ConfigError::Invalid(format!(
                "Config path must be specified in .env file as {} or in {} file",
                CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH
            )))
        }
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cache.validate()?;
        self.signal.validate()
    }
}

impl CacheConfig {
    /// Create a new cache configuration with no TTL and the default namespace
    pub fn new(redis_url: String) -> Self {
        Self {
            redis_url,
            ..Self::default()
        }
    }

    pub fn with_default_ttl(mut self, seconds: u64) -> Self {
        self.default_ttl = seconds;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_namespace_separator(mut self, separator: impl Into<String>) -> Self {
        self.namespace_separator = separator.into();
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn with_connection_timeout(mut self, timeout_ms: u64) -> Self {
        self.connection_timeout_ms = timeout_ms;
        self
    }

    /// Whether writes should carry an expiry
    pub fn ttl_enabled(&self) -> bool {
        self.default_ttl > 0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.redis_url.is_empty() {
            return Err(ConfigError::Invalid("Redis URL cannot be empty".to_string()));
        }
        if !self.namespace.is_empty() && self.namespace_separator.is_empty() {
            return Err(ConfigError::Invalid(
                "Namespace separator cannot be empty when a namespace is set".to_string(),
            ));
        }
        if self.connection_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "Cache connection_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.default_ttl > MAX_TTL_SECONDS {
            return Err(ConfigError::Invalid(format!(
                "Cache default_ttl must not exceed {} seconds",
                MAX_TTL_SECONDS
            )));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            key_prefix: String::new(),
            default_ttl: 0,
            namespace: "tagcache".to_string(),
            namespace_separator: ":".to_string(),
            connection_timeout_ms: 5000,
        }
    }
}

impl SignalConfig {
    /// Create a new signal configuration
    pub fn new(enabled: bool, max_callbacks: usize) -> Self {
        Self {
            enabled,
            max_callbacks,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.max_callbacks == 0 {
            return Err(ConfigError::Invalid(
                "Signal max_callbacks must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_callbacks: 64,
        }
    }
}
