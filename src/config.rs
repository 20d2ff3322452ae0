//! Configuration loading.
//!
//! Configuration is loaded from a TOML file with the following resolution order:
//! 1. `--config <path>` (CLI flag; must exist)
//! 2. `~/.logica/config.toml` (user)
//! 3. built-in defaults
//!
//! Every field has a default, so a partial file is fine. The API key is never
//! read from the file: it comes from the `GOOGLE_API_KEY` environment
//! variable, and `LOGICA_ENDPOINT` / `LOGICA_MODEL` override the provider
//! section (see [`LogicaBuilder::from_config`](crate::LogicaBuilder::from_config)).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cache::CacheConfig;
use crate::coordinator::WorkerConfig;
use crate::providers::RetryConfig;
use crate::providers::gemini::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::types::GenerationConfig;
use crate::{LogicaError, Result};

/// Environment variable holding the Google API key.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";
/// Environment variable overriding the provider endpoint.
pub const ENDPOINT_ENV: &str = "LOGICA_ENDPOINT";
/// Environment variable overriding the model.
pub const MODEL_ENV: &str = "LOGICA_MODEL";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderSection,
    #[serde(default)]
    pub retry: RetrySection,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub workers: WorkersSection,
    #[serde(default = "default_generation")]
    pub generation: GenerationConfig,
}

/// Remote service connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSection {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
}

impl Default for ProviderSection {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_read_timeout() -> u64 {
    60
}

/// Retry policy for transient provider errors.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySection {
    /// Attempts including the first (default: 4).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

impl RetrySection {
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig::new()
            .max_attempts(self.max_attempts)
            .initial_delay(Duration::from_millis(self.initial_delay_ms))
            .max_delay(Duration::from_millis(self.max_delay_ms))
    }
}

fn default_max_attempts() -> u32 {
    4
}

fn default_initial_delay() -> u64 {
    500
}

fn default_max_delay() -> u64 {
    30_000
}

/// Response cache bounds.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            ttl_secs: default_ttl(),
        }
    }
}

impl CacheSection {
    pub fn to_cache_config(&self) -> CacheConfig {
        CacheConfig::new()
            .max_entries(self.max_entries)
            .ttl(Duration::from_secs(self.ttl_secs))
    }
}

fn default_max_entries() -> usize {
    128
}

fn default_ttl() -> u64 {
    3600
}

/// Worker pool and deadline.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkersSection {
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,
    #[serde(default = "default_margin")]
    pub margin_ms: u64,
}

impl Default for WorkersSection {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            call_timeout_secs: default_call_timeout(),
            margin_ms: default_margin(),
        }
    }
}

impl WorkersSection {
    pub fn to_worker_config(&self) -> WorkerConfig {
        WorkerConfig::new()
            .pool_size(self.pool_size)
            .call_timeout(Duration::from_secs(self.call_timeout_secs))
            .margin(Duration::from_millis(self.margin_ms))
    }
}

fn default_pool_size() -> usize {
    4
}

fn default_call_timeout() -> u64 {
    30
}

fn default_margin() -> u64 {
    2000
}

fn default_generation() -> GenerationConfig {
    GenerationConfig::new()
        .max_output_tokens(2048)
        .temperature(0.2)
        .top_p(0.95)
}

/// Built-in defaults, identical to loading an empty file.
impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderSection::default(),
            retry: RetrySection::default(),
            cache: CacheSection::default(),
            workers: WorkersSection::default(),
            generation: default_generation(),
        }
    }
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided; missing file is an error)
    /// 2. `~/.logica/config.toml`
    /// 3. Built-in defaults
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| LogicaError::Configuration(format!("Failed to parse config: {e}")))
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            LogicaError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            LogicaError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(LogicaError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".logica").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        Ok(None)
    }
}
