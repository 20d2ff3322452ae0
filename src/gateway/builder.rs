//! Builder for configuring service instances

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::cache::{CacheConfig, ResponseCache};
use crate::config::{API_KEY_ENV, Config, ENDPOINT_ENV, MODEL_ENV};
use crate::coordinator::{CallCoordinator, WorkerConfig};
use crate::providers::{
    GeminiClient, GeminiConfig, GenerateProvider, RetryConfig, RetryingProvider,
};
use crate::service::PromptService;
use crate::types::GenerationConfig;
use crate::Result;

/// Main entry point for creating service instances.
pub struct Logica;

impl Logica {
    /// Create a new builder for configuring the service.
    pub fn builder() -> LogicaBuilder {
        LogicaBuilder::new()
    }
}

/// Builder for configuring service instances.
///
/// ```rust,no_run
/// # use logica::Logica;
/// # use std::time::Duration;
/// let service = Logica::builder()
///     .api_key("your-google-api-key")
///     .call_timeout(Duration::from_secs(20))
///     .build()?;
/// # Ok::<(), logica::LogicaError>(())
/// ```
pub struct LogicaBuilder {
    api_key: Option<String>,
    gemini: GeminiConfig,
    retry: RetryConfig,
    cache: CacheConfig,
    workers: WorkerConfig,
    generation: GenerationConfig,
    provider: Option<Arc<dyn GenerateProvider>>,
}

impl LogicaBuilder {
    pub fn new() -> Self {
        Self {
            api_key: None,
            gemini: GeminiConfig::default(),
            retry: RetryConfig::default(),
            cache: CacheConfig::default(),
            workers: WorkerConfig::default(),
            generation: Config::default().generation,
            provider: None,
        }
    }

    /// Apply a loaded [`Config`], then environment overrides.
    pub fn from_config(config: &Config) -> Self {
        let mut builder = Self::new()
            .endpoint(&config.provider.endpoint)
            .model(&config.provider.model)
            .connect_timeout(Duration::from_secs(config.provider.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.provider.read_timeout_secs))
            .retry(config.retry.to_retry_config())
            .cache(config.cache.to_cache_config())
            .workers(config.workers.to_worker_config())
            .generation(config.generation.clone());
        builder.apply_env();
        builder
    }

    /// Defaults plus environment overrides (`GOOGLE_API_KEY`,
    /// `LOGICA_ENDPOINT`, `LOGICA_MODEL`).
    pub fn from_env() -> Self {
        let mut builder = Self::new();
        builder.apply_env();
        builder
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            self.api_key = Some(key);
        }
        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            self.gemini.endpoint = endpoint;
        }
        if let Ok(model) = std::env::var(MODEL_ENV) {
            self.gemini.model = model;
        }
    }

    /// Set the Google API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Override the Gemini base URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.gemini.endpoint = endpoint.into();
        self
    }

    /// Override the Gemini model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.gemini.model = model.into();
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.gemini.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.gemini.read_timeout = timeout;
        self
    }

    /// Configure retry behaviour for transient provider errors.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    /// Configure the response cache bounds.
    pub fn cache(mut self, config: CacheConfig) -> Self {
        self.cache = config;
        self
    }

    /// Configure the worker pool and deadlines.
    pub fn workers(mut self, config: WorkerConfig) -> Self {
        self.workers = config;
        self
    }

    /// Set the per-call deadline.
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.workers.call_timeout = timeout;
        self
    }

    /// Set generation defaults applied to every call.
    ///
    /// Without this the defaults of [`Config::default`] apply: 2048 output
    /// tokens, temperature 0.2, top-p 0.95.
    pub fn generation(mut self, config: GenerationConfig) -> Self {
        self.generation = config;
        self
    }

    /// Use a custom provider instead of the Gemini client.
    ///
    /// The provider is still wrapped with retry logic.
    pub fn provider(mut self, provider: Arc<dyn GenerateProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Build the service.
    ///
    /// A missing API key is not an error here; every call of the resulting
    /// service fails with a configuration error instead.
    pub fn build(self) -> Result<PromptService> {
        let inner: Arc<dyn GenerateProvider> = match self.provider {
            Some(provider) => provider,
            None => Arc::new(GeminiClient::new(self.api_key, &self.gemini)?),
        };
        if !inner.is_configured() {
            warn!(provider = inner.name(), "no API key configured; calls will fail");
        }

        info!(
            provider = inner.name(),
            model = %self.gemini.model,
            pool_size = self.workers.pool_size,
            cache_entries = self.cache.max_entries,
            "building prompt service"
        );

        let provider: Arc<dyn GenerateProvider> =
            Arc::new(RetryingProvider::new(inner, self.retry));
        let cache = Arc::new(ResponseCache::new(&self.cache));
        let coordinator = CallCoordinator::new(provider, cache, self.workers);
        Ok(PromptService::new(coordinator, self.generation))
    }
}

impl Default for LogicaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
