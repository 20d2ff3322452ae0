//! Backoff for transient provider failures.
//!
//! Gemini answers 429/503 when it is overloaded and other 5xx codes on
//! internal faults. Those requests are worth sending again after a pause.
//! Anything else (rejected requests, missing keys, dropped connections) goes
//! back to the caller on the first failure.
//!
//! [`RetryingProvider`] wraps a [`GenerateProvider`] with that behaviour;
//! [`with_retry()`] is the loop underneath it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::traits::GenerateProvider;
use crate::telemetry;
use crate::types::GenerationConfig;
use crate::{LogicaError, Result};

/// Attempt budget and pause schedule.
///
/// The pause after the n-th failed attempt (counting from zero) is
/// `initial_delay * 2^n`, never more than `max_delay`. A `retry-after` value
/// sent by the server replaces the computed pause.
///
/// ```rust
/// # use logica::RetryConfig;
/// # use std::time::Duration;
/// let patient = RetryConfig::new()
///     .max_attempts(6)
///     .max_delay(Duration::from_secs(60));
/// assert_eq!(patient.backoff(0), Duration::from_millis(500));
/// ```
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Requests sent in total, the first one included. Default: 4.
    pub max_attempts: u32,
    /// Pause after the first failure. Default: 500ms.
    pub initial_delay: Duration,
    /// Ceiling for any computed pause. Default: 30s.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// One request, no pauses.
    pub fn disabled() -> Self {
        Self::default().max_attempts(1)
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Computed pause after failed attempt `attempt` (0 = the first request).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Pause before retrying after `err`: the server's hint, else [`backoff`](Self::backoff).
    pub fn pause_after(&self, attempt: u32, err: &LogicaError) -> Duration {
        err.retry_after().unwrap_or_else(|| self.backoff(attempt))
    }
}

/// Run `attempt_fn` until it succeeds, fails permanently, or the budget in
/// `config` is spent. The error from the final attempt is returned.
///
/// `provider_name` and `operation` label the retry counter and log lines.
pub async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    provider_name: &str,
    operation: &str,
    mut attempt_fn: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let budget = config.max_attempts.max(1);
    let mut sent = 0u32;
    loop {
        let err = match attempt_fn().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        sent += 1;

        if !err.is_transient() {
            return Err(err);
        }
        if sent >= budget {
            debug!(provider = provider_name, operation, sent, "retry budget spent");
            return Err(err);
        }

        let pause = config.pause_after(sent - 1, &err);
        metrics::counter!(telemetry::RETRIES_TOTAL,
            "provider" => provider_name.to_owned(),
            "operation" => operation.to_owned(),
        )
        .increment(1);
        warn!(
            provider = provider_name,
            operation,
            sent,
            budget,
            ?pause,
            error = %err,
            "transient provider failure, backing off"
        );
        tokio::time::sleep(pause).await;
    }
}

/// A [`GenerateProvider`] that re-sends transient failures of `inner`.
pub struct RetryingProvider {
    inner: Arc<dyn GenerateProvider>,
    config: RetryConfig,
}

impl RetryingProvider {
    pub fn new(inner: Arc<dyn GenerateProvider>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl GenerateProvider for RetryingProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn is_configured(&self) -> bool {
        self.inner.is_configured()
    }

    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        with_retry(&self.config, self.inner.name(), "generate", || {
            self.inner.generate(prompt, config)
        })
        .await
    }
}
