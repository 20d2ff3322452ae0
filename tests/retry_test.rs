//! Tests for retry behaviour with transient and permanent errors.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use logica::providers::GenerateProvider;
use logica::providers::retry::{RetryConfig, RetryingProvider, with_retry};
use logica::{GenerationConfig, LogicaError, Result};
use tokio::time::Instant;

/// Fails `failures` times with the given error, then succeeds.
struct FlakyProvider {
    failures: u32,
    error: fn() -> LogicaError,
    calls: AtomicU32,
}

impl FlakyProvider {
    fn new(failures: u32, error: fn() -> LogicaError) -> Self {
        Self {
            failures,
            error,
            calls: AtomicU32::new(0),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl GenerateProvider for FlakyProvider {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn generate(&self, _prompt: &str, _config: &GenerationConfig) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::Relaxed);
        if n < self.failures {
            Err((self.error)())
        } else {
            Ok("{\"ok\": true}".to_string())
        }
    }
}

fn overloaded() -> LogicaError {
    LogicaError::RateLimited {
        status: 503,
        retry_after: None,
    }
}

fn server_error() -> LogicaError {
    LogicaError::Api {
        status: 502,
        message: "bad gateway".into(),
    }
}

fn bad_request() -> LogicaError {
    LogicaError::Api {
        status: 400,
        message: "invalid argument".into(),
    }
}

fn fast_retry() -> RetryConfig {
    RetryConfig::new()
        .initial_delay(Duration::from_millis(1))
        .max_delay(Duration::from_millis(10))
}

#[tokio::test(start_paused = true)]
async fn transient_errors_are_retried_until_success() {
    let flaky = Arc::new(FlakyProvider::new(2, overloaded));
    let provider = RetryingProvider::new(flaky.clone(), fast_retry());

    let text = provider
        .generate("p", &GenerationConfig::default())
        .await
        .unwrap();
    assert_eq!(text, "{\"ok\": true}");
    assert_eq!(flaky.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn server_errors_are_transient() {
    let flaky = Arc::new(FlakyProvider::new(1, server_error));
    let provider = RetryingProvider::new(flaky.clone(), fast_retry());

    assert!(provider.generate("p", &GenerationConfig::default()).await.is_ok());
    assert_eq!(flaky.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn budget_exhaustion_returns_last_error() {
    let flaky = Arc::new(FlakyProvider::new(u32::MAX, overloaded));
    let provider = RetryingProvider::new(flaky.clone(), fast_retry());

    let err = provider
        .generate("p", &GenerationConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LogicaError::RateLimited { status: 503, .. }));
    // Default budget: first attempt plus three retries.
    assert_eq!(flaky.calls(), 4);
}

#[tokio::test]
async fn permanent_errors_are_not_retried() {
    let flaky = Arc::new(FlakyProvider::new(u32::MAX, bad_request));
    let provider = RetryingProvider::new(flaky.clone(), fast_retry());

    let err = provider
        .generate("p", &GenerationConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LogicaError::Api { status: 400, .. }));
    assert_eq!(flaky.calls(), 1);
}

#[tokio::test]
async fn network_errors_are_not_retried() {
    let flaky = Arc::new(FlakyProvider::new(u32::MAX, || {
        LogicaError::Http("connection reset".into())
    }));
    let provider = RetryingProvider::new(flaky.clone(), fast_retry());

    assert!(provider.generate("p", &GenerationConfig::default()).await.is_err());
    assert_eq!(flaky.calls(), 1);
}

#[tokio::test]
async fn disabled_retry_makes_a_single_attempt() {
    let flaky = Arc::new(FlakyProvider::new(u32::MAX, overloaded));
    let provider = RetryingProvider::new(flaky.clone(), RetryConfig::disabled());

    assert!(provider.generate("p", &GenerationConfig::default()).await.is_err());
    assert_eq!(flaky.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn backoff_doubles_between_attempts() {
    let config = RetryConfig::new()
        .max_attempts(3)
        .initial_delay(Duration::from_millis(100))
        .max_delay(Duration::from_secs(10));
    let calls = AtomicU32::new(0);

    let started = Instant::now();
    let result: Result<()> = with_retry(&config, "test", "generate", || async {
        calls.fetch_add(1, Ordering::Relaxed);
        Err(overloaded())
    })
    .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::Relaxed), 3);
    // 100ms after the first failure, 200ms after the second, none after the last.
    assert_eq!(started.elapsed(), Duration::from_millis(300));
}

#[tokio::test(start_paused = true)]
async fn retry_after_hint_overrides_backoff() {
    let config = RetryConfig::new()
        .max_attempts(2)
        .initial_delay(Duration::from_millis(100));
    let calls = AtomicU32::new(0);

    let started = Instant::now();
    let result = with_retry(&config, "test", "generate", || async {
        if calls.fetch_add(1, Ordering::Relaxed) == 0 {
            Err(LogicaError::RateLimited {
                status: 429,
                retry_after: Some(Duration::from_secs(5)),
            })
        } else {
            Ok(42)
        }
    })
    .await;

    assert_eq!(result.unwrap(), 42);
    assert_eq!(started.elapsed(), Duration::from_secs(5));
}
