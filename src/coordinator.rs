//! Cached, deadline-bounded dispatch of prompts to a provider.
//!
//! [`CallCoordinator::call`] resolves one prompt:
//!
//! 1. cache lookup (a hit never touches the provider);
//! 2. on a miss, a tokio task is spawned that waits for one of `pool_size`
//!    semaphore permits, calls the provider, and extracts the payload;
//! 3. the caller waits for that task for at most `timeout + margin`;
//! 4. on success the payload is cached and returned. Failures are never
//!    cached, and with [`CallCoordinator::call_with`] neither are payloads
//!    the caller rejects.
//!
//! A task that misses its deadline is aborted, and so is one whose caller
//! stops waiting (for instance by dropping the `call` future). Aborting drops
//! the in-flight request future, which cancels the HTTP exchange at its next
//! await point and frees the worker slot; the result can no longer reach the
//! cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cache::{ResponseCache, cache_key};
use crate::extract::extract_payload;
use crate::prompts::Prompt;
use crate::providers::GenerateProvider;
use crate::telemetry;
use crate::types::{GenerationConfig, Payload};
use crate::{LogicaError, Result};

/// Worker pool and deadline settings.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum concurrent provider calls. Default: 4.
    pub pool_size: usize,
    /// Default per-call deadline. Default: 30s.
    pub call_timeout: Duration,
    /// Extra wait granted on top of the deadline. Default: 2s.
    pub margin: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            pool_size: 4,
            call_timeout: Duration::from_secs(30),
            margin: Duration::from_secs(2),
        }
    }
}

impl WorkerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pool_size(mut self, n: usize) -> Self {
        self.pool_size = n;
        self
    }

    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }
}

/// Runs provider calls on a bounded pool with caching and a hard deadline.
pub struct CallCoordinator {
    provider: Arc<dyn GenerateProvider>,
    cache: Arc<ResponseCache>,
    permits: Arc<Semaphore>,
    in_flight: Mutex<HashMap<u64, AbortHandle>>,
    next_task_id: AtomicU64,
    config: WorkerConfig,
}

impl CallCoordinator {
    pub fn new(
        provider: Arc<dyn GenerateProvider>,
        cache: Arc<ResponseCache>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            provider,
            cache,
            permits: Arc::new(Semaphore::new(config.pool_size.max(1))),
            in_flight: Mutex::new(HashMap::new()),
            next_task_id: AtomicU64::new(0),
            config,
        }
    }

    /// The default deadline for [`call`](Self::call).
    pub fn call_timeout(&self) -> Duration {
        self.config.call_timeout
    }

    /// The shared response cache.
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Resolve `prompt` into a payload, from the cache or the provider.
    ///
    /// Fails fast with `Configuration` when the provider has no credentials,
    /// and with `ShutDown` after [`shutdown`](Self::shutdown).
    pub async fn call(
        &self,
        prompt: &Prompt,
        config: &GenerationConfig,
        timeout: Duration,
    ) -> Result<Payload> {
        self.call_with(prompt, config, timeout, |payload| Ok(payload.clone()))
            .await
    }

    /// Like [`call`](Self::call), but the payload must pass `accept` before
    /// it is cached. A payload `accept` rejects is returned as its error and
    /// the next identical call goes back to the provider.
    pub async fn call_with<T, F>(
        &self,
        prompt: &Prompt,
        config: &GenerationConfig,
        timeout: Duration,
        accept: F,
    ) -> Result<T>
    where
        F: Fn(&Payload) -> Result<T>,
    {
        let operation = prompt.kind().as_str();
        let started = Instant::now();
        let result = self.resolve(prompt, config, timeout, accept).await;

        let status = match &result {
            Ok(_) => "ok",
            Err(e) => e.kind().as_str(),
        };
        metrics::counter!(telemetry::REQUESTS_TOTAL,
            "operation" => operation,
            "status" => status,
        )
        .increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS, "operation" => operation)
            .record(started.elapsed().as_secs_f64());

        result
    }

    /// Free worker slots. Equals `pool_size` when nothing is running.
    pub fn idle_workers(&self) -> usize {
        self.permits.available_permits()
    }

    /// Worker tasks currently awaited by a caller.
    pub fn in_flight(&self) -> usize {
        self.tasks().len()
    }

    async fn resolve<T, F>(
        &self,
        prompt: &Prompt,
        config: &GenerationConfig,
        timeout: Duration,
        accept: F,
    ) -> Result<T>
    where
        F: Fn(&Payload) -> Result<T>,
    {
        if self.permits.is_closed() {
            return Err(LogicaError::ShutDown);
        }
        if !self.provider.is_configured() {
            return Err(LogicaError::Configuration(format!(
                "no API key configured for provider '{}'",
                self.provider.name()
            )));
        }

        let operation = prompt.kind().as_str();
        let key = cache_key(prompt, config);
        if let Some(payload) = self.cache.get(key) {
            metrics::counter!(telemetry::CACHE_HITS_TOTAL, "operation" => operation).increment(1);
            debug!(operation, "cache hit");
            return accept(&payload);
        }
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "operation" => operation).increment(1);

        let provider = Arc::clone(&self.provider);
        let permits = Arc::clone(&self.permits);
        let text = prompt.text().to_owned();
        let generation = config.clone();
        let mut handle = tokio::spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|_| LogicaError::ShutDown)?;
            let raw = provider.generate(&text, &generation).await?;
            extract_payload(&raw)
        });
        let worker = self.track(&handle);
        debug!(operation, task_id = worker.id, "dispatched to worker pool");

        let deadline = timeout.saturating_add(self.config.margin);
        match tokio::time::timeout(deadline, &mut handle).await {
            Ok(Ok(Ok(payload))) => {
                let value = accept(&payload)?;
                self.cache.insert(key, payload);
                Ok(value)
            }
            Ok(Ok(Err(e))) => Err(e),
            Ok(Err(join_err)) if join_err.is_cancelled() => Err(LogicaError::ShutDown),
            Ok(Err(join_err)) => Err(LogicaError::Worker(join_err.to_string())),
            Err(_) => {
                metrics::counter!(telemetry::TIMEOUTS_TOTAL, "operation" => operation)
                    .increment(1);
                warn!(
                    operation,
                    task_id = worker.id,
                    ?timeout,
                    "call deadline exceeded, task aborted"
                );
                Err(LogicaError::Timeout(timeout))
            }
        }
    }

    /// Register a spawned worker. The returned guard aborts and deregisters
    /// it when dropped, including when the caller abandons the call.
    fn track<R>(&self, task: &JoinHandle<R>) -> Worker<'_> {
        let id = self.next_task_id.fetch_add(1, Ordering::Relaxed);
        self.tasks().insert(id, task.abort_handle());
        Worker {
            owner: self,
            id,
            handle: task.abort_handle(),
        }
    }

    /// Stop accepting work: queued tasks fail with `ShutDown`, in-flight
    /// tasks are aborted, and the cache is cleared. Idempotent.
    pub fn shutdown(&self) {
        self.permits.close();
        let aborted: Vec<AbortHandle> = self.tasks().drain().map(|(_, h)| h).collect();
        for handle in &aborted {
            handle.abort();
        }
        self.cache.clear();
        info!(aborted = aborted.len(), "coordinator shut down");
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shut_down(&self) -> bool {
        self.permits.is_closed()
    }

    fn tasks(&self) -> MutexGuard<'_, HashMap<u64, AbortHandle>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A worker task tied to the caller waiting on it.
struct Worker<'a> {
    owner: &'a CallCoordinator,
    id: u64,
    handle: AbortHandle,
}

impl Drop for Worker<'_> {
    fn drop(&mut self) {
        // No-op for a task that already finished.
        self.handle.abort();
        self.owner.tasks().remove(&self.id);
    }
}

impl Drop for CallCoordinator {
    fn drop(&mut self) {
        for (_, handle) in self.tasks().drain() {
            handle.abort();
        }
    }
}
