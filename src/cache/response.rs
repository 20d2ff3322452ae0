//! Response cache for prompt results.
//!
//! [`ResponseCache`] memoizes decoded payloads keyed on a content hash of
//! (prompt kind, input, generation options). It is bounded twice:
//!
//! - **Time**: entries whose age has reached the TTL are never returned and
//!   are pruned on the next access.
//! - **Size**: after expiry pruning, if the map still holds more than
//!   `max_entries`, the oldest-inserted entries are evicted first.
//!
//! Eviction is insertion-ordered, not LRU: a read never refreshes an entry.
//! Only successful payloads are inserted (see
//! [`CallCoordinator`](crate::coordinator::CallCoordinator)).
//!
//! Timestamps come from [`tokio::time::Instant`], so a paused test runtime
//! controls expiry deterministically.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::prompts::Prompt;
use crate::types::{GenerationConfig, Payload};

/// Configuration for the response cache.
///
/// ```rust
/// # use logica::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(1_000)
///     .ttl(Duration::from_secs(600));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached entries. Default: 128.
    pub max_entries: usize,
    /// Time-to-live for cached entries. Default: 1 hour.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 128,
            ttl: Duration::from_secs(3600),
        }
    }
}

impl CacheConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached entries.
    pub fn max_entries(mut self, n: usize) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the time-to-live for cached entries.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

struct CacheEntry {
    value: Payload,
    inserted_at: Instant,
}

/// In-memory, time- and size-bounded payload cache.
///
/// All operations run inside a single critical section per instance. The
/// lock is never held across an `.await`.
pub struct ResponseCache {
    config: CacheConfig,
    entries: Mutex<HashMap<u64, CacheEntry>>,
}

impl ResponseCache {
    /// Create a new response cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            config: config.clone(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a cached payload.
    ///
    /// Returns `None` on a miss or when the entry has expired.
    pub fn get(&self, key: u64) -> Option<Payload> {
        let mut entries = self.lock();
        self.prune(&mut entries, Instant::now());
        entries.get(&key).map(|entry| entry.value.clone())
    }

    /// Insert (or overwrite) a payload, stamping it with the current time.
    pub fn insert(&self, key: u64, value: Payload) {
        let mut entries = self.lock();
        let now = Instant::now();
        entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: now,
            },
        );
        self.prune(&mut entries, now);
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let mut entries = self.lock();
        self.prune(&mut entries, Instant::now());
        entries.len()
    }

    /// Whether the cache holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict all entries.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Drop expired entries, then the oldest-inserted ones until the count
    /// is within `max_entries`.
    fn prune(&self, entries: &mut HashMap<u64, CacheEntry>, now: Instant) {
        let ttl = self.config.ttl;
        entries.retain(|_, entry| now.saturating_duration_since(entry.inserted_at) < ttl);

        let excess = entries.len().saturating_sub(self.config.max_entries);
        if excess == 0 {
            return;
        }
        let mut by_age: Vec<(Instant, u64)> = entries
            .iter()
            .map(|(key, entry)| (entry.inserted_at, *key))
            .collect();
        by_age.sort_unstable();
        for (_, key) in by_age.into_iter().take(excess) {
            entries.remove(&key);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, CacheEntry>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Compute a cache key from the prompt identity and generation options.
///
/// Uses `DefaultHasher` (SipHash). The hash is deterministic within a
/// process lifetime, which is sufficient for an in-memory cache. The
/// instruction template is fixed per prompt kind, so hashing the kind
/// stands in for hashing the template text.
pub fn cache_key(prompt: &Prompt, config: &GenerationConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    prompt.kind().hash(&mut hasher);
    prompt.input().hash(&mut hasher);
    config.max_output_tokens.hash(&mut hasher);
    config.temperature.map(f32::to_bits).hash(&mut hasher);
    config.top_p.map(f32::to_bits).hash(&mut hasher);
    config.json_output.hash(&mut hasher);
    hasher.finish()
}
