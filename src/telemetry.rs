//! Telemetry metric name constants.
//!
//! Centralised metric names for logica operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `logica_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `provider`: provider name (e.g. "gemini")
//! - `operation`: prompt kind (e.g. "translate", "truth_table")
//! - `status`: outcome: "ok" or the failing error kind

/// Total calls resolved by the coordinator, cache hits included.
///
/// Labels: `operation`, `status` ("ok" | error kind).
pub const REQUESTS_TOTAL: &str = "logica_requests_total";

/// Wall-clock duration of coordinator calls in seconds.
///
/// Labels: `operation`.
pub const REQUEST_DURATION_SECONDS: &str = "logica_request_duration_seconds";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `provider`, `operation`.
pub const RETRIES_TOTAL: &str = "logica_retries_total";

/// Total response cache hits.
///
/// Labels: `operation`.
pub const CACHE_HITS_TOTAL: &str = "logica_cache_hits_total";

/// Total response cache misses.
///
/// Labels: `operation`.
pub const CACHE_MISSES_TOTAL: &str = "logica_cache_misses_total";

/// Total calls abandoned because the worker missed its deadline.
///
/// Labels: `operation`.
pub const TIMEOUTS_TOTAL: &str = "logica_timeouts_total";
