//! Caching subsystem.
//!
//! [`response::ResponseCache`] memoizes decoded prompt payloads, bounded by
//! TTL and entry count. One instance is created per
//! [`PromptService`](crate::PromptService) and shared by every caller.

pub mod response;

pub use response::{CacheConfig, ResponseCache, cache_key};
