//! Provider trait for text generation backends.
//!
//! The coordinator only sees [`GenerateProvider`]. This enables:
//! - Decorator patterns: [`RetryingProvider`](super::retry::RetryingProvider)
//! - Stub providers in tests, with no network
//!
//! # Example
//!
//! ```ignore
//! struct Canned;
//!
//! #[async_trait]
//! impl GenerateProvider for Canned {
//!     fn name(&self) -> &str { "canned" }
//!
//!     async fn generate(&self, _prompt: &str, _config: &GenerationConfig) -> Result<String> {
//!         Ok(r#"{"formula": "P", "legend": {"P": "it rains"}}"#.to_string())
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::Result;
use crate::types::GenerationConfig;

/// A remote (or stubbed) text generation service.
#[async_trait]
pub trait GenerateProvider: Send + Sync {
    /// Provider name for logging/metrics.
    fn name(&self) -> &str;

    /// Whether credentials are present. Unconfigured providers make every
    /// call fail with `Configuration` before any network activity.
    fn is_configured(&self) -> bool {
        true
    }

    /// Send `prompt` and return the text of the first candidate generation.
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String>;
}
