//! Text generation providers.
//!
//! [`GeminiClient`] talks to the remote API; [`RetryingProvider`] adds retry
//! on transient failures. Both implement [`GenerateProvider`], the seam the
//! coordinator dispatches through.

pub mod gemini;
pub mod retry;
pub mod traits;

pub use gemini::{GeminiClient, GeminiConfig};
pub use retry::{RetryConfig, RetryingProvider};
pub use traits::GenerateProvider;
