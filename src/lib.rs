//! Logica - propositional-logic assistant backed by a generative model API
//!
//! Natural-language sentences are translated into propositional formulas,
//! formulas get truth tables, step-by-step simplifications and equivalence
//! checks. The logical reasoning itself is done by a remote model (Google
//! Gemini); this crate invokes it reliably:
//!
//! - [`cache::ResponseCache`] memoizes successful payloads (TTL + size bound);
//! - [`providers::RetryingProvider`] retries HTTP 429/5xx with backoff;
//! - [`coordinator::CallCoordinator`] runs calls on a bounded worker pool
//!   under a hard deadline;
//! - [`extract::extract_payload`] digs the JSON payload out of free text;
//! - [`PromptService`] exposes the domain operations and validates payloads.
//!
//! # Example
//!
//! ```rust,no_run
//! use logica::Logica;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> logica::Result<()> {
//!     let service = Logica::builder().api_key("your-google-api-key").build()?;
//!
//!     match service.translate("it rains and it is cold").await {
//!         Ok(translation) => println!("{} {:?}", translation.formula, translation.legend),
//!         Err(failure) => eprintln!("{}", failure.message),
//!     }
//!
//!     service.shutdown();
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod prompts;
pub mod providers;
pub mod service;
pub mod telemetry;
pub mod types;

// Re-export main types at crate root
pub use cache::{CacheConfig, ResponseCache};
pub use config::Config;
pub use coordinator::{CallCoordinator, WorkerConfig};
pub use error::{ErrorKind, Failure, LogicaError, Result};
pub use extract::extract_payload;
pub use gateway::{Logica, LogicaBuilder};
pub use prompts::{Prompt, PromptKind};
pub use providers::{GeminiClient, GeminiConfig, GenerateProvider, RetryConfig, RetryingProvider};
pub use service::PromptService;

// Re-export all types
pub use types::{
    Classification, Equivalence, GenerationConfig, Payload, Simplification, SimplificationStep,
    Translation, TruthTable,
};
