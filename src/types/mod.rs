//! Public types for the Logica API.

mod logic;
mod options;

pub use logic::{
    Classification, Equivalence, Simplification, SimplificationStep, Translation, TruthTable,
};
pub use options::GenerationConfig;

/// Structured payload decoded from a model response.
pub type Payload = serde_json::Map<String, serde_json::Value>;
