//! Result records for the propositional-logic operations.
//!
//! These are decoded from the model's JSON payload. Field names follow the
//! prompt templates in [`prompts`](crate::prompts); the Spanish names used by
//! earlier versions of the templates are accepted as aliases.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A natural-language sentence rendered as a propositional formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    /// Symbolic formula, e.g. `P ∧ ¬Q`.
    pub formula: String,
    /// Variable → affirmative atomic proposition.
    #[serde(alias = "leyenda")]
    pub legend: BTreeMap<String, String>,
}

/// How a formula behaves across all valuations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    #[serde(alias = "tautology", alias = "Tautología", alias = "Tautologia")]
    Tautology,
    #[serde(alias = "contradiction", alias = "Contradicción", alias = "Contradiccion")]
    Contradiction,
    #[serde(alias = "contingency", alias = "Contingencia")]
    Contingency,
}

/// Truth table with intermediate sub-formula columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruthTable {
    /// Variables first, then sub-formulas by complexity, then the full formula.
    pub header: Vec<String>,
    /// One row per valuation, `V`/`F` per column.
    pub rows: Vec<Vec<String>>,
    #[serde(alias = "clasificacion")]
    pub classification: Classification,
}

/// One rewriting step of a simplification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplificationStep {
    pub formula: String,
    /// Law applied to reach `formula` from the previous step.
    #[serde(alias = "regla")]
    pub rule: String,
}

/// Step-by-step simplification of a formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Simplification {
    #[serde(alias = "pasos")]
    pub steps: Vec<SimplificationStep>,
    #[serde(alias = "formula_simplificada")]
    pub simplified_formula: String,
}

/// Outcome of checking two formulas for logical equivalence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equivalence {
    pub equivalent: bool,
    /// The biconditional `(A) ↔ (B)` whose truth table decided the check.
    pub biconditional: String,
    pub table: TruthTable,
}
