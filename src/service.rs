//! Domain-facing facade over the call coordinator.
//!
//! Each operation renders its fixed template around the caller's input,
//! resolves it through the [`CallCoordinator`], and decodes the payload into
//! a typed record. A payload that parses but lacks required fields is a
//! [`LogicaError::Schema`] failure.
//!
//! Domain operations never return the raw [`LogicaError`]: the full error is
//! logged here and callers get a [`Failure`] with a display-safe message.
//! [`PromptService::prompt`] is the typed escape hatch and returns the error
//! itself.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::cache::ResponseCache;
use crate::coordinator::CallCoordinator;
use crate::error::Failure;
use crate::prompts::{Prompt, PromptKind};
use crate::types::{
    Classification, Equivalence, GenerationConfig, Payload, Simplification, Translation,
    TruthTable,
};
use crate::{LogicaError, Result};

/// The propositional-logic assistant.
///
/// Cheap to clone; clones share the cache, worker pool and HTTP connections.
#[derive(Clone)]
pub struct PromptService {
    coordinator: Arc<CallCoordinator>,
    generation: GenerationConfig,
}

impl PromptService {
    /// Wrap a coordinator. `generation` holds the defaults every call starts from.
    pub fn new(coordinator: CallCoordinator, generation: GenerationConfig) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
            generation,
        }
    }

    /// Translate a natural-language sentence into a formula and its legend.
    pub async fn translate(&self, sentence: &str) -> std::result::Result<Translation, Failure> {
        self.run(PromptKind::Translate, sentence, false, check_translation)
            .await
            .map_err(|e| report(PromptKind::Translate, e))
    }

    /// Build the truth table of `formula` and classify it.
    pub async fn truth_table(&self, formula: &str) -> std::result::Result<TruthTable, Failure> {
        self.truth_table_inner(formula)
            .await
            .map_err(|e| report(PromptKind::TruthTable, e))
    }

    /// Simplify `formula` step by step.
    pub async fn simplify(&self, formula: &str) -> std::result::Result<Simplification, Failure> {
        self.run(PromptKind::Simplify, formula, true, check_simplification)
            .await
            .map_err(|e| report(PromptKind::Simplify, e))
    }

    /// Decide whether `a` and `b` are logically equivalent.
    ///
    /// Two formulas are equivalent iff `(a) ↔ (b)` is a tautology, so this is
    /// a truth-table request for the biconditional.
    pub async fn check_equivalence(
        &self,
        a: &str,
        b: &str,
    ) -> std::result::Result<Equivalence, Failure> {
        let outcome = async {
            require_input(a)?;
            require_input(b)?;
            let biconditional = format!("({}) ↔ ({})", a.trim(), b.trim());
            let table = self.truth_table_inner(&biconditional).await?;
            Ok::<_, LogicaError>(Equivalence {
                equivalent: table.classification == Classification::Tautology,
                biconditional,
                table,
            })
        };
        outcome
            .await
            .map_err(|e| report(PromptKind::TruthTable, e))
    }

    /// Send `text` verbatim and return the decoded payload without schema checks.
    ///
    /// `overrides` are applied on top of the service's generation defaults.
    /// Unlike the domain operations, the typed error is returned as is.
    pub async fn prompt(
        &self,
        text: &str,
        overrides: Option<&GenerationConfig>,
    ) -> Result<Payload> {
        require_input(text)?;
        let config = match overrides {
            Some(overrides) => self.generation.overlay(overrides),
            None => self.generation.clone(),
        };
        let prompt = Prompt::new(PromptKind::Generic, text);
        self.coordinator
            .call(&prompt, &config, self.coordinator.call_timeout())
            .await
    }

    /// Stop the service: queued work is abandoned, in-flight calls are
    /// aborted and the cache is cleared. Later calls fail immediately.
    ///
    /// Pooled HTTP connections are released when the last clone of the
    /// service is dropped.
    pub fn shutdown(&self) {
        self.coordinator.shutdown();
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shut_down(&self) -> bool {
        self.coordinator.is_shut_down()
    }

    /// The shared response cache.
    pub fn cache(&self) -> &ResponseCache {
        self.coordinator.cache()
    }

    async fn truth_table_inner(&self, formula: &str) -> Result<TruthTable> {
        self.run(PromptKind::TruthTable, formula, true, check_truth_table)
            .await
    }

    /// Render, resolve and decode one templated prompt.
    ///
    /// Decoding and `check` run before the payload is cached, so a reply of
    /// the wrong shape is never served again.
    async fn run<T, C>(
        &self,
        kind: PromptKind,
        input: &str,
        json_output: bool,
        check: C,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        C: Fn(&T) -> Result<()>,
    {
        require_input(input)?;
        let prompt = Prompt::new(kind, input.trim());
        let config = self.generation.clone().json_output(json_output);
        let decode = |payload: &Payload| {
            debug!(operation = kind.as_str(), fields = payload.len(), "payload received");
            let value: T = serde_json::from_value(serde_json::Value::Object(payload.clone()))
                .map_err(|e| schema(kind, e.to_string()))?;
            check(&value)?;
            Ok(value)
        };
        self.coordinator
            .call_with(&prompt, &config, self.coordinator.call_timeout(), decode)
            .await
    }
}

fn check_translation(t: &Translation) -> Result<()> {
    if t.formula.trim().is_empty() {
        return Err(schema(PromptKind::Translate, "`formula` is empty"));
    }
    if t.legend.is_empty() {
        return Err(schema(PromptKind::Translate, "`legend` is empty"));
    }
    Ok(())
}

fn check_truth_table(table: &TruthTable) -> Result<()> {
    if table.header.is_empty() {
        return Err(schema(PromptKind::TruthTable, "`header` is empty"));
    }
    Ok(())
}

fn check_simplification(s: &Simplification) -> Result<()> {
    if s.steps.is_empty() {
        return Err(schema(PromptKind::Simplify, "`steps` is empty"));
    }
    if s.simplified_formula.trim().is_empty() {
        return Err(schema(PromptKind::Simplify, "`simplified_formula` is empty"));
    }
    Ok(())
}

fn require_input(input: &str) -> Result<()> {
    if input.trim().is_empty() {
        return Err(LogicaError::InvalidInput("input must not be empty".to_string()));
    }
    Ok(())
}

fn schema(kind: PromptKind, detail: impl Into<String>) -> LogicaError {
    LogicaError::Schema {
        operation: kind.description(),
        detail: detail.into(),
    }
}

/// Log the full error and reduce it to its display-safe form.
fn report(kind: PromptKind, err: LogicaError) -> Failure {
    warn!(
        operation = kind.as_str(),
        kind = %err.kind(),
        error = %err,
        "operation failed"
    );
    Failure::from(err)
}
