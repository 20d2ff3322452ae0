//! End-to-end tests for PromptService with a scripted provider.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use logica::providers::GenerateProvider;
use logica::{
    Classification, ErrorKind, GenerationConfig, Logica, LogicaError, PromptService,
    RetryConfig, Result,
};
use serde_json::json;

/// Replies with a fixed result and records every prompt it receives.
struct ScriptedProvider {
    reply: fn() -> Result<String>,
    seen: Mutex<Vec<(String, GenerationConfig)>>,
}

impl ScriptedProvider {
    fn new(reply: fn() -> Result<String>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    fn last(&self) -> (String, GenerationConfig) {
        self.seen.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl GenerateProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        self.seen
            .lock()
            .unwrap()
            .push((prompt.to_string(), config.clone()));
        (self.reply)()
    }
}

/// Replies from a fixed script, one entry per call.
struct SequencedProvider {
    replies: Mutex<VecDeque<&'static str>>,
    calls: Mutex<usize>,
}

impl SequencedProvider {
    fn new(replies: &[&'static str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().copied().collect()),
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl GenerateProvider for SequencedProvider {
    fn name(&self) -> &str {
        "sequenced"
    }

    async fn generate(&self, _prompt: &str, _config: &GenerationConfig) -> Result<String> {
        *self.calls.lock().unwrap() += 1;
        let reply = self.replies.lock().unwrap().pop_front().unwrap_or("{}");
        Ok(reply.to_string())
    }
}

fn service(provider: Arc<ScriptedProvider>) -> PromptService {
    Logica::builder()
        .provider(provider)
        .retry(RetryConfig::disabled())
        .generation(GenerationConfig::new().temperature(0.2))
        .build()
        .unwrap()
}

// ============================================================================
// translate
// ============================================================================

#[tokio::test]
async fn translate_end_to_end() {
    let provider = ScriptedProvider::new(|| {
        Ok(r#"{"formula": "P ∧ Q", "legend": {"P": "it rains", "Q": "it is cold"}}"#.into())
    });
    let service = service(provider.clone());

    let translation = service.translate("it rains and it is cold").await.unwrap();

    assert_eq!(translation.formula, "P ∧ Q");
    assert_eq!(translation.legend["P"], "it rains");
    assert_eq!(translation.legend["Q"], "it is cold");

    let (prompt, config) = provider.last();
    assert!(prompt.ends_with("Sentence: \"it rains and it is cold\"\nJSON response:"));
    assert!(!config.json_output);
    assert_eq!(config.temperature, Some(0.2));
}

#[tokio::test]
async fn translate_accepts_fenced_reply_and_spanish_keys() {
    let provider = ScriptedProvider::new(|| {
        Ok("```json\n{\"formula\": \"¬P\", \"leyenda\": {\"P\": \"llueve\"}}\n```".into())
    });
    let service = service(provider);

    let translation = service.translate("no llueve").await.unwrap();
    assert_eq!(translation.formula, "¬P");
    assert_eq!(translation.legend["P"], "llueve");
}

#[tokio::test]
async fn repeated_translate_is_served_from_cache() {
    let provider = ScriptedProvider::new(|| {
        Ok(r#"{"formula": "P", "legend": {"P": "it rains"}}"#.into())
    });
    let service = service(provider.clone());

    let first = service.translate("it rains").await.unwrap();
    let second = service.clone().translate("  it rains  ").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn translate_with_empty_legend_is_schema_failure() {
    let provider = ScriptedProvider::new(|| Ok(r#"{"formula": "P", "legend": {}}"#.into()));
    let service = service(provider);

    let failure = service.translate("it rains").await.unwrap_err();
    assert_eq!(failure.kind, ErrorKind::Schema);
    assert!(failure.message.contains("translation"));
}

#[tokio::test]
async fn rejected_translation_is_not_cached() {
    let provider = SequencedProvider::new(&[
        r#"{"formula": "P"}"#,
        r#"{"formula": "P", "legend": {"P": "it rains"}}"#,
    ]);
    let service = Logica::builder()
        .provider(provider.clone())
        .retry(RetryConfig::disabled())
        .build()
        .unwrap();

    let failure = service.translate("it rains").await.unwrap_err();
    assert_eq!(failure.kind, ErrorKind::Schema);
    assert!(service.cache().is_empty());

    let translation = service.translate("it rains").await.unwrap();
    assert_eq!(translation.legend["P"], "it rains");
    assert_eq!(provider.calls(), 2);
    assert_eq!(service.cache().len(), 1);
}

#[tokio::test]
async fn rejected_truth_table_is_not_cached() {
    let provider = SequencedProvider::new(&[
        r#"{"header": [], "rows": [], "classification": "Tautology"}"#,
        r#"{"header": ["P", "P ∨ ¬P"], "rows": [["V", "V"], ["F", "V"]], "classification": "Tautology"}"#,
    ]);
    let service = Logica::builder()
        .provider(provider.clone())
        .retry(RetryConfig::disabled())
        .build()
        .unwrap();

    let failure = service.truth_table("P ∨ ¬P").await.unwrap_err();
    assert_eq!(failure.kind, ErrorKind::Schema);

    let table = service.truth_table("P ∨ ¬P").await.unwrap();
    assert_eq!(table.classification, Classification::Tautology);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn empty_input_is_rejected_without_a_call() {
    let provider = ScriptedProvider::new(|| Ok("{}".into()));
    let service = service(provider.clone());

    let failure = service.translate("   ").await.unwrap_err();
    assert_eq!(failure.kind, ErrorKind::InvalidInput);
    assert_eq!(provider.calls(), 0);
}

// ============================================================================
// truth_table / simplify / equivalence
// ============================================================================

#[tokio::test]
async fn truth_table_decodes_rows_and_classification() {
    let provider = ScriptedProvider::new(|| {
        Ok(json!({
            "header": ["P", "¬P", "P ∨ ¬P"],
            "rows": [["V", "F", "V"], ["F", "V", "V"]],
            "classification": "Tautology"
        })
        .to_string())
    });
    let service = service(provider.clone());

    let table = service.truth_table("P ∨ ¬P").await.unwrap();

    assert_eq!(table.header.len(), 3);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.classification, Classification::Tautology);

    let (prompt, config) = provider.last();
    assert!(prompt.contains("Formula: \"P ∨ ¬P\""));
    assert!(config.json_output);
}

#[tokio::test]
async fn truth_table_without_classification_is_schema_failure() {
    let provider = ScriptedProvider::new(|| {
        Ok(r#"{"header": ["P"], "rows": [["V"], ["F"]]}"#.into())
    });
    let service = service(provider);

    let failure = service.truth_table("P").await.unwrap_err();
    assert_eq!(failure.kind, ErrorKind::Schema);
    assert_eq!(
        failure.message,
        "The AI response did not have the expected format for the truth table."
    );
}

#[tokio::test]
async fn truth_table_accepts_spanish_keys() {
    let provider = ScriptedProvider::new(|| {
        Ok(r#"{"header": ["P", "P ∧ ¬P"], "rows": [["V","F"],["F","F"]], "clasificacion": "Contradicción"}"#.into())
    });
    let service = service(provider);

    let table = service.truth_table("P ∧ ¬P").await.unwrap();
    assert_eq!(table.classification, Classification::Contradiction);
}

#[tokio::test]
async fn simplify_decodes_steps() {
    let provider = ScriptedProvider::new(|| {
        Ok(json!({
            "steps": [
                { "formula": "(P ∧ Q) ∨ (P ∧ ¬Q)", "rule": "Original formula" },
                { "formula": "P ∧ (Q ∨ ¬Q)", "rule": "Distributive law" },
                { "formula": "P", "rule": "Identity law" }
            ],
            "simplified_formula": "P"
        })
        .to_string())
    });
    let service = service(provider.clone());

    let simplification = service.simplify("(P ∧ Q) ∨ (P ∧ ¬Q)").await.unwrap();

    assert_eq!(simplification.steps.len(), 3);
    assert_eq!(simplification.steps[1].rule, "Distributive law");
    assert_eq!(simplification.simplified_formula, "P");
    assert!(provider.last().1.json_output);
}

#[tokio::test]
async fn simplify_accepts_spanish_keys() {
    let provider = ScriptedProvider::new(|| {
        Ok(r#"{"pasos": [{"formula": "¬¬P", "regla": "Fórmula original"}, {"formula": "P", "regla": "Doble negación"}], "formula_simplificada": "P"}"#.into())
    });
    let service = service(provider);

    let simplification = service.simplify("¬¬P").await.unwrap();
    assert_eq!(simplification.steps[1].rule, "Doble negación");
    assert_eq!(simplification.simplified_formula, "P");
}

#[tokio::test]
async fn simplify_without_steps_is_schema_failure() {
    let provider =
        ScriptedProvider::new(|| Ok(r#"{"steps": [], "simplified_formula": "P"}"#.into()));
    let service = service(provider);

    let failure = service.simplify("P").await.unwrap_err();
    assert_eq!(failure.kind, ErrorKind::Schema);
}

#[tokio::test]
async fn equivalence_checks_the_biconditional() {
    let provider = ScriptedProvider::new(|| {
        Ok(json!({
            "header": ["P", "Q", "P → Q", "¬P ∨ Q", "(P → Q) ↔ (¬P ∨ Q)"],
            "rows": [
                ["V", "V", "V", "V", "V"],
                ["V", "F", "F", "F", "V"],
                ["F", "V", "V", "V", "V"],
                ["F", "F", "V", "V", "V"]
            ],
            "classification": "Tautology"
        })
        .to_string())
    });
    let service = service(provider.clone());

    let result = service.check_equivalence("P → Q", "¬P ∨ Q").await.unwrap();

    assert!(result.equivalent);
    assert_eq!(result.biconditional, "(P → Q) ↔ (¬P ∨ Q)");
    assert!(provider
        .last()
        .0
        .contains("Formula: \"(P → Q) ↔ (¬P ∨ Q)\""));
}

#[tokio::test]
async fn contingent_biconditional_is_not_equivalent() {
    let provider = ScriptedProvider::new(|| {
        Ok(r#"{"header": ["P", "Q", "P ↔ Q"], "rows": [], "classification": "Contingency"}"#.into())
    });
    let service = service(provider);

    let result = service.check_equivalence("P", "Q").await.unwrap();
    assert!(!result.equivalent);
}

// ============================================================================
// failures and the generic prompt
// ============================================================================

#[tokio::test]
async fn rate_limit_surfaces_friendly_message() {
    let provider = ScriptedProvider::new(|| {
        Err(LogicaError::RateLimited {
            status: 429,
            retry_after: None,
        })
    });
    let service = service(provider);

    let failure = service.translate("it rains").await.unwrap_err();
    assert_eq!(failure.kind, ErrorKind::RateLimit);
    assert!(failure.message.contains("too many requests"));
    assert!(!failure.message.contains("429"));
}

#[tokio::test]
async fn unparseable_reply_is_parse_failure() {
    let provider = ScriptedProvider::new(|| Ok("I am not sure what you mean.".into()));
    let service = service(provider);

    let failure = service.simplify("P").await.unwrap_err();
    assert_eq!(failure.kind, ErrorKind::Parse);
}

#[tokio::test]
async fn generic_prompt_returns_payload_verbatim() {
    let provider = ScriptedProvider::new(|| Ok(r#"{"answer": 42, "extra": [1, 2]}"#.into()));
    let service = service(provider.clone());

    let overrides = GenerationConfig::new().max_output_tokens(64).json_output(true);
    let payload = service
        .prompt("What is the answer?", Some(&overrides))
        .await
        .unwrap();

    assert_eq!(payload["answer"], 42);
    let (prompt, config) = provider.last();
    assert_eq!(prompt, "What is the answer?");
    assert_eq!(config.max_output_tokens, Some(64));
    assert_eq!(config.temperature, Some(0.2));
    assert!(config.json_output);
}

#[tokio::test]
async fn generic_prompt_returns_typed_errors() {
    let provider = ScriptedProvider::new(|| Ok("no json here".into()));
    let service = service(provider);

    let err = service.prompt("hi", None).await.unwrap_err();
    assert!(matches!(err, LogicaError::Parse(_)));
}

#[tokio::test]
async fn missing_api_key_fails_every_operation() {
    // No provider and no key: the Gemini client is built unconfigured.
    let service = Logica::builder()
        .endpoint("http://127.0.0.1:9")
        .build()
        .unwrap();

    let failure = service.translate("it rains").await.unwrap_err();
    assert_eq!(failure.kind, ErrorKind::Configuration);

    let err = service.prompt("hi", None).await.unwrap_err();
    assert!(matches!(err, LogicaError::Configuration(_)));
}

#[tokio::test]
async fn shutdown_stops_the_service() {
    let provider = ScriptedProvider::new(|| {
        Ok(r#"{"formula": "P", "legend": {"P": "it rains"}}"#.into())
    });
    let service = service(provider.clone());
    service.translate("it rains").await.unwrap();

    service.shutdown();

    assert!(service.is_shut_down());
    assert!(service.cache().is_empty());
    let failure = service.translate("it rains").await.unwrap_err();
    assert_eq!(failure.kind, ErrorKind::Internal);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn call_timeout_applies_to_domain_operations() {
    struct Silent;

    #[async_trait]
    impl GenerateProvider for Silent {
        fn name(&self) -> &str {
            "silent"
        }

        async fn generate(&self, _prompt: &str, _config: &GenerationConfig) -> Result<String> {
            std::future::pending::<()>().await;
            Ok(String::new())
        }
    }

    let service = Logica::builder()
        .provider(Arc::new(Silent))
        .workers(logica::WorkerConfig::new().margin(Duration::from_millis(10)))
        .call_timeout(Duration::from_millis(20))
        .build()
        .unwrap();

    let failure = service.truth_table("P").await.unwrap_err();
    assert_eq!(failure.kind, ErrorKind::Timeout);
}

#[tokio::test]
async fn builder_defaults_match_config_defaults() {
    let provider = ScriptedProvider::new(|| Ok(r#"{"ok": true}"#.into()));
    let service = Logica::builder()
        .provider(provider.clone())
        .retry(RetryConfig::disabled())
        .build()
        .unwrap();

    service.prompt("hello", None).await.unwrap();

    let (_, config) = provider.last();
    let defaults = logica::Config::default().generation;
    assert_eq!(config.max_output_tokens, Some(2048));
    assert_eq!(config.temperature, Some(0.2));
    assert_eq!(config.top_p, Some(0.95));
    assert_eq!(config.max_output_tokens, defaults.max_output_tokens);
}
