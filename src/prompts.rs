//! Instruction templates and prompt assembly.
//!
//! Each domain operation owns one fixed template. A [`Prompt`] is the
//! template followed by the caller's input, framed the way the template's
//! worked examples frame theirs.

use std::fmt;

/// Which operation a prompt was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    Translate,
    TruthTable,
    Simplify,
    /// Caller-supplied text with no template.
    Generic,
}

impl PromptKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Translate => "translate",
            Self::TruthTable => "truth_table",
            Self::Simplify => "simplify",
            Self::Generic => "generic",
        }
    }

    /// Human-readable operation name, used in user-facing messages.
    pub fn description(self) -> &'static str {
        match self {
            Self::Translate => "translation",
            Self::TruthTable => "truth table",
            Self::Simplify => "simplification",
            Self::Generic => "prompt",
        }
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full prompt text plus the identity used for caching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    kind: PromptKind,
    input: String,
    text: String,
}

impl Prompt {
    /// Render the template for `kind` around `input`.
    pub fn new(kind: PromptKind, input: impl Into<String>) -> Self {
        let input = input.into();
        let text = match kind {
            PromptKind::Translate => {
                format!("{TRANSLATE_TEMPLATE}\nSentence: \"{input}\"\nJSON response:")
            }
            PromptKind::TruthTable => {
                format!("{TRUTH_TABLE_TEMPLATE}\nFormula: \"{input}\"\nJSON response:")
            }
            PromptKind::Simplify => {
                format!("{SIMPLIFY_TEMPLATE}\nFormula: \"{input}\"\nJSON response:")
            }
            PromptKind::Generic => input.clone(),
        };
        Self { kind, input, text }
    }

    pub fn kind(&self) -> PromptKind {
        self.kind
    }

    /// The caller-supplied part of the prompt.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// The complete text sent to the model.
    pub fn text(&self) -> &str {
        &self.text
    }
}

const TRANSLATE_TEMPLATE: &str = r#"You are an expert in propositional logic. Your task is to convert a natural-language sentence into symbolic form.
Follow these rules strictly:
1. Identify the atomic propositions in the sentence.
2. Assign a propositional variable (P, Q, R, ...) to each unique atomic proposition.
3. If a proposition is negated (e.g. "I did not see the film"), the atomic proposition is its affirmative form ("I saw the film").
4. Recognize logical connectives and their synonyms:
   - "and", "but", "although" translate to '∧'.
   - "or" translates to '∨'.
   - "if ... then" or "if ..., ..." translate to '→'.
   - "if and only if" translates to '↔'.
   - "not" translates to '¬'.
5. Build the final symbolic formula.
6. Return the result as VALID JSON with no text before or after it. The JSON must have two keys: "formula" and "legend".
   - "formula": a string with the symbolic expression.
   - "legend": an object whose keys are the variables (P, Q, ...) and whose values are the matching atomic propositions in affirmative form.

Example 1:
Sentence: "if you were not crazy, you would not have come here"
JSON response:
{
  "formula": "¬P → ¬Q",
  "legend": {
    "P": "you were crazy",
    "Q": "you would have come here"
  }
}

Example 2:
Sentence: "I saw the film although I did not read the novel"
JSON response:
{
  "formula": "P ∧ ¬Q",
  "legend": {
    "P": "I saw the film",
    "Q": "I read the novel"
  }
}
"#;

const TRUTH_TABLE_TEMPLATE: &str = r#"You are an expert in propositional logic. Your task is to build a detailed truth table for a given symbolic formula, showing every intermediate step.
Follow these rules strictly:
1. Identify the propositional variables (P, Q, R, ...) in the formula.
2. Identify every sub-formula of the expression, from the simplest to the most complex (the full formula).
3. Enumerate every combination of truth values (use 'V' for true and 'F' for false).
4. Evaluate each sub-formula and the full formula for every combination.
5. Classify the final formula as "Tautology", "Contradiction" or "Contingency".
6. Return the result as VALID JSON with no text before or after it. The JSON must have three keys: "header", "rows" and "classification".
   - "header": a list of column names. Variables first, then every sub-formula in order of complexity, then the full formula.
   - "rows": a list of lists; each inner list is one row of 'V' or 'F' values.
   - "classification": one of "Tautology", "Contradiction" or "Contingency".

Example 1:
Formula: "(P ∧ Q) → P"
JSON response:
{
  "header": ["P", "Q", "P ∧ Q", "(P ∧ Q) → P"],
  "rows": [
    ["V", "V", "V", "V"],
    ["V", "F", "F", "V"],
    ["F", "V", "F", "V"],
    ["F", "F", "F", "V"]
  ],
  "classification": "Tautology"
}

Use these symbols in the header formulas:
- Conjunction: ∧
- Disjunction: ∨
- Negation: ¬
- Conditional: →
- Biconditional: ↔
"#;

const SIMPLIFY_TEMPLATE: &str = r#"You are an expert in propositional logic. Your task is to simplify a given symbolic formula step by step, naming the logical law applied at each step.
Follow these rules strictly:
1. Start from the original formula.
2. Apply one logical law per step (De Morgan, distributive, absorption, identity, negation, double negation, idempotence, conditional elimination, ...).
3. Continue until no further simplification is possible.
4. Return the result as VALID JSON with no text before or after it. The JSON must have two keys: "steps" and "simplified_formula".
   - "steps": a list of objects, each with "formula" (the formula after the step) and "rule" (the law applied). The first step is the original formula with rule "Original formula".
   - "simplified_formula": the final simplified formula.

Example 1:
Formula: "(P ∧ Q) ∨ (P ∧ ¬Q)"
JSON response:
{
  "steps": [
    {
      "formula": "(P ∧ Q) ∨ (P ∧ ¬Q)",
      "rule": "Original formula"
    },
    {
      "formula": "P ∧ (Q ∨ ¬Q)",
      "rule": "Distributive law"
    },
    {
      "formula": "P ∧ V",
      "rule": "Negation law (Q ∨ ¬Q ≡ V)"
    },
    {
      "formula": "P",
      "rule": "Identity law (P ∧ V ≡ P)"
    }
  ],
  "simplified_formula": "P"
}

Use these symbols in the output formulas:
- Conjunction: ∧
- Disjunction: ∨
- Negation: ¬
- Conditional: →
- Biconditional: ↔
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_prompt_ends_with_input_frame() {
        let prompt = Prompt::new(PromptKind::Translate, "it rains and it is cold");
        assert!(prompt.text().starts_with("You are an expert in propositional logic"));
        assert!(
            prompt
                .text()
                .ends_with("Sentence: \"it rains and it is cold\"\nJSON response:")
        );
        assert_eq!(prompt.input(), "it rains and it is cold");
    }

    #[test]
    fn templates_name_the_required_fields() {
        let table = Prompt::new(PromptKind::TruthTable, "P");
        for field in ["\"header\"", "\"rows\"", "\"classification\""] {
            assert!(table.text().contains(field));
        }
        let simplify = Prompt::new(PromptKind::Simplify, "P");
        for field in ["\"steps\"", "\"rule\"", "\"simplified_formula\""] {
            assert!(simplify.text().contains(field));
        }
    }

    #[test]
    fn generic_prompt_is_verbatim() {
        let prompt = Prompt::new(PromptKind::Generic, "Explain modus ponens.");
        assert_eq!(prompt.text(), "Explain modus ponens.");
    }
}
