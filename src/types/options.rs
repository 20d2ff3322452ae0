//! Generation options sent with every prompt.

use serde::{Deserialize, Serialize};

/// Tunable generation parameters.
///
/// Unset fields are left to the provider's defaults. Per-call overrides are
/// applied with [`overlay()`](Self::overlay).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Maximum number of tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    /// Sampling temperature. Higher values make output more random.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Nucleus sampling threshold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Ask the provider for a machine-parseable (JSON) response.
    pub json_output: bool,
}

impl GenerationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = Some(max);
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn top_p(mut self, p: f32) -> Self {
        self.top_p = Some(p);
        self
    }

    pub fn json_output(mut self, enabled: bool) -> Self {
        self.json_output = enabled;
        self
    }

    /// Apply `overrides` on top of `self`.
    ///
    /// Fields set in `overrides` win; `json_output` is always taken from
    /// `overrides`.
    pub fn overlay(&self, overrides: &GenerationConfig) -> GenerationConfig {
        GenerationConfig {
            max_output_tokens: overrides.max_output_tokens.or(self.max_output_tokens),
            temperature: overrides.temperature.or(self.temperature),
            top_p: overrides.top_p.or(self.top_p),
            json_output: overrides.json_output,
        }
    }
}
