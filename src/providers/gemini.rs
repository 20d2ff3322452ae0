//! Google Gemini `generateContent` client.
//!
//! See: <https://ai.google.dev/api/generate-content>
//!
//! One pooled [`reqwest::Client`] is built per [`GeminiClient`] and reused for
//! every call. The API key travels as the `key` query parameter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::GenerateProvider;
use crate::types::GenerationConfig;
use crate::{LogicaError, Result};

/// Default base URL for the Gemini API.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";

/// Connection settings for [`GeminiClient`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Base URL, without trailing slash. Default: [`DEFAULT_ENDPOINT`].
    pub endpoint: String,
    /// Model ID. Default: [`DEFAULT_MODEL`].
    pub model: String,
    /// TCP/TLS connect timeout. Default: 10s.
    pub connect_timeout: Duration,
    /// Maximum time between reads of the response. Default: 60s.
    pub read_timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(60),
        }
    }
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the base URL (e.g. a wiremock server in tests).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }
}

/// Client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    api_key: Option<String>,
    http: Client,
    url: String,
}

impl GeminiClient {
    /// Create a client.
    ///
    /// A missing `api_key` is accepted here; every call then fails with
    /// [`LogicaError::Configuration`] without touching the network.
    pub fn new(api_key: Option<String>, config: &GeminiConfig) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .build()
            .map_err(|e| LogicaError::Configuration(format!("failed to build HTTP client: {e}")))?;

        let url = format!(
            "{}/models/{}:generateContent",
            config.endpoint.trim_end_matches('/'),
            config.model
        );

        Ok(Self {
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            http,
            url,
        })
    }

    /// Generate content for a single prompt and return the first candidate's text.
    pub async fn generate_content(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            LogicaError::Configuration("GOOGLE_API_KEY is not set".to_string())
        })?;

        let body = GenerateContentRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
            generation_config: WireGenerationConfig::from_options(config),
        };

        // `without_url` keeps the API key (a query parameter) out of error text.
        let response = self
            .http
            .post(&self.url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| LogicaError::Http(e.without_url().to_string()))?;

        let response = Self::handle_response_errors(response).await?;

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LogicaError::Http(e.without_url().to_string()))?;

        parsed.into_text()
    }

    /// Check response status and map to appropriate error.
    async fn handle_response_errors(response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.trim().parse::<u64>().ok())
                    .map(Duration::from_secs);
                Err(LogicaError::RateLimited {
                    status: status.as_u16(),
                    retry_after,
                })
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ErrorEnvelope>(&body)
                    .ok()
                    .and_then(|envelope| envelope.error.message)
                    .unwrap_or_else(|| "unknown API error".to_string());
                debug!(status = status.as_u16(), %message, "gemini returned an error");
                Err(LogicaError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

#[async_trait]
impl GenerateProvider for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        self.generate_content(prompt, config).await
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<WireGenerationConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

impl WireGenerationConfig {
    /// `None` when nothing is set, so the block is omitted entirely.
    fn from_options(config: &GenerationConfig) -> Option<Self> {
        let wire = Self {
            max_output_tokens: config.max_output_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            response_mime_type: config.json_output.then_some("application/json"),
        };
        let empty = wire.max_output_tokens.is_none()
            && wire.temperature.is_none()
            && wire.top_p.is_none()
            && wire.response_mime_type.is_none();
        (!empty).then_some(wire)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Result<String> {
        let feedback = self.prompt_feedback.map(|f| f.to_string());
        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(LogicaError::EmptyResponse { feedback });
        };
        let text: String = candidate
            .content
            .into_iter()
            .flat_map(|content| content.parts)
            .filter_map(|part| part.text)
            .collect();
        if text.is_empty() {
            return Err(LogicaError::EmptyResponse { feedback });
        }
        Ok(text)
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}
