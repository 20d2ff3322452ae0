//! Logica error types

use std::fmt;
use std::time::Duration;

/// Coarse classification of a [`LogicaError`], used for logging and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Credential or configuration missing/invalid. Raised before any network activity.
    Configuration,
    /// Non-retryable HTTP failure, network failure, or retry budget exhausted.
    Transport,
    /// The provider is overloaded (HTTP 429/503).
    RateLimit,
    /// The wall-clock deadline elapsed while waiting for a worker.
    Timeout,
    /// The provider returned no candidate generations.
    EmptyResponse,
    /// The response text held no structured payload.
    Parse,
    /// The payload lacked fields required by the operation.
    Schema,
    /// The caller supplied unusable input.
    InvalidInput,
    /// Worker panic or service shut down.
    Internal,
}

impl ErrorKind {
    /// Stable lowercase label, used as a metrics/log field value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Transport => "transport",
            Self::RateLimit => "rate_limit",
            Self::Timeout => "timeout",
            Self::EmptyResponse => "empty_response",
            Self::Parse => "parse",
            Self::Schema => "schema",
            Self::InvalidInput => "invalid_input",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logica error types
#[derive(Debug, thiserror::Error)]
pub enum LogicaError {
    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    // Provider/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited (HTTP {status}), retry after {retry_after:?}")]
    RateLimited {
        status: u16,
        retry_after: Option<Duration>,
    },

    #[error("no response within {0:?}")]
    Timeout(Duration),

    // Response errors
    #[error("empty response from model: {}", .feedback.as_deref().unwrap_or("no details"))]
    EmptyResponse { feedback: Option<String> },

    #[error("no structured payload in response: {0}")]
    Parse(String),

    #[error("unexpected response shape for {operation}: {detail}")]
    Schema {
        operation: &'static str,
        detail: String,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Runtime errors
    #[error("worker failed: {0}")]
    Worker(String),

    #[error("service is shut down")]
    ShutDown,
}

impl LogicaError {
    /// The coarse classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Http(_) | Self::Api { .. } => ErrorKind::Transport,
            Self::RateLimited { .. } => ErrorKind::RateLimit,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::EmptyResponse { .. } => ErrorKind::EmptyResponse,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Schema { .. } => ErrorKind::Schema,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Worker(_) | Self::ShutDown => ErrorKind::Internal,
        }
    }

    /// Whether retrying the same request may succeed.
    ///
    /// Only overload responses (429/503) and server-side 5xx failures qualify.
    /// Connect and read timeouts fail the call outright.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Api { status, .. } => (500..600).contains(status),
            _ => false,
        }
    }

    /// Server-supplied retry hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Message safe to show to an end user.
    ///
    /// Never includes URLs, credentials or raw response bodies. Provider
    /// messages are passed through for non-retryable API errors, where they
    /// describe what was wrong with the request.
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration(_) => {
                "Configuration error: the API key for the AI service is not set.".to_string()
            }
            Self::Http(_) => {
                "Could not reach the AI service. Please try again.".to_string()
            }
            Self::Api { message, .. } => format!("AI service error: {message}"),
            Self::RateLimited { .. } => "The AI service is receiving too many requests right \
                now. Please wait a moment and try again."
                .to_string(),
            Self::Timeout(_) => {
                "The AI service took too long to respond. Please try again.".to_string()
            }
            Self::EmptyResponse { feedback } => format!(
                "The AI service returned an empty or blocked response. Cause: {}",
                feedback.as_deref().unwrap_or("no additional details.")
            ),
            Self::Parse(_) => {
                "The AI returned a response in an unexpected format. Please try again."
                    .to_string()
            }
            Self::Schema { operation, .. } => {
                format!("The AI response did not have the expected format for the {operation}.")
            }
            Self::InvalidInput(reason) => format!("Invalid input: {reason}"),
            Self::Worker(_) | Self::ShutDown => {
                "The request could not be processed. Please try again later.".to_string()
            }
        }
    }
}

/// Result type alias for Logica operations
pub type Result<T> = std::result::Result<T, LogicaError>;

/// Display-safe failure returned by the domain operations of
/// [`PromptService`](crate::PromptService).
///
/// The full [`LogicaError`] is logged server-side before conversion; only the
/// sanitized message and the classification cross this boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<LogicaError> for Failure {
    fn from(err: LogicaError) -> Self {
        Self {
            kind: err.kind(),
            message: err.user_message(),
        }
    }
}
