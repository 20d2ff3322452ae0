//! Tolerant extraction of a JSON object from model output.
//!
//! Models asked for JSON still wrap it in prose, markdown fences or trailing
//! commentary. [`extract_payload`] tries, in order:
//!
//! 1. the whole (trimmed) text as a JSON object;
//! 2. the balanced `{ … }` region starting at the first `{`, found by a
//!    depth-tracking scan that skips braces inside string literals;
//! 3. the greedy span from the first `{` to the last `}`.
//!
//! The first candidate that parses as a JSON object wins.

use serde_json::Value;
use tracing::debug;

use crate::types::Payload;
use crate::{LogicaError, Result};

/// Number of characters of the raw text quoted in parse errors.
const PREVIEW_CHARS: usize = 200;

/// Locate and decode the structured payload embedded in `raw`.
pub fn extract_payload(raw: &str) -> Result<Payload> {
    let text = raw.trim();

    if let Some(payload) = parse_object(text) {
        return Ok(payload);
    }

    if let Some(candidate) = balanced_object(text) {
        if let Some(payload) = parse_object(candidate) {
            debug!(strategy = "balanced", "extracted payload from surrounding text");
            return Ok(payload);
        }
    }

    if let Some(candidate) = greedy_object(text) {
        if let Some(payload) = parse_object(candidate) {
            debug!(strategy = "greedy", "extracted payload from surrounding text");
            return Ok(payload);
        }
    }

    Err(LogicaError::Parse(format!(
        "no JSON object found in response: {:?}",
        text.chars().take(PREVIEW_CHARS).collect::<String>()
    )))
}

fn parse_object(candidate: &str) -> Option<Payload> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// The region from the first `{` to its matching `}`.
///
/// Braces inside JSON string literals do not count toward nesting depth.
/// Returns `None` when the first `{` is never closed.
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// The largest brace-delimited span: first `{` through last `}`.
fn greedy_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
