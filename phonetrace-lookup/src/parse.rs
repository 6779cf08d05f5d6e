//! Turning raw model text into a validated payload.
//!
//! Models wrap JSON in fences or prose often enough that the text is tried in
//! three shapes: as-is, the first ```json fenced block, and the first `{`
//! from which a whole object decodes. The first shape that decodes is then
//! checked against the schema by deserializing into strict wire structs.

use crate::types::{Confidence, SocialPresence};
use phonetrace_common::{PhonetraceError, Result};
use regex::Regex;
use serde::Deserialize;
use serde_json::{Deserializer, Value};
use std::sync::LazyLock;

static FENCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").ok());

/// The model-produced part of a lookup result. Every field is required;
/// unknown fields (including any `phoneNumber` the model volunteers) are
/// ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LookupPayload {
    pub name: String,
    pub admin_name: String,
    pub city: String,
    pub location: String,
    pub carrier: String,
    #[serde(rename = "type")]
    pub line_type: String,
    pub summary: String,
    pub confidence: Confidence,
    pub social_presence: SocialPresence,
}

/// Locate the JSON object inside `text`, if there is one.
///
/// Braces in surrounding prose are skipped: each `{` is tried in turn and the
/// first position that decodes to a complete object wins.
pub fn extract_json_block(text: &str) -> Option<Value> {
    let fenced = FENCE
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok())
        .filter(Value::is_object);
    fenced.or_else(|| first_object(text))
}

fn first_object(text: &str) -> Option<Value> {
    text.match_indices('{').find_map(|(i, _)| {
        match Deserializer::from_str(&text[i..]).into_iter::<Value>().next() {
            Some(Ok(value @ Value::Object(_))) => Some(value),
            _ => None,
        }
    })
}

/// Decode `text` into JSON, tolerating wrapping around the object.
pub fn decode_model_json(text: &str) -> Result<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(PhonetraceError::Malformed(
            "model returned an empty response".to_string(),
        ));
    }

    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    if let Some(value) = extract_json_block(trimmed) {
        return Ok(value);
    }

    if trimmed.contains('{') {
        let reason = serde_json::from_str::<Value>(trimmed)
            .err()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no complete object".to_string());
        return Err(PhonetraceError::Malformed(format!(
            "model output is not valid JSON ({reason}): {}",
            snippet(trimmed)
        )));
    }

    Err(PhonetraceError::Malformed(format!(
        "no JSON object found in model output: {}",
        snippet(trimmed)
    )))
}

pub(crate) fn parse_lookup_payload(text: &str) -> Result<LookupPayload> {
    let value = decode_model_json(text)?;
    serde_json::from_value(value).map_err(|e| {
        PhonetraceError::Malformed(format!("model output does not match the lookup schema: {e}"))
    })
}

fn snippet(text: &str) -> String {
    const MAX: usize = 160;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(MAX).collect();
        out.push('…');
        out
    }
}
