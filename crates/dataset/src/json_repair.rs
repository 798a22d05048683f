//! Lenient parsing of JSON returned by language models.
//!
//! Models wrap JSON in Markdown fences, emit several objects back to back
//! instead of a list, escape quotes twice or leave trailing commas. Parsing
//! is attempted on progressively repaired text until one stage succeeds.

use once_cell::sync::Lazy;
use protoqa_core::{AppError, AppResult};
use regex::Regex;
use serde_json::Value;

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[A-Za-z]*[ \t]*\n?(.*?)```").expect("valid regex"));
static ADJACENT_OBJECTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\}\s*\{").expect("valid regex"));
static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*([\]}])").expect("valid regex"));

/// Strip code fences. Several fenced blocks are kept as consecutive values.
fn strip_fences(raw: &str) -> String {
    let blocks: Vec<&str> = FENCED_BLOCK
        .captures_iter(raw)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|b| !b.is_empty())
        .collect();

    if blocks.is_empty() {
        raw.replace("```json", "").replace("```", "").trim().to_string()
    } else {
        blocks.join("\n")
    }
}

fn as_list_text(body: &str) -> String {
    let joined = ADJACENT_OBJECTS.replace_all(body, "},{");
    if joined.starts_with('[') {
        joined.into_owned()
    } else {
        format!("[{}]", joined)
    }
}

fn unescape(body: &str) -> String {
    let body = body.replace("\\\"", "\"").replace("\"\"", "\"");
    TRAILING_COMMA
        .replace_all(body.trim_end_matches(|c: char| c == ',' || c.is_whitespace()), "$1")
        .into_owned()
}

/// Parse a model reply as JSON, repairing common formatting faults.
pub fn parse_llm_json(raw: &str) -> AppResult<Value> {
    let body = strip_fences(raw);
    if body.is_empty() {
        return Err(AppError::Serialization("Empty model response".to_string()));
    }

    if let Ok(value) = serde_json::from_str(&body) {
        return Ok(value);
    }

    let listed = as_list_text(&body);
    if let Ok(value) = serde_json::from_str(&listed) {
        tracing::debug!("Parsed model JSON after wrapping in a list");
        return Ok(value);
    }

    let repaired = unescape(&listed);
    serde_json::from_str(&repaired).map_err(|e| {
        tracing::warn!("Malformed model JSON: {}", body);
        AppError::Serialization(format!("Unparseable model JSON: {}", e))
    })
}

/// A list stays a list, null is empty, anything else becomes a one-item list.
pub fn as_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}
