//! Decoding of the model's reply
//!
//! Replies arrive as an object, as a JSON string, as a JSON string holding
//! another JSON string, or wrapped in a Markdown fence. Anything that still
//! does not decode goes through the line-oriented legacy parser.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)```(?:json)?\s*(.+?)\s*```").expect("fence regex is valid")
});

/// Keys that may carry the path list, in priority order
const SELECTION_KEYS: [&str; 3] = ["selected", "paths", "files"];

/// What the model said, before path resolution
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedReply {
    /// Decoded JSON
    Structured {
        candidates: Vec<String>,
        confidence: Option<f64>,
        ask: Vec<String>,
        decoded: Value,
    },
    /// Undecodable text split into candidate lines
    Legacy { candidates: Vec<String>, text: String },
}

impl ParsedReply {
    pub fn candidates(&self) -> &[String] {
        match self {
            ParsedReply::Structured { candidates, .. } | ParsedReply::Legacy { candidates, .. } => {
                candidates
            }
        }
    }
}

/// Decode `choices[0].message.content`
pub fn parse_reply(content: &Value) -> ParsedReply {
    match content {
        Value::String(text) => match decode_text(text) {
            Some(decoded) => structured(decoded),
            None => {
                tracing::debug!("Reply is not JSON, falling back to line parsing");
                legacy(text)
            }
        },
        Value::Object(_) | Value::Array(_) => structured(content.clone()),
        other => legacy(&other.to_string()),
    }
}

/// JSON inside `text`, unwrapping one level of string encoding and Markdown fences
fn decode_text(text: &str) -> Option<Value> {
    let decoded = decode_json_region(text)?;
    match decoded {
        Value::String(inner) => decode_json_region(&inner).filter(|v| v.is_object() || v.is_array()),
        Value::Object(_) | Value::Array(_) => Some(decoded),
        _ => None,
    }
}

fn decode_json_region(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    let unfenced = FENCE_RE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map_or(trimmed, |m| m.as_str().trim());

    let start = unfenced.find(['{', '['])?;
    serde_json::from_str::<Value>(&unfenced[start..]).ok()
}

fn structured(decoded: Value) -> ParsedReply {
    let (candidates, confidence, ask) = match &decoded {
        Value::Array(items) => (strings(items), None, Vec::new()),
        Value::Object(map) => {
            let candidates = SELECTION_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_array))
                .map(|items| strings(items))
                .unwrap_or_default();
            let confidence = map.get("confidence").and_then(number);
            let ask = match map.get("ask") {
                Some(Value::Array(items)) => strings(items),
                Some(Value::String(question)) => vec![question.clone()],
                _ => Vec::new(),
            };
            (candidates, confidence, ask)
        }
        _ => (Vec::new(), None, Vec::new()),
    };

    ParsedReply::Structured {
        candidates,
        confidence,
        ask,
        decoded,
    }
}

fn legacy(text: &str) -> ParsedReply {
    let candidates = text
        .lines()
        .map(strip_line_formatting)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    ParsedReply::Legacy {
        candidates,
        text: text.to_string(),
    }
}

/// Drop bullets, backticks, quotes and trailing list punctuation
fn strip_line_formatting(line: &str) -> &str {
    line.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '*' | '•' | '`'))
        .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '`' | ',' | ';' | '[' | ']'))
        .trim_matches(['"', '\''])
        .trim()
}

fn strings(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Numbers, or numbers sent as strings
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|n: &f64| n.is_finite())
}
