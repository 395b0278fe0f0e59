use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub const REDACTED_MARKER: &str = "***REDACTED***";
pub const UNSERIALIZABLE_MARKER: &str = "<unserializable>";
pub const SNAPSHOT_VALUE_LIMIT: usize = 300;

const CONTENT_KEYS: [&str; 3] = ["content", "text", "message"];
const AGENT_NAME_KEYS: [&str; 4] = ["sender", "agent", "agent_name", "name"];
const SENSITIVE_KEY_FRAGMENTS: [&str; 5] = ["secret", "api", "key", "token", "password"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptRole {
    User,
    Assistant,
}

impl TranscriptRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

impl std::fmt::Display for TranscriptRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub role: TranscriptRole,
    pub name: String,
    pub content: String,
}

// The single repair applied is defaulting a missing name from the role.
pub fn normalize_transcript(records: &[Value]) -> Vec<TranscriptMessage> {
    records.iter().filter_map(normalize_transcript_record).collect()
}

fn normalize_transcript_record(record: &Value) -> Option<TranscriptMessage> {
    let obj = record.as_object()?;
    let role = obj
        .get("role")
        .and_then(Value::as_str)
        .and_then(TranscriptRole::parse)?;
    let content = obj.get("content")?;
    if content.is_null() {
        return None;
    }
    let name = match obj
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
    {
        Some(name) => name.to_string(),
        None => role.as_str().to_string(),
    };
    Some(TranscriptMessage {
        role,
        name,
        content: normalize_text_content(content),
    })
}

pub fn normalize_text_content(payload: &Value) -> String {
    match payload {
        Value::String(text) => text.clone(),
        Value::Object(obj) => {
            for key in CONTENT_KEYS {
                if let Some(inner) = obj.get(key) {
                    return normalize_text_content(inner);
                }
            }
            Value::Object(obj.clone()).to_string()
        }
        Value::Array(items) => items
            .iter()
            .map(normalize_text_content)
            .collect::<Vec<_>>()
            .join(" "),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub fn normalize_content<T: Serialize>(payload: &T) -> String {
    match serde_json::to_value(payload) {
        Ok(value) => normalize_text_content(&value),
        Err(_) => String::new(),
    }
}

pub fn serialize_event_content<T: Serialize>(payload: &T) -> Value {
    serde_json::to_value(payload)
        .unwrap_or_else(|_| Value::String(UNSERIALIZABLE_MARKER.to_string()))
}

pub fn extract_agent_name(payload: &Value) -> Option<String> {
    scan_structural(payload).or_else(|| scan_textual(payload))
}

fn scan_structural(payload: &Value) -> Option<String> {
    match payload {
        Value::Object(obj) => {
            for key in AGENT_NAME_KEYS {
                if let Some(name) = obj.get(key).and_then(Value::as_str) {
                    let name = name.trim();
                    if !name.is_empty() {
                        return Some(name.to_string());
                    }
                }
            }
            obj.values().find_map(scan_structural)
        }
        Value::Array(items) => items.iter().find_map(scan_structural),
        _ => None,
    }
}

fn scan_textual(payload: &Value) -> Option<String> {
    match payload {
        Value::String(text) => sender_pattern()
            .captures(text)
            .map(|captures| captures[1].to_string()),
        Value::Object(obj) => obj.values().find_map(scan_textual),
        Value::Array(items) => items.iter().find_map(scan_textual),
        _ => None,
    }
}

fn sender_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"sender\s*[=:]\s*"?([A-Za-z0-9_\-]+)"?"#).expect("sender pattern is valid")
    })
}

pub fn safe_context_snapshot(data: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    data.iter()
        .map(|(key, value)| {
            let sanitized = if is_sensitive_key(key) {
                Value::String(REDACTED_MARKER.to_string())
            } else {
                sanitize_snapshot_value(value)
            };
            (key.clone(), sanitized)
        })
        .collect()
}

fn is_sensitive_key(key: &str) -> bool {
    let lowered = key.to_ascii_lowercase();
    SENSITIVE_KEY_FRAGMENTS
        .iter()
        .any(|fragment| lowered.contains(fragment))
}

fn sanitize_snapshot_value(value: &Value) -> Value {
    match value {
        Value::String(text) if text.chars().count() > SNAPSHOT_VALUE_LIMIT => {
            let truncated: String = text.chars().take(SNAPSHOT_VALUE_LIMIT).collect();
            Value::String(format!("{truncated}...[truncated]"))
        }
        Value::Object(obj) => Value::Object(
            obj.iter()
                .map(|(key, inner)| {
                    if is_sensitive_key(key) {
                        (key.clone(), Value::String(REDACTED_MARKER.to_string()))
                    } else {
                        (key.clone(), sanitize_snapshot_value(inner))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => {
            Value::Array(items.iter().map(sanitize_snapshot_value).collect())
        }
        other => other.clone(),
    }
}
