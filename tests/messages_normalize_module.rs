use contextra::messages::{
    extract_agent_name, normalize_content, normalize_text_content, normalize_transcript,
    safe_context_snapshot, serialize_event_content, TranscriptRole, REDACTED_MARKER,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

#[test]
fn messages_module_transcript_keeps_only_well_formed_records() {
    let records = vec![
        json!({"role": "user", "name": "alice", "content": "hi"}),
        json!({"role": "assistant", "name": "InterviewAgent", "content": "hello"}),
        json!({"role": "system", "name": "sys", "content": "dropped role"}),
        json!({"role": "user", "name": "bob", "content": null}),
        json!({"role": "assistant", "content": {"text": "nested"}}),
        json!("not a record"),
    ];
    let normalized = normalize_transcript(&records);
    assert_eq!(normalized.len(), 3);
    assert_eq!(normalized[0].role, TranscriptRole::User);
    assert_eq!(normalized[0].name, "alice");
    assert_eq!(normalized[1].content, "hello");
    // The one repair heuristic: a missing name defaults from the role.
    assert_eq!(normalized[2].name, "assistant");
    assert_eq!(normalized[2].content, "nested");
}

#[test]
fn messages_module_text_content_prefers_content_keys() {
    assert_eq!(normalize_text_content(&json!({"content": "hi"})), "hi");
    assert_eq!(normalize_text_content(&json!({"text": "yo"})), "yo");
    assert_eq!(normalize_text_content(&json!({"message": "hey"})), "hey");
    assert_eq!(normalize_text_content(&json!(["a", "b"])), "a b");
    assert_eq!(normalize_text_content(&json!("plain")), "plain");
    assert_eq!(normalize_text_content(&json!(42)), "42");
    assert_eq!(normalize_text_content(&json!(true)), "true");
    assert_eq!(normalize_text_content(&Value::Null), "");
    // Nested containers resolve recursively.
    assert_eq!(
        normalize_text_content(&json!({"content": {"text": ["a", "b"]}})),
        "a b"
    );
    // A mapping without a content key is stringified.
    assert_eq!(
        normalize_text_content(&json!({"other": 1})),
        "{\"other\":1}"
    );
}

#[test]
fn messages_module_normalize_content_accepts_any_serializable_payload() {
    #[derive(Serialize)]
    struct TurnEvent {
        content: String,
        tokens: u32,
    }
    let event = TurnEvent {
        content: "NEXT".to_string(),
        tokens: 3,
    };
    assert_eq!(normalize_content(&event), "NEXT");
    assert_eq!(normalize_content(&vec!["a", "b"]), "a b");
}

#[test]
fn messages_module_serialize_event_content_round_trips_values() {
    assert_eq!(
        serialize_event_content(&json!({"a": [1, 2]})),
        json!({"a": [1, 2]})
    );
    assert_eq!(serialize_event_content(&"text"), json!("text"));
}

#[test]
fn messages_module_extracts_agent_name_from_structure() {
    assert_eq!(
        extract_agent_name(&json!({"sender": "InterviewAgent"})),
        Some("InterviewAgent".to_string())
    );
    assert_eq!(
        extract_agent_name(&json!({"payload": {"agent_name": "Planner"}})),
        Some("Planner".to_string())
    );
    assert_eq!(
        extract_agent_name(&json!([{"noise": 1}, {"agent": "Scout"}])),
        Some("Scout".to_string())
    );
    // `sender` is preferred over `name` at the same level.
    assert_eq!(
        extract_agent_name(&json!({"name": "fallback", "sender": "primary"})),
        Some("primary".to_string())
    );
}

#[test]
fn messages_module_extracts_agent_name_from_text_as_last_resort() {
    assert_eq!(
        extract_agent_name(&json!({"log": "event from sender=InterviewAgent at t0"})),
        Some("InterviewAgent".to_string())
    );
    assert_eq!(
        extract_agent_name(&json!("sender: \"Reviewer\"")),
        Some("Reviewer".to_string())
    );
    assert_eq!(extract_agent_name(&json!({"log": "no names here"})), None);
    assert_eq!(extract_agent_name(&json!(17)), None);
}

#[test]
fn messages_module_snapshot_redacts_sensitive_keys() {
    let data = BTreeMap::from_iter([
        ("api_key".to_string(), json!("sk-abc123")),
        ("note".to_string(), json!("hello")),
        ("SessionToken".to_string(), json!("t-1")),
        ("password_hint".to_string(), json!("pet name")),
    ]);
    let snapshot = safe_context_snapshot(&data);
    assert_eq!(snapshot["api_key"], json!(REDACTED_MARKER));
    assert_eq!(snapshot["SessionToken"], json!(REDACTED_MARKER));
    assert_eq!(snapshot["password_hint"], json!(REDACTED_MARKER));
    assert_eq!(snapshot["note"], json!("hello"));
}

#[test]
fn messages_module_snapshot_truncates_long_strings() {
    let long = "x".repeat(500);
    let data = BTreeMap::from_iter([
        ("transcript".to_string(), json!(long)),
        ("nested".to_string(), json!({"inner": "y".repeat(400)})),
    ]);
    let snapshot = safe_context_snapshot(&data);
    let truncated = snapshot["transcript"].as_str().expect("string");
    assert!(truncated.starts_with(&"x".repeat(300)));
    assert!(truncated.ends_with("...[truncated]"));
    assert!(truncated.len() < 400);
    let nested = snapshot["nested"]["inner"].as_str().expect("nested string");
    assert!(nested.ends_with("...[truncated]"));
}

#[test]
fn messages_module_snapshot_redacts_nested_sensitive_keys() {
    let data = BTreeMap::from_iter([(
        "credentials".to_string(),
        json!({"api_key": "sk-1", "region": "eu"}),
    )]);
    let snapshot = safe_context_snapshot(&data);
    assert_eq!(snapshot["credentials"]["api_key"], json!(REDACTED_MARKER));
    assert_eq!(snapshot["credentials"]["region"], json!("eu"));
}
