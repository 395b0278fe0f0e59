use super::SchemaError;
use serde_json::{Map, Value};

const DEFINITION_NAME_KEYS: [&str; 2] = ["name", "key"];
const AGENT_NAME_KEYS: [&str; 3] = ["agent", "agent_name", "name"];

pub(crate) struct NormalizedPlan {
    pub definitions: Map<String, Value>,
    pub agents: Map<String, Value>,
}

pub(crate) fn normalize_plan(raw: &Value) -> Result<NormalizedPlan, SchemaError> {
    let obj = raw.as_object().ok_or(SchemaError::PlanShape)?;
    Ok(NormalizedPlan {
        definitions: normalize_definitions(obj.get("definitions"))?,
        agents: normalize_agents(obj.get("agents"))?,
    })
}

fn normalize_definitions(raw: Option<&Value>) -> Result<Map<String, Value>, SchemaError> {
    let mut out = Map::new();
    match raw {
        None | Some(Value::Null) => {}
        Some(Value::Object(entries)) => {
            for (name, definition) in entries {
                out.insert(name.clone(), normalize_definition(definition.clone()));
            }
        }
        Some(Value::Array(entries)) => {
            for entry in entries {
                let Some(obj) = entry.as_object() else {
                    continue;
                };
                let Some(name) = extract_entry_name(obj, &DEFINITION_NAME_KEYS) else {
                    continue;
                };
                let mut rest = obj.clone();
                for key in DEFINITION_NAME_KEYS {
                    rest.remove(key);
                }
                out.insert(name, normalize_definition(Value::Object(rest)));
            }
        }
        Some(_) => return Err(SchemaError::DefinitionsShape),
    }
    Ok(out)
}

fn extract_entry_name(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        obj.get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    })
}

fn normalize_definition(mut definition: Value) -> Value {
    if let Some(obj) = definition.as_object_mut() {
        if let Some(source) = obj.get_mut("source") {
            normalize_source(source);
        }
    }
    definition
}

fn normalize_source(source: &mut Value) {
    let Some(obj) = source.as_object_mut() else {
        return;
    };
    if obj.get("type").and_then(Value::as_str) == Some("declarative") {
        obj.insert("type".to_string(), Value::String("static".to_string()));
    }
    if obj.get("type").and_then(Value::as_str) == Some("derived") {
        match obj.get_mut("triggers") {
            Some(Value::Array(triggers)) => {
                for trigger in triggers {
                    normalize_trigger(trigger);
                }
            }
            _ => {
                obj.insert("triggers".to_string(), Value::Array(Vec::new()));
            }
        }
    } else {
        obj.remove("triggers");
    }
}

fn normalize_trigger(trigger: &mut Value) {
    let Some(obj) = trigger.as_object_mut() else {
        return;
    };
    if obj.get("type").and_then(Value::as_str) != Some("agent_text") {
        return;
    }
    if obj.contains_key("match") {
        return;
    }
    let mut lifted = Map::new();
    for key in ["equals", "contains", "regex"] {
        if let Some(comparator) = obj.remove(key) {
            lifted.insert(key.to_string(), comparator);
        }
    }
    if !lifted.is_empty() {
        obj.insert("match".to_string(), Value::Object(lifted));
    }
}

fn normalize_agents(raw: Option<&Value>) -> Result<Map<String, Value>, SchemaError> {
    let mut out = Map::new();
    match raw {
        None | Some(Value::Null) => {}
        Some(Value::Object(entries)) => {
            for (agent, view) in entries {
                out.insert(agent.clone(), normalize_agent_view(view.clone()));
            }
        }
        Some(Value::Array(entries)) => {
            for entry in entries {
                let Some(obj) = entry.as_object() else {
                    continue;
                };
                let Some(agent) = extract_entry_name(obj, &AGENT_NAME_KEYS) else {
                    continue;
                };
                let mut rest = obj.clone();
                for key in AGENT_NAME_KEYS {
                    rest.remove(key);
                }
                out.insert(agent, normalize_agent_view(Value::Object(rest)));
            }
        }
        Some(_) => return Err(SchemaError::AgentsShape),
    }
    Ok(out)
}

fn normalize_agent_view(view: Value) -> Value {
    let mut obj = match view {
        Value::Object(obj) => obj,
        Value::Array(items) => {
            let mut obj = Map::new();
            obj.insert("variables".to_string(), Value::Array(items));
            obj
        }
        _ => Map::new(),
    };
    let variables = match obj.remove("variables") {
        Some(Value::Array(items)) => items.iter().map(coerce_variable_name).collect(),
        _ => Vec::new(),
    };
    obj.insert(
        "variables".to_string(),
        Value::Array(variables.into_iter().map(Value::String).collect()),
    );
    Value::Object(obj)
}

fn coerce_variable_name(raw: &Value) -> String {
    match raw {
        Value::String(name) => name.clone(),
        other => other.to_string(),
    }
}
