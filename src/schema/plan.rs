use super::normalize;
use super::SchemaError;
use regex::Regex;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

pub const DEFAULT_SEARCH_BY: &str = "enterprise_id";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContextVariablesPlan {
    pub definitions: BTreeMap<String, ContextVariableDefinition>,
    pub agents: BTreeMap<String, ContextAgentView>,
}

impl ContextVariablesPlan {
    pub fn from_json_str(raw: &str) -> Result<Self, SchemaError> {
        let value: Value = serde_json::from_str(raw).map_err(SchemaError::Json)?;
        Self::from_value(&value)
    }

    pub fn from_value(raw: &Value) -> Result<Self, SchemaError> {
        let normalized = normalize::normalize_plan(raw)?;
        let mut definitions = BTreeMap::new();
        for (name, definition) in normalized.definitions {
            let parsed: ContextVariableDefinition =
                serde_json::from_value(definition).map_err(|err| SchemaError::Definition {
                    name: name.clone(),
                    reason: err.to_string(),
                })?;
            definitions.insert(name, parsed);
        }
        let mut agents = BTreeMap::new();
        for (agent, view) in normalized.agents {
            let parsed: ContextAgentView =
                serde_json::from_value(view).map_err(|err| SchemaError::AgentView {
                    agent: agent.clone(),
                    reason: err.to_string(),
                })?;
            agents.insert(agent, parsed);
        }
        let plan = Self {
            definitions,
            agents,
        };
        plan.validate()?;
        Ok(plan)
    }

    fn validate(&self) -> Result<(), SchemaError> {
        for (agent, view) in &self.agents {
            for variable in &view.variables {
                if !self.definitions.contains_key(variable) {
                    return Err(SchemaError::UnknownVariable {
                        agent: agent.clone(),
                        variable: variable.clone(),
                    });
                }
            }
        }
        for (name, definition) in &self.definitions {
            for trigger in definition.source.triggers() {
                if let ContextTriggerSpec::AgentText {
                    matcher: TextMatch::Regex(pattern),
                    ..
                } = trigger
                {
                    Regex::new(pattern).map_err(|err| SchemaError::Regex {
                        variable: name.clone(),
                        pattern: pattern.clone(),
                        source: err,
                    })?;
                }
            }
        }
        Ok(())
    }

    pub fn definition(&self, name: &str) -> Option<&ContextVariableDefinition> {
        self.definitions.get(name)
    }

    pub fn agent_view(&self, agent: &str) -> Option<&ContextAgentView> {
        self.agents.get(agent)
    }

    pub fn agent_variables(&self, agent: &str) -> &[String] {
        self.agents
            .get(agent)
            .map(|view| view.variables.as_slice())
            .unwrap_or(&[])
    }

    pub fn derived(&self) -> impl Iterator<Item = (&String, &ContextVariableDefinition)> {
        self.definitions
            .iter()
            .filter(|(_, definition)| definition.source.is_derived())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextVariableDefinition {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub source: ContextVariableSource,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextAgentView {
    #[serde(default)]
    pub variables: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContextVariableSource {
    Database {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        database_name: Option<String>,
        collection: String,
        #[serde(default = "default_search_by")]
        search_by: String,
        field: String,
    },
    Environment {
        env_var: String,
        #[serde(default)]
        default: Option<Value>,
    },
    Static {
        #[serde(default)]
        value: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<Value>,
    },
    Derived {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<Value>,
        #[serde(default)]
        triggers: Vec<ContextTriggerSpec>,
    },
}

fn default_search_by() -> String {
    DEFAULT_SEARCH_BY.to_string()
}

impl ContextVariableSource {
    pub fn is_derived(&self) -> bool {
        matches!(self, Self::Derived { .. })
    }

    pub fn triggers(&self) -> &[ContextTriggerSpec] {
        match self {
            Self::Derived { triggers, .. } => triggers,
            _ => &[],
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Database { .. } => "database",
            Self::Environment { .. } => "environment",
            Self::Static { .. } => "static",
            Self::Derived { .. } => "derived",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerPhase {
    PostReply,
    PreReply,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContextTriggerSpec {
    AgentText {
        agent: String,
        #[serde(rename = "match")]
        matcher: TextMatch,
        #[serde(default = "default_trigger_value")]
        value: Value,
    },
    UiResponse {
        tool: String,
        response_key: String,
    },
}

fn default_trigger_value() -> Value {
    Value::Bool(true)
}

impl ContextTriggerSpec {
    pub fn phase(&self) -> TriggerPhase {
        match self {
            Self::AgentText { .. } => TriggerPhase::PostReply,
            Self::UiResponse { .. } => TriggerPhase::PreReply,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TextMatch {
    Equals(Vec<String>),
    Contains(String),
    Regex(String),
}

impl TextMatch {
    fn comparator_key(&self) -> &'static str {
        match self {
            Self::Equals(_) => "equals",
            Self::Contains(_) => "contains",
            Self::Regex(_) => "regex",
        }
    }

    fn parse(raw: &Value) -> Result<Self, String> {
        let obj = raw
            .as_object()
            .ok_or_else(|| "match must be a json object".to_string())?;
        let mut found = Vec::new();
        for key in ["equals", "contains", "regex"] {
            if obj.contains_key(key) {
                found.push(key);
            }
        }
        if found.len() != 1 {
            return Err(format!(
                "match must define exactly one of `equals`, `contains`, `regex`; found {}",
                found.len()
            ));
        }
        match found[0] {
            "equals" => match &obj["equals"] {
                Value::String(candidate) => Ok(Self::Equals(vec![candidate.clone()])),
                Value::Array(items) => {
                    let mut candidates = Vec::with_capacity(items.len());
                    for item in items {
                        match item.as_str() {
                            Some(candidate) => candidates.push(candidate.to_string()),
                            None => {
                                return Err(
                                    "`equals` candidates must all be strings".to_string()
                                )
                            }
                        }
                    }
                    Ok(Self::Equals(candidates))
                }
                _ => Err("`equals` must be a string or a list of strings".to_string()),
            },
            "contains" => obj["contains"]
                .as_str()
                .map(|needle| Self::Contains(needle.to_string()))
                .ok_or_else(|| "`contains` must be a string".to_string()),
            _ => obj["regex"]
                .as_str()
                .map(|pattern| Self::Regex(pattern.to_string()))
                .ok_or_else(|| "`regex` must be a string".to_string()),
        }
    }
}

impl Serialize for TextMatch {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Self::Equals(candidates) => map.serialize_entry(self.comparator_key(), candidates)?,
            Self::Contains(needle) => map.serialize_entry(self.comparator_key(), needle)?,
            Self::Regex(pattern) => map.serialize_entry(self.comparator_key(), pattern)?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TextMatch {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Self::parse(&raw).map_err(D::Error::custom)
    }
}

impl<'de> Deserialize<'de> for ContextVariablesPlan {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Self::from_value(&raw).map_err(D::Error::custom)
    }
}
