use crate::container::ContextContainer;
use crate::schema::{
    ContextTriggerSpec, ContextVariablesPlan, SchemaError, TextMatch,
};
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerHit {
    pub variable: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiContract {
    pub variable: String,
    pub tool: String,
    pub response_key: String,
}

pub struct TriggerMatcher {
    text_triggers: Vec<TextTrigger>,
    ui_contracts: Vec<UiContract>,
}

struct TextTrigger {
    variable: String,
    agent: String,
    comparator: Comparator,
    value: Value,
}

enum Comparator {
    Equals(Vec<String>),
    Contains(String),
    Regex(Regex),
}

impl Comparator {
    fn matches(&self, text: &str) -> bool {
        match self {
            Self::Equals(candidates) => candidates.iter().any(|candidate| candidate == text),
            Self::Contains(needle) => text.contains(needle),
            Self::Regex(pattern) => pattern.is_match(text),
        }
    }
}

impl TriggerMatcher {
    pub fn new(plan: &ContextVariablesPlan) -> Result<Self, SchemaError> {
        let mut text_triggers = Vec::new();
        let mut ui_contracts = Vec::new();
        for (name, definition) in &plan.definitions {
            for trigger in definition.source.triggers() {
                match trigger {
                    ContextTriggerSpec::AgentText {
                        agent,
                        matcher,
                        value,
                    } => {
                        let comparator = match matcher {
                            TextMatch::Equals(candidates) => {
                                Comparator::Equals(candidates.clone())
                            }
                            TextMatch::Contains(needle) => Comparator::Contains(needle.clone()),
                            TextMatch::Regex(pattern) => Comparator::Regex(
                                Regex::new(pattern).map_err(|err| SchemaError::Regex {
                                    variable: name.clone(),
                                    pattern: pattern.clone(),
                                    source: err,
                                })?,
                            ),
                        };
                        text_triggers.push(TextTrigger {
                            variable: name.clone(),
                            agent: agent.clone(),
                            comparator,
                            value: value.clone(),
                        });
                    }
                    ContextTriggerSpec::UiResponse { tool, response_key } => {
                        ui_contracts.push(UiContract {
                            variable: name.clone(),
                            tool: tool.clone(),
                            response_key: response_key.clone(),
                        });
                    }
                }
            }
        }
        Ok(Self {
            text_triggers,
            ui_contracts,
        })
    }

    // First matching trigger wins per variable, in declaration order.
    pub fn evaluate_agent_text(&self, agent: &str, text: &str) -> Vec<TriggerHit> {
        let mut matched: HashSet<&str> = HashSet::new();
        let mut hits = Vec::new();
        for trigger in &self.text_triggers {
            if trigger.agent != agent || matched.contains(trigger.variable.as_str()) {
                continue;
            }
            if trigger.comparator.matches(text) {
                matched.insert(trigger.variable.as_str());
                hits.push(TriggerHit {
                    variable: trigger.variable.clone(),
                    value: trigger.value.clone(),
                });
            }
        }
        hits
    }

    pub fn apply(&self, hits: &[TriggerHit], container: &mut dyn ContextContainer) {
        for hit in hits {
            debug!(variable = %hit.variable, "applying trigger hit");
            container.set(&hit.variable, hit.value.clone());
        }
    }

    pub fn ui_contract(&self, tool: &str) -> Option<&UiContract> {
        self.ui_contracts
            .iter()
            .find(|contract| contract.tool == tool)
    }

    pub fn ui_contracts(&self) -> &[UiContract] {
        &self.ui_contracts
    }
}
