use crate::container::{create_context_container, ContextContainer, HostContainerProvider};
use crate::messages;
use crate::resolve::SourceResolver;
use crate::schema::{ContextVariablesPlan, SchemaError};
use crate::triggers::{TriggerHit, TriggerMatcher};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub struct ConversationSession {
    plan: ContextVariablesPlan,
    matcher: TriggerMatcher,
    container: Box<dyn ContextContainer>,
}

impl ConversationSession {
    pub fn start(
        plan: ContextVariablesPlan,
        resolver: &SourceResolver,
        host: Option<&dyn HostContainerProvider>,
    ) -> Result<Self, SchemaError> {
        let matcher = TriggerMatcher::new(&plan)?;
        let seeds = resolver.seed(&plan);
        let container = create_context_container(seeds, host);
        Ok(Self {
            plan,
            matcher,
            container,
        })
    }

    pub fn plan(&self) -> &ContextVariablesPlan {
        &self.plan
    }

    pub fn container(&self) -> &dyn ContextContainer {
        self.container.as_ref()
    }

    pub fn container_mut(&mut self) -> &mut dyn ContextContainer {
        self.container.as_mut()
    }

    // agent_text triggers apply only when the turn completes.
    pub fn complete_turn(&mut self, agent: &str, payload: &Value) -> Vec<TriggerHit> {
        let text = messages::normalize_text_content(payload);
        let hits = self.matcher.evaluate_agent_text(agent, &text);
        self.matcher.apply(&hits, self.container.as_mut());
        hits
    }

    pub fn apply_ui_response(
        &mut self,
        tool: &str,
        response: &Map<String, Value>,
    ) -> Option<TriggerHit> {
        let contract = self.matcher.ui_contract(tool)?;
        let value = response
            .get(&contract.response_key)
            .cloned()
            .unwrap_or(Value::Null);
        let hit = TriggerHit {
            variable: contract.variable.clone(),
            value,
        };
        self.container.set(&hit.variable, hit.value.clone());
        Some(hit)
    }

    pub fn variables_for_agent(&self, agent: &str) -> BTreeMap<String, Value> {
        self.plan
            .agent_variables(agent)
            .iter()
            .filter_map(|name| {
                self.container
                    .get(name)
                    .map(|value| (name.clone(), value))
            })
            .collect()
    }

    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        messages::safe_context_snapshot(&self.container.data())
    }
}
