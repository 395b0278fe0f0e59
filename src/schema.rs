pub mod normalize;
pub mod plan;

pub use plan::{
    ContextAgentView, ContextTriggerSpec, ContextVariableDefinition, ContextVariableSource,
    ContextVariablesPlan, TextMatch, TriggerPhase, DEFAULT_SEARCH_BY,
};

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("context variables plan must be a json object")]
    PlanShape,
    #[error("invalid json in context variables plan: {0}")]
    Json(#[source] serde_json::Error),
    #[error("`definitions` must be a mapping or a list of named entries")]
    DefinitionsShape,
    #[error("`agents` must be a mapping or a list of named entries")]
    AgentsShape,
    #[error("definition `{name}` is invalid: {reason}")]
    Definition { name: String, reason: String },
    #[error("agent view `{agent}` is invalid: {reason}")]
    AgentView { agent: String, reason: String },
    #[error("agent `{agent}` references unknown context variable `{variable}`")]
    UnknownVariable { agent: String, variable: String },
    #[error("invalid regex `{pattern}` on variable `{variable}`: {source}")]
    Regex {
        variable: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
