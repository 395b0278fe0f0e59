use crate::container::ContextContainer;
use crate::schema::{ContextVariableDefinition, ContextVariableSource, ContextVariablesPlan};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum DocumentStoreError {
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    #[error("document lookup failed in `{collection}`: {reason}")]
    Lookup { collection: String, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLookup<'a> {
    pub database: Option<&'a str>,
    pub collection: &'a str,
    pub search_by: &'a str,
    pub scope_value: &'a Value,
    pub field: &'a str,
}

pub trait DocumentStore: Send + Sync {
    fn fetch_field(&self, lookup: &DocumentLookup<'_>) -> Result<Option<Value>, DocumentStoreError>;
}

#[derive(Clone, Default)]
pub struct SourceResolver {
    store: Option<Arc<dyn DocumentStore>>,
    default_database: Option<String>,
    scope: BTreeMap<String, Value>,
}

impl SourceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_default_database(mut self, database: impl Into<String>) -> Self {
        self.default_database = Some(database.into());
        self
    }

    pub fn with_scope_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.scope.insert(key.into(), value);
        self
    }

    pub fn seed(&self, plan: &ContextVariablesPlan) -> BTreeMap<String, Value> {
        let mut seeds = BTreeMap::new();
        for (name, definition) in &plan.definitions {
            if let Some(value) = self.resolve(name, definition) {
                debug!(variable = %name, kind = definition.source.kind(), "seeded context variable");
                seeds.insert(name.clone(), value);
            }
        }
        seeds
    }

    pub fn seed_container(&self, plan: &ContextVariablesPlan, container: &mut dyn ContextContainer) {
        for (name, value) in self.seed(plan) {
            container.set(&name, value);
        }
    }

    // None means the key starts the session absent.
    pub fn resolve(&self, name: &str, definition: &ContextVariableDefinition) -> Option<Value> {
        match &definition.source {
            ContextVariableSource::Static { value, default } => {
                if value.is_null() {
                    Some(default.clone().unwrap_or(Value::Null))
                } else {
                    Some(value.clone())
                }
            }
            ContextVariableSource::Environment { env_var, default } => {
                match std::env::var(env_var) {
                    Ok(raw) => Some(Value::String(raw)),
                    Err(_) => Some(default.clone().unwrap_or(Value::Null)),
                }
            }
            ContextVariableSource::Database {
                database_name,
                collection,
                search_by,
                field,
            } => Some(self.resolve_database(
                name,
                database_name.as_deref(),
                collection,
                search_by,
                field,
            )),
            ContextVariableSource::Derived { default, .. } => default.clone(),
        }
    }

    fn resolve_database(
        &self,
        name: &str,
        database_name: Option<&str>,
        collection: &str,
        search_by: &str,
        field: &str,
    ) -> Value {
        let Some(store) = &self.store else {
            warn!(variable = %name, "no document store configured; resolving to null");
            return Value::Null;
        };
        let Some(scope_value) = self.scope.get(search_by) else {
            warn!(
                variable = %name,
                search_by = %search_by,
                "no scope value for lookup key; resolving to null"
            );
            return Value::Null;
        };
        let lookup = DocumentLookup {
            database: database_name.or(self.default_database.as_deref()),
            collection,
            search_by,
            scope_value,
            field,
        };
        match store.fetch_field(&lookup) {
            Ok(Some(value)) => value,
            Ok(None) => Value::Null,
            Err(err) => {
                warn!(variable = %name, error = %err, "document lookup failed; resolving to null");
                Value::Null
            }
        }
    }
}
