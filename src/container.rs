use serde_json::Value;
use std::collections::BTreeMap;

pub mod adapter;
pub mod memory;

pub use adapter::{create_context_container, ContainerError, HostContainerProvider};
pub use memory::InMemoryContainer;

pub trait ContextContainer {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value);
    fn remove(&mut self, key: &str) -> bool;
    fn keys(&self) -> Vec<String>;
    fn contains(&self, key: &str) -> bool;
    fn data(&self) -> BTreeMap<String, Value>;

    fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }
}
