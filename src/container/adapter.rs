use super::memory::InMemoryContainer;
use super::ContextContainer;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

// Reserved key; the probe always removes it before the container is handed out.
const PROBE_KEY: &str = "__context_capability_probe__";

#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("host container construction failed: {0}")]
    Construction(String),
    #[error("host container failed capability probe at `{operation}`")]
    CapabilityProbe { operation: &'static str },
}

pub trait HostContainerProvider {
    fn create(
        &self,
        initial: &BTreeMap<String, Value>,
    ) -> Result<Box<dyn ContextContainer>, ContainerError>;
}

pub fn create_context_container(
    initial: BTreeMap<String, Value>,
    host: Option<&dyn HostContainerProvider>,
) -> Box<dyn ContextContainer> {
    if let Some(provider) = host {
        match try_host_container(provider, &initial) {
            Ok(container) => {
                debug!("using host-provided context container");
                return container;
            }
            Err(err) => {
                warn!(error = %err, "host context container unusable; using bundled fallback");
            }
        }
    }
    Box::new(InMemoryContainer::from_initial(initial))
}

fn try_host_container(
    provider: &dyn HostContainerProvider,
    initial: &BTreeMap<String, Value>,
) -> Result<Box<dyn ContextContainer>, ContainerError> {
    let mut container = provider.create(initial)?;
    probe_capabilities(container.as_mut())?;
    Ok(container)
}

fn probe_capabilities(container: &mut dyn ContextContainer) -> Result<(), ContainerError> {
    let marker = Value::String("probe".to_string());
    container.set(PROBE_KEY, marker.clone());
    if container.get(PROBE_KEY) != Some(marker) {
        return Err(ContainerError::CapabilityProbe { operation: "get" });
    }
    if !container.contains(PROBE_KEY) {
        return Err(ContainerError::CapabilityProbe {
            operation: "contains",
        });
    }
    if !container.keys().iter().any(|key| key == PROBE_KEY) {
        return Err(ContainerError::CapabilityProbe { operation: "keys" });
    }
    if !container.remove(PROBE_KEY) {
        return Err(ContainerError::CapabilityProbe { operation: "remove" });
    }
    if container.contains(PROBE_KEY) {
        return Err(ContainerError::CapabilityProbe { operation: "remove" });
    }
    Ok(())
}
