use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{core::ContainerConfig, listeners::Listen};

use super::{container::ServiceContainer, registry::Registry, stability::Stability};

/// Builder for constructing a [`ServiceContainer`] with container-wide listeners.
pub struct ContainerBuilder {
    cfg: ContainerConfig,
    listeners: Vec<Arc<dyn Listen>>,
}

impl ContainerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: ContainerConfig) -> Self {
        Self {
            cfg,
            listeners: Vec::new(),
        }
    }

    /// Adds a listener attached to every service installed into the container.
    ///
    /// Container-wide listeners see each event before the service's own listeners.
    pub fn with_listener(mut self, listener: Arc<dyn Listen>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Replaces the container-wide listeners.
    pub fn with_listeners(mut self, listeners: Vec<Arc<dyn Listen>>) -> Self {
        self.listeners = listeners;
        self
    }

    /// Builds and returns the container.
    ///
    /// No task is spawned here; controllers are spawned on the runtime that calls
    /// [`ServiceContainer::install`].
    pub fn build(self) -> Arc<ServiceContainer> {
        Arc::new(ServiceContainer::new_internal(
            self.cfg,
            Registry::new(),
            Stability::new(),
            CancellationToken::new(),
            self.listeners,
        ))
    }
}
