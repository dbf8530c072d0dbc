//! # Install request for a service.
//!
//! Defines [`ServiceSpec`], the bundle handed to
//! [`ServiceContainer::install`](crate::ServiceContainer::install): a name, optional
//! aliases, declared dependencies (required or optional), an initial mode, the payload,
//! and listeners to attach before the controller takes its first step.
//!
//! ## Rules
//! - Dependencies keep their declaration order; a name declared twice keeps its first
//!   position, and `Required` wins over `Optional`.
//! - A spec without an explicit mode takes `ContainerConfig::default_mode`.

use std::sync::Arc;

use crate::listeners::Listen;
use crate::policies::Mode;
use crate::services::{ServiceName, ServiceRef};

/// Kind of a dependency edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    /// The dependent cannot start until the target is installed and up.
    Required,
    /// An absent target counts as satisfied; see the optional adapter.
    Optional,
}

/// Specification for installing a service.
///
/// ## Example
/// ```rust
/// use servicevisor::{DependencyKind, Mode, NullService, ServiceSpec};
/// use std::sync::Arc;
///
/// let spec = ServiceSpec::new("web", Arc::new(NullService))
///     .with_alias("http")
///     .with_dependency("db")
///     .with_optional_dependency("cache")
///     .with_mode(Mode::OnDemand);
///
/// assert_eq!(spec.name().as_str(), "web");
/// assert_eq!(spec.dependencies().len(), 2);
/// assert_eq!(spec.dependencies()[1].1, DependencyKind::Optional);
/// ```
#[derive(Clone)]
pub struct ServiceSpec {
    name: ServiceName,
    aliases: Vec<ServiceName>,
    dependencies: Vec<(ServiceName, DependencyKind)>,
    mode: Option<Mode>,
    service: ServiceRef,
    listeners: Vec<Arc<dyn Listen>>,
}

impl ServiceSpec {
    /// Creates a new spec with no aliases, no dependencies and the container's default mode.
    pub fn new(name: impl Into<ServiceName>, service: ServiceRef) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            dependencies: Vec::new(),
            mode: None,
            service,
            listeners: Vec::new(),
        }
    }

    /// Adds an alias the service is also registered under.
    pub fn with_alias(mut self, alias: impl Into<ServiceName>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Adds a required dependency.
    pub fn with_dependency(self, name: impl Into<ServiceName>) -> Self {
        self.with_dependency_kind(name, DependencyKind::Required)
    }

    /// Adds an optional dependency.
    pub fn with_optional_dependency(self, name: impl Into<ServiceName>) -> Self {
        self.with_dependency_kind(name, DependencyKind::Optional)
    }

    /// Adds a dependency of the given kind.
    pub fn with_dependency_kind(mut self, name: impl Into<ServiceName>, kind: DependencyKind) -> Self {
        let name = name.into();
        match self.dependencies.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => {
                if kind == DependencyKind::Required {
                    *existing = DependencyKind::Required;
                }
            }
            None => self.dependencies.push((name, kind)),
        }
        self
    }

    /// Sets the initial mode.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Attaches a listener to this service only.
    pub fn with_listener(mut self, listener: Arc<dyn Listen>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Primary name.
    pub fn name(&self) -> &ServiceName {
        &self.name
    }

    /// Declared aliases.
    pub fn aliases(&self) -> &[ServiceName] {
        &self.aliases
    }

    /// Declared dependencies, in declaration order.
    pub fn dependencies(&self) -> &[(ServiceName, DependencyKind)] {
        &self.dependencies
    }

    /// Explicit initial mode, if any.
    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    /// The payload.
    pub fn service(&self) -> &ServiceRef {
        &self.service
    }

    pub(crate) fn into_parts(self) -> SpecParts {
        SpecParts {
            name: self.name,
            aliases: self.aliases,
            dependencies: self.dependencies,
            mode: self.mode,
            service: self.service,
            listeners: self.listeners,
        }
    }
}

/// Owned pieces of a [`ServiceSpec`], consumed by the registry during install.
pub(crate) struct SpecParts {
    pub(crate) name: ServiceName,
    pub(crate) aliases: Vec<ServiceName>,
    pub(crate) dependencies: Vec<(ServiceName, DependencyKind)>,
    pub(crate) mode: Option<Mode>,
    pub(crate) service: ServiceRef,
    pub(crate) listeners: Vec<Arc<dyn Listen>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::NullService;

    #[test]
    fn required_wins_over_optional() {
        let spec = ServiceSpec::new("a", Arc::new(NullService))
            .with_optional_dependency("b")
            .with_dependency("c")
            .with_dependency("b")
            .with_optional_dependency("c");

        assert_eq!(
            spec.dependencies(),
            &[
                ("b".into(), DependencyKind::Required),
                ("c".into(), DependencyKind::Required),
            ]
        );
    }

    #[test]
    fn mode_defaults_to_container() {
        let spec = ServiceSpec::new("a", Arc::new(NullService));
        assert!(spec.mode().is_none());
        assert!(spec.aliases().is_empty());
    }
}
