//! # Service payload contract.
//!
//! This module defines the [`Service`] trait (async start/stop callbacks) and the
//! contexts handed to those callbacks. The common handle type is [`ServiceRef`],
//! an `Arc<dyn Service>` suitable for sharing across the runtime.
//!
//! Callbacks run on their own spawned task, never on the controller's task, so a
//! slow or hung callback only blocks its own service.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ServiceError;
use crate::services::ServiceName;

/// Value a started service exposes to its dependents.
pub type ServiceValue = Arc<dyn Any + Send + Sync>;

/// Shared handle to a service payload.
pub type ServiceRef = Arc<dyn Service>;

/// # Start/stop callbacks of an installed service.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use servicevisor::{Service, ServiceError, StartContext, StopContext};
///
/// struct Pool;
///
/// #[async_trait]
/// impl Service for Pool {
///     async fn start(&self, ctx: StartContext) -> Result<(), ServiceError> {
///         if ctx.token().is_cancelled() {
///             return Err(ServiceError::failed("shutting down"));
///         }
///         Ok(())
///     }
///
///     async fn stop(&self, _ctx: StopContext) -> Result<(), ServiceError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Brings the service up. Every dependency is up while this runs.
    ///
    /// An error moves the controller to [`State::Failed`](crate::State::Failed).
    async fn start(&self, ctx: StartContext) -> Result<(), ServiceError>;

    /// Brings the service down. No dependent is running while this runs.
    ///
    /// An error is reported to listeners; the controller still reaches `Down`.
    async fn stop(&self, ctx: StopContext) -> Result<(), ServiceError>;

    /// Value exposed to dependents while the service is up.
    fn value(&self) -> Option<ServiceValue> {
        None
    }
}

/// Context passed to [`Service::start`].
pub struct StartContext {
    name: ServiceName,
    token: CancellationToken,
    dependencies: HashMap<ServiceName, ServiceValue>,
}

impl StartContext {
    pub(crate) fn new(
        name: ServiceName,
        token: CancellationToken,
        dependencies: HashMap<ServiceName, ServiceValue>,
    ) -> Self {
        Self {
            name,
            token,
            dependencies,
        }
    }

    /// Name the service was installed under.
    pub fn name(&self) -> &ServiceName {
        &self.name
    }

    /// Token cancelled when the container shuts down.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Value of a dependency, if it is up and exposes one.
    ///
    /// Optional dependencies that are absent (or not coupled yet) yield `None`.
    pub fn dependency(&self, name: &str) -> Option<&ServiceValue> {
        self.dependencies.get(name)
    }

    /// Typed variant of [`StartContext::dependency`].
    pub fn dependency_as<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.dependency(name)
            .cloned()
            .and_then(|value| value.downcast::<T>().ok())
    }
}

/// Context passed to [`Service::stop`].
pub struct StopContext {
    name: ServiceName,
    token: CancellationToken,
}

impl StopContext {
    pub(crate) fn new(name: ServiceName, token: CancellationToken) -> Self {
        Self { name, token }
    }

    /// Name the service was installed under.
    pub fn name(&self) -> &ServiceName {
        &self.name
    }

    /// Token cancelled when the container shuts down.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_dependency_lookup() {
        let mut deps: HashMap<ServiceName, ServiceValue> = HashMap::new();
        deps.insert("port".into(), Arc::new(8080u16));
        let ctx = StartContext::new("web".into(), CancellationToken::new(), deps);

        assert_eq!(ctx.dependency_as::<u16>("port").as_deref(), Some(&8080));
        assert!(ctx.dependency_as::<String>("port").is_none());
        assert!(ctx.dependency("missing").is_none());
    }
}
