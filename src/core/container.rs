//! # ServiceContainer: the registry value host code talks to.
//!
//! The [`ServiceContainer`] owns the registry (names, registrations, dependency
//! graph), container-wide listeners, the cancellation token handed to callbacks and
//! the stability tracker. Each installed service gets its own controller task on the
//! tokio runtime that called [`ServiceContainer::install`].
//!
//! ## High-level architecture
//! ```text
//! install(ServiceSpec) ──► Registry::install ──► Registration (name, aliases)
//!                                  │                  ▲   │ edge signals
//!                                  ▼                  │   ▼
//!                          ControllerActor ◄── Mailbox ◄── other controllers
//!                                  │
//!                                  ├─► Service::start / Service::stop (spawned)
//!                                  └─► ListenerSet::emit(&Event)
//!
//! Shutdown path:
//!   shutdown()
//!     └─► reject further installs
//!     └─► cancel callback token (if cfg.cancel_on_shutdown)
//!     └─► set_mode(Remove) on every service
//!     └─► wait up to cfg.grace for every controller to reach Removed:
//!            ├─ Ok              → Ok(())
//!            └─ Timeout         → RuntimeError::GraceExceeded { stuck }
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use servicevisor::{
//!     ContainerConfig, Mode, ServiceContainer, ServiceError, ServiceFn, ServiceSpec,
//!     StartContext, State,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let container = ServiceContainer::builder(ContainerConfig::default()).build();
//!
//!     let db = ServiceFn::new(|_ctx: StartContext| async { Ok::<_, ServiceError>(()) })
//!         .with_value(Arc::new(String::from("postgres://localhost")));
//!     container.install(ServiceSpec::new("db", Arc::new(db)).with_mode(Mode::OnDemand))?;
//!
//!     let web = container.install(
//!         ServiceSpec::new("web", ServiceFn::arc(|ctx: StartContext| async move {
//!             let url = ctx.dependency_as::<String>("db");
//!             assert!(url.is_some());
//!             Ok::<_, ServiceError>(())
//!         }))
//!         .with_dependency("db"),
//!     )?;
//!
//!     web.await_state(State::Up).await?;
//!     container.shutdown().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use futures::future::join_all;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::controller::{ServiceController, State};
use crate::error::{InstallError, RuntimeError};
use crate::listeners::Listen;
use crate::services::{ServiceName, ServiceSpec};

use super::builder::ContainerBuilder;
use super::config::ContainerConfig;
use super::registry::{InstallEnv, Registry};
use super::stability::Stability;

/// Owns every installed service and drives them through their lifecycles.
pub struct ServiceContainer {
    cfg: ContainerConfig,
    registry: Registry,
    stability: Stability,
    token: CancellationToken,
    listeners: Vec<Arc<dyn Listen>>,
}

impl ServiceContainer {
    /// Returns a builder for a container with the given configuration.
    pub fn builder(cfg: ContainerConfig) -> ContainerBuilder {
        ContainerBuilder::new(cfg)
    }

    /// Creates a container without container-wide listeners.
    pub fn new(cfg: ContainerConfig) -> Arc<Self> {
        Self::builder(cfg).build()
    }

    pub(crate) fn new_internal(
        cfg: ContainerConfig,
        registry: Registry,
        stability: Stability,
        token: CancellationToken,
        listeners: Vec<Arc<dyn Listen>>,
    ) -> Self {
        Self {
            cfg,
            registry,
            stability,
            token,
            listeners,
        }
    }

    /// Configuration the container was built with.
    pub fn config(&self) -> &ContainerConfig {
        &self.cfg
    }

    /// Installs a service.
    ///
    /// On success the controller is bound to the service's name and aliases and
    /// starts driving the service on the current tokio runtime. On error nothing
    /// changed.
    ///
    /// # Errors
    /// - [`InstallError::DuplicateService`] if a name or alias is taken (or repeated)
    /// - [`InstallError::CircularDependency`] if the dependencies close a cycle
    /// - [`InstallError::ShutDown`] after [`ServiceContainer::shutdown`]
    /// - [`InstallError::NoRuntime`] outside of a tokio runtime
    pub fn install(&self, spec: ServiceSpec) -> Result<ServiceController, InstallError> {
        let runtime = Handle::try_current().map_err(|_| InstallError::NoRuntime)?;
        let parts = spec.into_parts();
        let mode = self.cfg.mode_for(parts.mode);
        self.registry.install(
            parts,
            InstallEnv {
                runtime: &runtime,
                stability: &self.stability,
                token: &self.token,
                mode,
                listeners: &self.listeners,
            },
        )
    }

    /// Controller installed under `name` (primary name or alias).
    pub fn service(&self, name: &str) -> Option<ServiceController> {
        self.registry.service(name)
    }

    /// Primary names of every installed service, sorted.
    pub fn service_names(&self) -> Vec<ServiceName> {
        self.registry.names()
    }

    /// Waits until no edge message and no callback is in flight.
    ///
    /// Once this resolves, every controller has reacted to everything that happened
    /// before the call, and no start or stop callback is running. It stays that way
    /// until host code installs a service or changes a mode.
    pub async fn await_stability(&self) {
        self.stability.settled().await;
    }

    /// True once [`ServiceContainer::shutdown`] has been called.
    pub fn is_shut_down(&self) -> bool {
        self.registry.is_shut_down()
    }

    /// Removes every service and waits up to `grace` for them to go away.
    ///
    /// Services stop in dependency order: a service's stop callback only runs once
    /// every dependent has stopped. Further installs fail with
    /// [`InstallError::ShutDown`].
    ///
    /// # Errors
    /// - [`RuntimeError::GraceExceeded`] if some service is still installed when the
    ///   grace period runs out
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.registry.shut_down();
        if self.cfg.cancel_on_shutdown {
            self.token.cancel();
        }

        let controllers = self.registry.controllers();
        for controller in &controllers {
            if let Err(err) = controller.remove() {
                tracing::debug!(service = %controller.name(), error = %err, "remove during shutdown");
            }
        }

        let removed = join_all(
            controllers
                .iter()
                .map(|c| c.await_state(State::Removed)),
        );
        let done = match self.cfg.grace_period() {
            Some(grace) => tokio::time::timeout(grace, removed).await.is_ok(),
            None => controllers.iter().all(|c| c.state() == State::Removed),
        };

        if done {
            tracing::debug!(services = controllers.len(), "all services removed");
            return Ok(());
        }
        let stuck: Vec<String> = self
            .registry
            .names()
            .iter()
            .map(ToString::to_string)
            .collect();
        tracing::warn!(?stuck, grace = ?self.cfg.grace, "shutdown grace exceeded");
        Err(RuntimeError::GraceExceeded {
            grace: self.cfg.grace,
            stuck,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::Mode;
    use crate::services::NullService;

    #[test]
    fn install_outside_runtime_is_rejected() {
        let container = ServiceContainer::new(ContainerConfig::default());
        let err = container
            .install(ServiceSpec::new("a", Arc::new(NullService)))
            .unwrap_err();
        assert_eq!(err, InstallError::NoRuntime);
        assert!(container.service_names().is_empty());
    }

    #[tokio::test]
    async fn duplicate_names_and_aliases_are_rejected() {
        let container = ServiceContainer::new(ContainerConfig::default());
        container
            .install(ServiceSpec::new("a", Arc::new(NullService)).with_alias("a2"))
            .unwrap();

        let err = container
            .install(ServiceSpec::new("b", Arc::new(NullService)).with_alias("a2"))
            .unwrap_err();
        assert_eq!(err, InstallError::DuplicateService { name: "a2".into() });

        let err = container
            .install(ServiceSpec::new("c", Arc::new(NullService)).with_alias("c"))
            .unwrap_err();
        assert_eq!(err, InstallError::DuplicateService { name: "c".into() });

        assert_eq!(container.service_names(), vec![ServiceName::from("a")]);
        assert_eq!(container.service("a2").unwrap().name().as_str(), "a");
        container.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn rejected_cycle_leaves_no_trace() {
        let container = ServiceContainer::new(ContainerConfig::default());
        container
            .install(ServiceSpec::new("a", Arc::new(NullService)).with_dependency("b"))
            .unwrap();
        container.await_stability().await;
        let before = container.registry.registrations();

        let err = container
            .install(ServiceSpec::new("b", Arc::new(NullService)).with_dependency("a"))
            .unwrap_err();
        assert_eq!(err.cycles().len(), 1);
        assert_eq!(container.registry.registrations(), before);
        assert!(container.service("b").is_none());

        container.shutdown().await.unwrap();
        assert_eq!(container.registry.registrations(), 0);
    }

    #[tokio::test]
    async fn demand_returns_to_zero_after_dependents_leave() {
        let container = ServiceContainer::new(ContainerConfig::default());
        let target = container
            .install(ServiceSpec::new("t", Arc::new(NullService)).with_mode(Mode::OnDemand))
            .unwrap();
        let x = container
            .install(ServiceSpec::new("x", Arc::new(NullService)).with_dependency("t"))
            .unwrap();
        let y = container
            .install(ServiceSpec::new("y", Arc::new(NullService)).with_dependency("t"))
            .unwrap();
        container.await_stability().await;
        assert_eq!(container.registry.demand("t"), Some(2));
        assert_eq!(target.state(), State::Up);

        let steps: [(&ServiceController, Mode, usize); 4] = [
            (&x, Mode::Never, 1),
            (&x, Mode::Active, 2),
            (&x, Mode::Never, 1),
            (&y, Mode::Remove, 0),
        ];
        for (controller, mode, demand) in steps {
            controller.set_mode(mode).unwrap();
            container.await_stability().await;
            assert_eq!(container.registry.demand("t"), Some(demand), "{mode:?}");
        }
        assert_eq!(target.state(), State::Down);

        x.set_mode(Mode::Active).unwrap();
        container.await_stability().await;
        assert_eq!(container.registry.demand("t"), Some(1));
        assert_eq!(target.state(), State::Up);

        x.remove().unwrap();
        x.await_state(State::Removed).await.unwrap();
        container.await_stability().await;
        assert_eq!(container.registry.demand("t"), Some(0));
        assert_eq!(target.state(), State::Down);

        container.shutdown().await.unwrap();
        assert_eq!(container.registry.demand("t"), None);
    }

    #[tokio::test]
    async fn shutdown_rejects_later_installs() {
        let container = ServiceContainer::new(ContainerConfig::default());
        container.shutdown().await.unwrap();
        assert!(container.is_shut_down());
        let err = container
            .install(ServiceSpec::new("a", Arc::new(NullService)))
            .unwrap_err();
        assert_eq!(err, InstallError::ShutDown);
    }
}
