//! # Registry: names, registrations and the install/uninstall paths.
//!
//! The registry owns every [`Registration`] (keyed by name or alias), the handle of
//! every installed controller (keyed by primary name) and the [`DependencyGraph`]
//! used for cycle detection. All of it sits behind one mutex.
//!
//! ## Architecture
//! ```text
//! install(spec)            (map lock held throughout)
//!   ├─► shut down?                         → InstallError::ShutDown
//!   ├─► name/alias taken or repeated?      → InstallError::DuplicateService
//!   ├─► graph.try_insert(..)               → InstallError::CircularDependency (rolled back)
//!   ├─► link one edge per dependency       (Registration::add_dependent → snapshot)
//!   ├─► bind name + aliases                (Registration::bind → initial status, demand)
//!   └─► spawn ControllerActor
//!
//! uninstall(controller)    (called by the controller task once it is Down)
//!   ├─► graph.remove(..)
//!   ├─► Registration::unbind for name + aliases
//!   └─► drop registrations nobody uses anymore
//! ```
//!
//! ## Rules
//! - The map lock may be taken before a registration lock, never the other way round.
//! - A failed install changes nothing.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::controller::{ControllerActor, ControllerParts, Mailbox, ServiceController};
use crate::edges::{Binding, DependencyStatus, DependentLink, Edge, Registration, RegistrationEdge};
use crate::error::InstallError;
use crate::listeners::Listen;
use crate::policies::Mode;
use crate::services::{DependencyKind, ServiceName, SpecParts};

use super::cycle::DependencyGraph;
use super::stability::Stability;

/// Container-wide inputs of an install.
pub(crate) struct InstallEnv<'a> {
    pub(crate) runtime: &'a Handle,
    pub(crate) stability: &'a Stability,
    pub(crate) token: &'a CancellationToken,
    pub(crate) mode: Mode,
    pub(crate) listeners: &'a [Arc<dyn Listen>],
}

#[derive(Default)]
struct RegistryState {
    registrations: HashMap<ServiceName, Arc<Registration>>,
    controllers: HashMap<ServiceName, ServiceController>,
    graph: DependencyGraph,
    next_id: u64,
    shut_down: bool,
}

impl RegistryState {
    fn registration(&mut self, name: &ServiceName) -> Arc<Registration> {
        Arc::clone(
            self.registrations
                .entry(name.clone())
                .or_insert_with(|| Registration::new(name.clone())),
        )
    }

    fn is_taken(&self, name: &ServiceName) -> bool {
        self.registrations
            .get(name)
            .is_some_and(|r| r.is_bound())
    }

    /// Drops `registration` from the map if it is still the one stored there.
    fn forget(&mut self, registration: &Arc<Registration>) {
        let stored = self
            .registrations
            .get(registration.name())
            .is_some_and(|r| Arc::ptr_eq(r, registration));
        if stored {
            self.registrations.remove(registration.name());
        }
    }
}

/// Shared registry handle.
#[derive(Clone, Default)]
pub(crate) struct Registry {
    inner: Arc<Mutex<RegistryState>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Installs a service and spawns its controller.
    pub(crate) fn install(
        &self,
        parts: SpecParts,
        env: InstallEnv<'_>,
    ) -> Result<ServiceController, InstallError> {
        let mut st = self.lock();
        if st.shut_down {
            return Err(InstallError::ShutDown);
        }

        let mut seen = HashSet::new();
        for name in std::iter::once(&parts.name).chain(&parts.aliases) {
            if !seen.insert(name) || st.is_taken(name) {
                return Err(InstallError::DuplicateService { name: name.clone() });
            }
        }

        let targets = parts.dependencies.iter().map(|(n, _)| n.clone()).collect();
        st.graph
            .try_insert(parts.name.clone(), parts.aliases.clone(), targets)
            .map_err(|cycles| InstallError::CircularDependency { cycles })?;

        let id = st.next_id;
        st.next_id += 1;
        let (mailbox, rx) = Mailbox::channel(env.stability.clone());
        let handle = ServiceController::new(
            id,
            parts.name.clone(),
            parts.aliases.clone(),
            mailbox.clone(),
            env.mode,
        );

        let mut edges = Vec::with_capacity(parts.dependencies.len());
        for (idx, (target, kind)) in parts.dependencies.iter().enumerate() {
            let registration = st.registration(target);
            let snapshot = registration.add_dependent(DependentLink {
                controller: id,
                edge: idx,
                mailbox: mailbox.clone(),
            });
            let link = RegistrationEdge::new(self.clone(), registration, id, idx);
            edges.push(match kind {
                DependencyKind::Required => Edge::required(link, snapshot),
                DependencyKind::Optional => Edge::optional(link, snapshot),
            });
        }

        let status = DependencyStatus {
            bound: true,
            missing: edges.iter().any(|e| e.view().missing),
            failed: edges.iter().any(|e| e.view().failed),
            up: false,
        };
        let binding = Binding {
            id,
            mailbox: mailbox.clone(),
            handle: handle.clone(),
        };
        let mut own = Vec::with_capacity(1 + parts.aliases.len());
        let mut demand = 0;
        for name in std::iter::once(&parts.name).chain(&parts.aliases) {
            let registration = st.registration(name);
            demand += registration.bind(binding.clone(), status);
            own.push(registration);
        }
        st.controllers.insert(parts.name.clone(), handle.clone());
        drop(st);

        let mut listeners = env.listeners.to_vec();
        listeners.extend(parts.listeners);

        let actor = ControllerActor::new(ControllerParts {
            handle: handle.clone(),
            rx,
            mailbox,
            registry: self.clone(),
            stability: env.stability.clone(),
            token: env.token.clone(),
            own,
            edges,
            listeners,
            service: parts.service,
            mode: env.mode,
            demand,
            published: status,
        });
        env.stability.enter();
        env.runtime.spawn(actor.run());

        tracing::debug!(service = %handle.name(), id, "service installed");
        Ok(handle)
    }

    /// Detaches a removed controller from its names and from the graph.
    pub(crate) fn uninstall(&self, controller: &ServiceController, own: &[Arc<Registration>]) {
        let mut st = self.lock();
        st.graph.remove(controller.name());
        let current = st
            .controllers
            .get(controller.name())
            .is_some_and(|c| c.id() == controller.id());
        if current {
            st.controllers.remove(controller.name());
        }
        for registration in own {
            if registration.unbind(controller.id()) {
                st.forget(registration);
            }
        }
        tracing::debug!(service = %controller.name(), "service uninstalled");
    }

    /// Unlinks one dependent edge from a registration.
    pub(crate) fn detach(&self, registration: &Arc<Registration>, controller: u64, edge: usize) {
        let mut st = self.lock();
        if registration.remove_dependent(controller, edge) {
            st.forget(registration);
        }
    }

    /// Controller installed under `name` (primary name or alias).
    pub(crate) fn service(&self, name: &str) -> Option<ServiceController> {
        self.lock().registrations.get(name).and_then(|r| r.controller())
    }

    /// Primary names of every installed service, sorted.
    pub(crate) fn names(&self) -> Vec<ServiceName> {
        self.lock().graph.names()
    }

    /// Handles of every installed service.
    pub(crate) fn controllers(&self) -> Vec<ServiceController> {
        self.lock().controllers.values().cloned().collect()
    }

    /// Rejects further installs.
    pub(crate) fn shut_down(&self) {
        self.lock().shut_down = true;
    }

    pub(crate) fn is_shut_down(&self) -> bool {
        self.lock().shut_down
    }

    /// Demand registered under `name`, if anybody holds the name.
    #[cfg(test)]
    pub(crate) fn demand(&self, name: &str) -> Option<usize> {
        self.lock().registrations.get(name).map(|r| r.demand())
    }

    /// Number of registrations still held (bound or linked).
    #[cfg(test)]
    pub(crate) fn registrations(&self) -> usize {
        self.lock().registrations.len()
    }
}
