//! # Registration: the per-name rendezvous point.
//!
//! One [`Registration`] exists for every name somebody installed under or depends
//! on. It remembers the bound controller (if any), the status that controller last
//! published, and every dependent edge linked to the name.
//!
//! ## Rules
//! - At most one controller is bound at a time.
//! - Publishing a status and enqueuing the resulting signals to every dependent
//!   happen under the same lock, so a dependent linked concurrently either sees the
//!   old status plus the signals or the new status and no signals, never both.
//! - `demand` and `running` are counted per registration; the bound controller sums
//!   them over its name and aliases.
//! - The registry drops a registration once it has no controller and no dependents.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::controller::{Mailbox, Message, ServiceController};
use crate::core::Registry;
use crate::services::{ServiceName, ServiceValue};

use super::{Dependency, DependencyStatus};

/// Controller bound to a registration.
#[derive(Clone)]
pub(crate) struct Binding {
    pub(crate) id: u64,
    pub(crate) mailbox: Mailbox,
    pub(crate) handle: ServiceController,
}

/// Dependent edge linked to a registration.
#[derive(Clone)]
pub(crate) struct DependentLink {
    pub(crate) controller: u64,
    pub(crate) edge: usize,
    pub(crate) mailbox: Mailbox,
}

struct RegistrationState {
    controller: Option<Binding>,
    status: DependencyStatus,
    value: Option<ServiceValue>,
    dependents: Vec<DependentLink>,
    demand: usize,
    running: usize,
}

pub(crate) struct Registration {
    name: ServiceName,
    state: Mutex<RegistrationState>,
}

impl Registration {
    pub(crate) fn new(name: ServiceName) -> Arc<Self> {
        Arc::new(Self {
            name,
            state: Mutex::new(RegistrationState {
                controller: None,
                status: DependencyStatus::UNBOUND,
                value: None,
                dependents: Vec::new(),
                demand: 0,
                running: 0,
            }),
        })
    }

    pub(crate) fn name(&self) -> &ServiceName {
        &self.name
    }

    fn lock(&self) -> MutexGuard<'_, RegistrationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handle of the bound controller.
    pub(crate) fn controller(&self) -> Option<ServiceController> {
        self.lock().controller.as_ref().map(|b| b.handle.clone())
    }

    pub(crate) fn is_bound(&self) -> bool {
        self.lock().controller.is_some()
    }

    /// Number of dependents that recorded a start and have not stopped yet.
    pub(crate) fn running(&self) -> usize {
        self.lock().running
    }

    /// Demand currently placed on this name.
    #[cfg(test)]
    pub(crate) fn demand(&self) -> usize {
        self.lock().demand
    }

    /// Links a dependent edge and returns the status it starts from.
    pub(crate) fn add_dependent(&self, link: DependentLink) -> DependencyStatus {
        let mut st = self.lock();
        let duplicate = st
            .dependents
            .iter()
            .any(|d| d.controller == link.controller && d.edge == link.edge);
        if duplicate {
            tracing::error!(service = %self.name, "dependent linked twice");
            debug_assert!(!duplicate, "dependent linked twice");
        } else {
            st.dependents.push(link);
        }
        st.status
    }

    /// Unlinks a dependent edge. Returns `true` if the registration became unused.
    pub(crate) fn remove_dependent(&self, controller: u64, edge: usize) -> bool {
        let mut st = self.lock();
        st.dependents
            .retain(|d| !(d.controller == controller && d.edge == edge));
        st.controller.is_none() && st.dependents.is_empty()
    }

    /// Binds a controller, publishes its initial status and returns the demand
    /// already registered under this name.
    pub(crate) fn bind(&self, binding: Binding, status: DependencyStatus) -> usize {
        let mut st = self.lock();
        debug_assert!(st.controller.is_none(), "registration bound twice");
        st.controller = Some(binding);
        Self::publish_locked(&mut st, status, None);
        st.demand
    }

    /// Unbinds the controller. Returns `true` if the registration became unused.
    pub(crate) fn unbind(&self, id: u64) -> bool {
        let mut st = self.lock();
        if st.controller.as_ref().map(|b| b.id) != Some(id) {
            return false;
        }
        st.controller = None;
        Self::publish_locked(&mut st, DependencyStatus::UNBOUND, None);
        st.dependents.is_empty()
    }

    /// Publishes the bound controller's status (and value, while up).
    pub(crate) fn publish(&self, status: DependencyStatus, value: Option<ServiceValue>) {
        let mut st = self.lock();
        Self::publish_locked(&mut st, status, value);
    }

    fn publish_locked(
        st: &mut RegistrationState,
        status: DependencyStatus,
        value: Option<ServiceValue>,
    ) {
        let status = DependencyStatus {
            bound: st.controller.is_some(),
            ..status
        };
        let signals = st.status.diff(status);
        st.status = status;
        st.value = if status.up { value } else { None };
        for link in &st.dependents {
            for &signal in &signals {
                link.mailbox.send(Message::Edge {
                    edge: link.edge,
                    signal,
                });
            }
        }
    }

    fn add_demand(&self) {
        let mut st = self.lock();
        st.demand += 1;
        if let Some(binding) = &st.controller {
            binding.mailbox.send(Message::AddDemand);
        }
    }

    fn remove_demand(&self) {
        let mut st = self.lock();
        if st.demand == 0 {
            tracing::error!(service = %self.name, "demand released more often than added");
            debug_assert!(false, "unbalanced demand");
            return;
        }
        st.demand -= 1;
        if let Some(binding) = &st.controller {
            binding.mailbox.send(Message::RemoveDemand);
        }
    }

    fn dependent_started(&self) -> bool {
        let mut st = self.lock();
        if !st.status.up {
            return false;
        }
        st.running += 1;
        true
    }

    fn dependent_stopped(&self) {
        let mut st = self.lock();
        if st.running == 0 {
            tracing::error!(service = %self.name, "dependent stopped without a matching start");
            debug_assert!(false, "unpaired dependent_stopped");
            return;
        }
        st.running -= 1;
        if st.running == 0 {
            if let Some(binding) = &st.controller {
                binding.mailbox.send(Message::DependentsStopped);
            }
        }
    }

    fn value(&self) -> Option<ServiceValue> {
        let st = self.lock();
        if st.status.up {
            st.value.clone()
        } else {
            None
        }
    }
}

/// Edge from a dependent straight to a registration.
pub(crate) struct RegistrationEdge {
    registry: Registry,
    registration: Arc<Registration>,
    controller: u64,
    edge: usize,
    detached: bool,
}

impl RegistrationEdge {
    pub(crate) fn new(
        registry: Registry,
        registration: Arc<Registration>,
        controller: u64,
        edge: usize,
    ) -> Self {
        Self {
            registry,
            registration,
            controller,
            edge,
            detached: false,
        }
    }
}

impl Dependency for RegistrationEdge {
    fn name(&self) -> &ServiceName {
        self.registration.name()
    }

    fn add_demand(&mut self) {
        self.registration.add_demand();
    }

    fn remove_demand(&mut self) {
        self.registration.remove_demand();
    }

    fn dependent_started(&mut self) -> bool {
        self.registration.dependent_started()
    }

    fn dependent_stopped(&mut self) {
        self.registration.dependent_stopped();
    }

    fn value(&self) -> Option<ServiceValue> {
        self.registration.value()
    }

    fn detach(&mut self) {
        if std::mem::replace(&mut self.detached, true) {
            return;
        }
        self.registry
            .detach(&self.registration, self.controller, self.edge);
    }
}
