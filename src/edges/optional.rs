//! # Optional dependency adapter.
//!
//! [`OptionalDependency`] stands between a dependent and the registration of an
//! optional dependency. It is owned by the dependent's controller task, so it needs
//! no lock of its own: signals it wants the dependent to see are queued in an
//! outbox that the owning [`Edge`](super::Edge) drains after every call.
//!
//! ## Behavior
//! ```text
//!                  target unbound           target bound
//!                 ┌───────────────┐        ┌──────────────────────────────┐
//!   not demanded  │ report "up"   │ ─────► │ notifying: mirror the target │
//!                 └───────────────┘        └──────────────────────────────┘
//!                 ┌───────────────┐        ┌──────────────────────────────┐
//!   demanded      │ report "up"   │ ─────► │ silent until demand drops    │
//!                 └───────────────┘        └──────────────────────────────┘
//! ```
//!
//! - An unbound target counts as satisfied: the dependent may start without it.
//! - A bound target is mirrored as is, including a dependency missing further down
//!   its chain.
//! - A target that appears while the dependent is demanded (likely running without
//!   it) is ignored until the demand drops; the dependent is never stopped just
//!   because an optional dependency showed up.
//! - While notifying, every call and every signal is passed straight through.
//! - Demand and starts are only forwarded while notifying, and are always released
//!   in pairs.

use std::mem;

use crate::services::{ServiceName, ServiceValue};

use super::{Dependency, DependencyStatus, Dependent, RegistrationEdge, Signal};

pub(crate) struct OptionalDependency<D = RegistrationEdge> {
    inner: D,
    /// Mirror of the registration's published status.
    target: DependencyStatus,
    /// What the dependent has been told so far.
    reported: DependencyStatus,
    demanded: bool,
    notifying: bool,
    demand_forwarded: bool,
    start_forwarded: bool,
    outbox: Vec<Signal>,
}

impl<D: Dependency> OptionalDependency<D> {
    /// Wraps `inner`, whose registration currently reports `snapshot`.
    ///
    /// Returns the adapter and the status the dependent starts from.
    pub(crate) fn new(inner: D, snapshot: DependencyStatus) -> (Self, DependencyStatus) {
        let bound = snapshot.bound;
        let reported = if bound {
            snapshot
        } else {
            DependencyStatus::ABSENT
        };
        let adapter = Self {
            inner,
            target: snapshot,
            reported,
            demanded: false,
            notifying: bound,
            demand_forwarded: false,
            start_forwarded: false,
            outbox: Vec::new(),
        };
        (adapter, reported)
    }

    /// Signals queued for the dependent since the last drain.
    pub(crate) fn drain(&mut self) -> Vec<Signal> {
        mem::take(&mut self.outbox)
    }

    fn is_bound(&self) -> bool {
        self.target.bound
    }

    fn report(&mut self, next: DependencyStatus) {
        self.outbox.extend(self.reported.diff(next));
        self.reported = next;
    }

    fn start_notifying(&mut self) {
        self.notifying = true;
        self.report(self.target);
    }

    fn stop_notifying(&mut self) {
        self.notifying = false;
        self.report(DependencyStatus::ABSENT);
    }

    fn on_target(&mut self, signal: Signal) {
        self.target.deliver(signal);
        if self.notifying {
            self.report(self.target);
        }
    }
}

impl<D: Dependency> Dependent for OptionalDependency<D> {
    fn dependency_bound(&mut self) {
        self.target.bound = true;
        if !self.notifying && !self.demanded {
            self.start_notifying();
        }
    }

    fn dependency_unbound(&mut self) {
        self.target.bound = false;
        if mem::replace(&mut self.demand_forwarded, false) {
            self.inner.remove_demand();
        }
        if self.notifying {
            self.stop_notifying();
        }
    }

    fn dependency_installed(&mut self) {
        self.on_target(Signal::Installed);
    }

    fn dependency_uninstalled(&mut self) {
        self.on_target(Signal::Uninstalled);
    }

    fn dependency_up(&mut self) {
        self.on_target(Signal::Up);
    }

    fn dependency_down(&mut self) {
        self.on_target(Signal::Down);
    }

    fn dependency_failed(&mut self) {
        self.on_target(Signal::Failed);
    }

    fn dependency_failure_cleared(&mut self) {
        self.on_target(Signal::FailureCleared);
    }
}

impl<D: Dependency> Dependency for OptionalDependency<D> {
    fn name(&self) -> &ServiceName {
        self.inner.name()
    }

    fn add_demand(&mut self) {
        self.demanded = true;
        if self.notifying && !self.demand_forwarded {
            self.inner.add_demand();
            self.demand_forwarded = true;
        }
    }

    fn remove_demand(&mut self) {
        self.demanded = false;
        if mem::replace(&mut self.demand_forwarded, false) {
            self.inner.remove_demand();
        }
        if !self.notifying && self.is_bound() {
            self.start_notifying();
        }
    }

    fn dependent_started(&mut self) -> bool {
        if !self.notifying {
            return true;
        }
        let started = self.inner.dependent_started();
        self.start_forwarded = started;
        started
    }

    fn dependent_stopped(&mut self) {
        if mem::replace(&mut self.start_forwarded, false) {
            self.inner.dependent_stopped();
        }
    }

    fn value(&self) -> Option<ServiceValue> {
        if self.notifying {
            self.inner.value()
        } else {
            None
        }
    }

    fn detach(&mut self) {
        self.dependent_stopped();
        if mem::replace(&mut self.demand_forwarded, false) {
            self.inner.remove_demand();
        }
        self.inner.detach();
    }
}
