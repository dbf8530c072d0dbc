//! # Dependency edges between controllers.
//!
//! A dependent controller never talks to another controller directly. Every
//! dependency is an edge through a [`Registration`], the per-name rendezvous point
//! owned by the registry:
//!
//! ```text
//!   dependent controller                     registration "db"             controller "db"
//!   ┌──────────────────┐   add_demand()     ┌──────────────────┐  AddDemand  ┌────────────┐
//!   │ edges[i]: view   │ ─────────────────► │ demand, running  │ ──────────► │ actor loop │
//!   │ (DependencyStatus)│ ◄───────────────── │ status, value    │ ◄────────── │            │
//!   └──────────────────┘  Edge{i, Signal}    └──────────────────┘   publish   └────────────┘
//! ```
//!
//! - [`Dependency`] is the downward half (demand, start/stop bookkeeping, value).
//! - [`Dependent`] is the upward half: the six status signals, plus whether a
//!   controller is bound to the name at all.
//! - [`OptionalDependency`] sits between the two for optional edges and decides which
//!   signals the dependent gets to see.

mod optional;
mod registration;

pub(crate) use optional::OptionalDependency;
pub(crate) use registration::{Binding, DependentLink, Registration, RegistrationEdge};

use crate::services::{ServiceName, ServiceValue};

/// Status change delivered along an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Signal {
    Bound,
    Unbound,
    Installed,
    Uninstalled,
    Up,
    Down,
    Failed,
    FailureCleared,
}

/// What a dependent knows about one of its dependencies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct DependencyStatus {
    /// A controller is bound to the name itself.
    pub(crate) bound: bool,
    /// No controller is bound (directly, or somewhere below it).
    pub(crate) missing: bool,
    /// The controller (or something below it) failed to start.
    pub(crate) failed: bool,
    /// The controller is up and accepts new dependents.
    pub(crate) up: bool,
}

impl DependencyStatus {
    /// Status of a name nobody is installed under.
    pub(crate) const UNBOUND: Self = Self {
        bound: false,
        missing: true,
        failed: false,
        up: false,
    };

    /// Status an optional edge reports while its target is treated as absent.
    pub(crate) const ABSENT: Self = Self {
        bound: false,
        missing: false,
        failed: false,
        up: true,
    };

    /// Signals that move `self` to `next`, in delivery order.
    ///
    /// The order is fixed: `Down`, `FailureCleared`, `Unbound`, `Uninstalled`,
    /// `Installed`, `Failed`, `Bound`, `Up`. Retractions always precede assertions,
    /// and a binding change is seen after the failure retraction and before the
    /// final assertion, so an optional edge switches with the rest already settled.
    pub(crate) fn diff(self, next: Self) -> Vec<Signal> {
        let mut out = Vec::new();
        if self.up && !next.up {
            out.push(Signal::Down);
        }
        if self.failed && !next.failed {
            out.push(Signal::FailureCleared);
        }
        if self.bound && !next.bound {
            out.push(Signal::Unbound);
        }
        if !self.missing && next.missing {
            out.push(Signal::Uninstalled);
        }
        if self.missing && !next.missing {
            out.push(Signal::Installed);
        }
        if !self.failed && next.failed {
            out.push(Signal::Failed);
        }
        if !self.bound && next.bound {
            out.push(Signal::Bound);
        }
        if !self.up && next.up {
            out.push(Signal::Up);
        }
        out
    }
}

/// Receiving side of an edge.
pub(crate) trait Dependent {
    fn dependency_bound(&mut self);
    fn dependency_unbound(&mut self);
    fn dependency_installed(&mut self);
    fn dependency_uninstalled(&mut self);
    fn dependency_up(&mut self);
    fn dependency_down(&mut self);
    fn dependency_failed(&mut self);
    fn dependency_failure_cleared(&mut self);

    /// Routes a signal to the matching callback.
    fn deliver(&mut self, signal: Signal) {
        match signal {
            Signal::Bound => self.dependency_bound(),
            Signal::Unbound => self.dependency_unbound(),
            Signal::Installed => self.dependency_installed(),
            Signal::Uninstalled => self.dependency_uninstalled(),
            Signal::Up => self.dependency_up(),
            Signal::Down => self.dependency_down(),
            Signal::Failed => self.dependency_failed(),
            Signal::FailureCleared => self.dependency_failure_cleared(),
        }
    }
}

/// A plain status record is the simplest dependent: it just remembers.
impl Dependent for DependencyStatus {
    fn dependency_bound(&mut self) {
        self.bound = true;
    }

    fn dependency_unbound(&mut self) {
        self.bound = false;
    }

    fn dependency_installed(&mut self) {
        self.missing = false;
    }

    fn dependency_uninstalled(&mut self) {
        self.missing = true;
    }

    fn dependency_up(&mut self) {
        self.up = true;
    }

    fn dependency_down(&mut self) {
        self.up = false;
    }

    fn dependency_failed(&mut self) {
        self.failed = true;
    }

    fn dependency_failure_cleared(&mut self) {
        self.failed = false;
    }
}

/// Sending side of an edge, as seen by the dependent.
pub(crate) trait Dependency: Send {
    /// Name the dependent asked for (primary name or alias).
    fn name(&self) -> &ServiceName;

    fn add_demand(&mut self);
    fn remove_demand(&mut self);

    /// Records that the dependent is starting. Returns `false` (and records nothing)
    /// if the target is not up at this instant.
    fn dependent_started(&mut self) -> bool;

    /// Pairs a successful [`Dependency::dependent_started`].
    fn dependent_stopped(&mut self);

    /// Value exposed by the target while it is up.
    fn value(&self) -> Option<ServiceValue>;

    /// Unlinks the dependent. Idempotent.
    fn detach(&mut self);
}

/// One outbound edge of a controller: the link and the status it has reported so far.
pub(crate) struct Edge {
    link: EdgeLink,
    view: DependencyStatus,
}

enum EdgeLink {
    Required(RegistrationEdge),
    Optional(OptionalDependency),
}

impl Edge {
    pub(crate) fn required(edge: RegistrationEdge, snapshot: DependencyStatus) -> Self {
        Self {
            link: EdgeLink::Required(edge),
            view: snapshot,
        }
    }

    pub(crate) fn optional(edge: RegistrationEdge, snapshot: DependencyStatus) -> Self {
        let (adapter, view) = OptionalDependency::new(edge, snapshot);
        Self {
            link: EdgeLink::Optional(adapter),
            view,
        }
    }

    /// Status as the owning controller sees it.
    pub(crate) fn view(&self) -> DependencyStatus {
        self.view
    }

    /// Applies a signal that arrived from the registration.
    pub(crate) fn deliver(&mut self, signal: Signal) {
        match &mut self.link {
            EdgeLink::Required(_) => self.view.deliver(signal),
            EdgeLink::Optional(adapter) => adapter.deliver(signal),
        }
        self.settle();
    }

    /// Runs `f` against the dependency and applies whatever it forwarded.
    pub(crate) fn with<R>(&mut self, f: impl FnOnce(&mut dyn Dependency) -> R) -> R {
        let out = match &mut self.link {
            EdgeLink::Required(edge) => f(edge),
            EdgeLink::Optional(adapter) => f(adapter),
        };
        self.settle();
        out
    }

    pub(crate) fn name(&self) -> &ServiceName {
        match &self.link {
            EdgeLink::Required(edge) => edge.name(),
            EdgeLink::Optional(adapter) => adapter.name(),
        }
    }

    pub(crate) fn value(&self) -> Option<ServiceValue> {
        match &self.link {
            EdgeLink::Required(edge) => edge.value(),
            EdgeLink::Optional(adapter) => adapter.value(),
        }
    }

    fn settle(&mut self) {
        if let EdgeLink::Optional(adapter) = &mut self.link {
            for signal in adapter.drain() {
                self.view.deliver(signal);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UP: DependencyStatus = DependencyStatus {
        bound: true,
        missing: false,
        failed: false,
        up: true,
    };

    #[test]
    fn diff_orders_retractions_first() {
        let failed = DependencyStatus {
            bound: true,
            missing: false,
            failed: true,
            up: false,
        };
        assert_eq!(
            failed.diff(DependencyStatus::UNBOUND),
            vec![Signal::FailureCleared, Signal::Unbound, Signal::Uninstalled]
        );
        assert_eq!(
            DependencyStatus::UNBOUND.diff(UP),
            vec![Signal::Installed, Signal::Bound, Signal::Up]
        );
        assert_eq!(UP.diff(failed), vec![Signal::Down, Signal::Failed]);
        assert!(UP.diff(UP).is_empty());
    }

    #[test]
    fn applying_a_diff_reaches_the_target() {
        let all = [false, true];
        for &b in &all {
            for &m in &all {
                for &f in &all {
                    for &u in &all {
                        let from = DependencyStatus {
                            bound: b,
                            missing: m,
                            failed: f,
                            up: u,
                        };
                        let mut view = from;
                        for signal in from.diff(UP) {
                            view.deliver(signal);
                        }
                        assert_eq!(view, UP);
                    }
                }
            }
        }
    }
}
