//! # Controller task: one state machine per installed service.
//!
//! [`ControllerActor`] owns everything about one service: its mode, its demand, its
//! outbound edges (with their optional adapters) and its listeners. It reacts to one
//! [`Message`] at a time and, after each, re-evaluates where it should be.
//!
//! ## Transitions
//! ```text
//!            should_start ∧ deps up ∧ every edge accepted the start
//!   Down ──────────────────────────────────────────────────────► Starting
//!    ▲ ▲                                                            │
//!    │ │ stop done                         start ok ┌───────────────┤ start err
//!    │ │                                            ▼               ▼
//!    │ Stopping ◄── no dependent running ── StopRequested ◄── Up  StartFailed
//!    │                                           │   ▲  ¬(should_start ∧ deps up) │
//!    │                                           └───┘                            │
//!    │                     should_start ∧ deps up again                           │
//!    └──────────────────────────────────── ¬should_start (failure cleared) ◄──────┘
//!
//!   Down ∧ mode = Remove ──► Removing ──► Removed (task exits)
//! ```
//!
//! ## Rules
//! - Leaving `Up` first publishes "down" to dependents; the stop callback only runs
//!   once none of them is running anymore.
//! - A failed start stays failed while the service should be up. There is no
//!   automatic retry.
//! - The status published to dependents is `missing = any edge missing`,
//!   `failed = own failure or any edge failed`, `up = Up`.
//! - Callbacks run on spawned tasks; their completion comes back as a message.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::{Registry, Stability};
use crate::edges::{DependencyStatus, Edge, Registration};
use crate::error::ServiceError;
use crate::events::{Event, EventKind};
use crate::listeners::{panic_message, Listen, ListenerSet};
use crate::policies::Mode;
use crate::services::{ServiceRef, ServiceValue, StartContext, StopContext};

use super::handle::{ServiceController, Snapshot};
use super::mailbox::{Mailbox, Message};
use super::state::{State, Substate};

/// Everything a controller task is created with.
pub(crate) struct ControllerParts {
    pub(crate) handle: ServiceController,
    pub(crate) rx: mpsc::UnboundedReceiver<Message>,
    pub(crate) mailbox: Mailbox,
    pub(crate) registry: Registry,
    pub(crate) stability: Stability,
    pub(crate) token: CancellationToken,
    pub(crate) own: Vec<Arc<Registration>>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) listeners: Vec<Arc<dyn Listen>>,
    pub(crate) service: ServiceRef,
    pub(crate) mode: Mode,
    pub(crate) demand: usize,
    pub(crate) published: DependencyStatus,
}

pub(crate) struct ControllerActor {
    handle: ServiceController,
    rx: mpsc::UnboundedReceiver<Message>,
    mailbox: Mailbox,
    registry: Registry,
    stability: Stability,
    token: CancellationToken,
    own: Vec<Arc<Registration>>,
    edges: Vec<Edge>,
    pending_listeners: Vec<Arc<dyn Listen>>,
    listeners: ListenerSet,
    service: ServiceRef,
    mode: Mode,
    demand: usize,
    substate: Substate,
    failure: Option<ServiceError>,
    value: Option<ServiceValue>,
    /// Whether demand is currently placed on every edge.
    demanding: bool,
    published: DependencyStatus,
    deps_missing: bool,
    deps_failed: bool,
}

impl ControllerActor {
    pub(crate) fn new(parts: ControllerParts) -> Self {
        Self {
            handle: parts.handle,
            rx: parts.rx,
            mailbox: parts.mailbox,
            registry: parts.registry,
            stability: parts.stability,
            token: parts.token,
            own: parts.own,
            edges: parts.edges,
            pending_listeners: parts.listeners,
            listeners: ListenerSet::new(),
            service: parts.service,
            mode: parts.mode,
            demand: parts.demand,
            substate: Substate::New,
            failure: None,
            value: None,
            demanding: false,
            published: parts.published,
            deps_missing: false,
            deps_failed: false,
        }
    }

    /// Drives the controller until it is removed.
    ///
    /// The caller counted the spawn on the stability tracker; it is released once
    /// the first step has been taken.
    pub(crate) async fn run(mut self) {
        for listener in std::mem::take(&mut self.pending_listeners) {
            let greeting = self.event(EventKind::ListenerAdded);
            self.listeners.add(listener, greeting);
        }
        self.enter(Substate::Down);
        self.settle();
        self.stability.leave();

        while self.substate != Substate::Removed {
            let Some(msg) = self.rx.recv().await else {
                break;
            };
            self.handle_message(msg);
            self.settle();
            self.stability.leave();
        }

        while self.rx.try_recv().is_ok() {
            self.stability.leave();
        }
        tracing::debug!(service = %self.handle.name(), "controller exited");
    }

    fn handle_message(&mut self, msg: Message) {
        match msg {
            Message::Edge { edge, signal } => match self.edges.get_mut(edge) {
                Some(e) => e.deliver(signal),
                None => tracing::error!(service = %self.handle.name(), edge, "signal for unknown edge"),
            },
            Message::AddDemand => self.demand += 1,
            Message::RemoveDemand => match self.demand.checked_sub(1) {
                Some(demand) => self.demand = demand,
                None => tracing::error!(service = %self.handle.name(), "demand dropped below zero"),
            },
            Message::DependentsStopped => {}
            Message::SetMode(mode) => {
                if mode != self.mode {
                    self.mode = mode;
                    self.emit(EventKind::ModeChanged);
                }
            }
            Message::StartCompleted(res) => self.start_completed(res),
            Message::StopCompleted(res) => self.stop_completed(res),
            Message::AddListener(listener) => {
                let greeting = self.event(EventKind::ListenerAdded);
                self.listeners.add(listener, greeting);
            }
            Message::RemoveListener(listener) => {
                let farewell = self.event(EventKind::ListenerRemoved);
                self.listeners.remove(&listener, farewell);
            }
        }
    }

    /// Brings demand, listeners, state and published status in line with the inputs.
    fn settle(&mut self) {
        if self.substate == Substate::Removed {
            return;
        }
        self.sync_demand();
        self.report_dependencies();
        self.step();
        self.publish_status();
    }

    fn step(&mut self) {
        loop {
            match self.substate {
                Substate::New
                | Substate::Starting
                | Substate::Stopping
                | Substate::Removing
                | Substate::Removed => return,
                Substate::Down => {
                    if self.mode == Mode::Remove {
                        self.remove();
                    } else if self.should_run() && self.acquire_edges() {
                        self.begin_start();
                    }
                    return;
                }
                Substate::Up => {
                    if self.should_run() {
                        return;
                    }
                    self.enter(Substate::StopRequested);
                    self.publish_status();
                }
                Substate::StopRequested => {
                    if self.should_run() {
                        self.enter(Substate::Up);
                        return;
                    }
                    if self.dependents_running() == 0 {
                        self.begin_stop();
                    }
                    return;
                }
                Substate::StartFailed => {
                    if self.mode.should_start(self.demand) {
                        return;
                    }
                    self.failure = None;
                    self.enter(Substate::Down);
                    self.emit(EventKind::ServiceFailureCleared);
                }
            }
        }
    }

    fn should_run(&self) -> bool {
        self.mode.should_start(self.demand) && self.edges.iter().all(|e| e.view().up)
    }

    fn dependents_running(&self) -> usize {
        self.own.iter().map(|r| r.running()).sum()
    }

    /// Records the start on every edge, or on none of them.
    fn acquire_edges(&mut self) -> bool {
        for idx in 0..self.edges.len() {
            if !self.edges[idx].with(|d| d.dependent_started()) {
                tracing::debug!(
                    service = %self.handle.name(),
                    dependency = %self.edges[idx].name(),
                    "dependency went down before start"
                );
                for edge in &mut self.edges[..idx] {
                    edge.with(|d| d.dependent_stopped());
                }
                return false;
            }
        }
        true
    }

    fn release_edges(&mut self) {
        for edge in &mut self.edges {
            edge.with(|d| d.dependent_stopped());
        }
    }

    fn begin_start(&mut self) {
        self.enter(Substate::Starting);
        self.emit(EventKind::ServiceStarting);

        let values: HashMap<_, _> = self
            .edges
            .iter()
            .filter_map(|e| e.value().map(|v| (e.name().clone(), v)))
            .collect();
        let ctx = StartContext::new(self.handle.name().clone(), self.token.clone(), values);
        let service = Arc::clone(&self.service);
        self.spawn_callback(
            async move { service.start(ctx).await },
            Message::StartCompleted,
        );
    }

    fn start_completed(&mut self, res: Result<(), ServiceError>) {
        match res {
            Ok(()) => {
                self.value = self.service.value();
                self.enter(Substate::Up);
                self.emit(EventKind::ServiceStarted);
            }
            Err(err) => {
                tracing::debug!(service = %self.handle.name(), error = %err, "start failed");
                self.release_edges();
                let reason = err.to_string();
                self.failure = Some(err);
                self.enter(Substate::StartFailed);
                self.emit_with_reason(EventKind::ServiceStartFailed, reason);
            }
        }
    }

    fn begin_stop(&mut self) {
        self.enter(Substate::Stopping);
        self.emit(EventKind::ServiceStopping);

        let ctx = StopContext::new(self.handle.name().clone(), self.token.clone());
        let service = Arc::clone(&self.service);
        self.spawn_callback(
            async move { service.stop(ctx).await },
            Message::StopCompleted,
        );
    }

    fn stop_completed(&mut self, res: Result<(), ServiceError>) {
        self.release_edges();
        self.value = None;
        self.enter(Substate::Down);
        match res {
            Ok(()) => self.emit(EventKind::ServiceStopped),
            Err(err) => {
                tracing::debug!(service = %self.handle.name(), error = %err, "stop failed");
                self.emit_with_reason(EventKind::ServiceStopFailed, err.to_string());
            }
        }
    }

    fn spawn_callback<F>(&self, fut: F, done: fn(Result<(), ServiceError>) -> Message)
    where
        F: std::future::Future<Output = Result<(), ServiceError>> + Send + 'static,
    {
        let mailbox = self.mailbox.clone();
        let stability = self.stability.clone();
        stability.enter();
        tokio::spawn(async move {
            let res = match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(res) => res,
                Err(panic) => Err(ServiceError::Panicked {
                    info: panic_message(panic.as_ref()),
                }),
            };
            mailbox.send(done(res));
            stability.leave();
        });
    }

    fn remove(&mut self) {
        self.enter(Substate::Removing);
        for edge in &mut self.edges {
            edge.with(|d| d.detach());
        }
        self.registry.uninstall(&self.handle, &self.own);
        self.rx.close();
        self.emit(EventKind::ServiceRemoved);
        self.enter(Substate::Removed);
    }

    fn sync_demand(&mut self) {
        let want = self.mode.demands_dependencies(self.demand);
        if want == self.demanding {
            return;
        }
        self.demanding = want;
        for edge in &mut self.edges {
            if want {
                edge.with(|d| d.add_demand());
            } else {
                edge.with(|d| d.remove_demand());
            }
        }
    }

    /// Emits dependency events when the aggregate over all edges changes.
    fn report_dependencies(&mut self) {
        let missing = self.edges.iter().any(|e| e.view().missing);
        let failed = self.edges.iter().any(|e| e.view().failed);

        if self.deps_failed && !failed {
            self.deps_failed = false;
            self.emit(EventKind::DependencyFailureCleared);
        }
        if missing != self.deps_missing {
            self.deps_missing = missing;
            self.emit(if missing {
                EventKind::DependencyUninstalled
            } else {
                EventKind::DependencyInstalled
            });
        }
        if !self.deps_failed && failed {
            self.deps_failed = true;
            self.emit(EventKind::DependencyFailed);
        }
    }

    fn publish_status(&mut self) {
        if matches!(self.substate, Substate::Removing | Substate::Removed) {
            return;
        }
        let status = DependencyStatus {
            bound: true,
            missing: self.edges.iter().any(|e| e.view().missing),
            failed: self.failure.is_some() || self.edges.iter().any(|e| e.view().failed),
            up: self.substate == Substate::Up,
        };
        if status == self.published {
            return;
        }
        self.published = status;
        let value = if status.up { self.value.clone() } else { None };
        for registration in &self.own {
            registration.publish(status, value.clone());
        }
    }

    fn enter(&mut self, substate: Substate) {
        tracing::trace!(
            service = %self.handle.name(),
            from = ?self.substate,
            to = ?substate,
            "transition"
        );
        self.substate = substate;
        self.handle.publish(Snapshot {
            state: substate.public(),
            failure: self.failure.clone(),
            value: if substate.public() == State::Up {
                self.value.clone()
            } else {
                None
            },
        });
    }

    fn event(&self, kind: EventKind) -> Event {
        Event::new(kind)
            .with_service(Arc::clone(self.handle.name().as_arc()))
            .with_mode(self.mode)
    }

    fn emit(&self, kind: EventKind) {
        self.listeners.emit(&self.event(kind));
    }

    fn emit_with_reason(&self, kind: EventKind, reason: String) {
        self.listeners.emit(&self.event(kind).with_reason(reason));
    }
}
