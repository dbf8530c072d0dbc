//! # Lifecycle events emitted by service controllers.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Service events**: the controller's own transitions (starting, started, failed, stopped, removed)
//! - **Dependency events**: aggregate status changes of the controller's dependencies
//! - **Management events**: listener attach/detach and mode changes
//!
//! The [`Event`] struct carries additional metadata such as timestamps, service name,
//! mode and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Events of one controller are delivered in the order they happened.
//!
//! ## Example
//! ```rust
//! use servicevisor::{Event, EventKind, Mode};
//!
//! let ev = Event::new(EventKind::ServiceStartFailed)
//!     .with_service("db")
//!     .with_mode(Mode::Active)
//!     .with_reason("connection refused");
//!
//! assert_eq!(ev.kind, EventKind::ServiceStartFailed);
//! assert_eq!(ev.service.as_deref(), Some("db"));
//! assert_eq!(ev.reason.as_deref(), Some("connection refused"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

use crate::policies::Mode;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Management events ===
    /// Listener was attached to the controller. Delivered to that listener only.
    ListenerAdded,

    /// Listener was detached from the controller. Delivered to that listener only.
    ListenerRemoved,

    /// Mode changed.
    ///
    /// Sets:
    /// - `mode`: the new mode
    ModeChanged,

    // === Service events ===
    /// Every dependency is up; the start callback is about to run.
    ServiceStarting,

    /// Start callback succeeded; the service is up.
    ServiceStarted,

    /// Start callback failed; the service is in `Failed`.
    ///
    /// Sets:
    /// - `reason`: failure message
    ServiceStartFailed,

    /// No dependent is running anymore; the stop callback is about to run.
    ServiceStopping,

    /// Stop callback finished; the service is down.
    ServiceStopped,

    /// Stop callback reported an error; the service is down regardless.
    ///
    /// Sets:
    /// - `reason`: failure message
    ServiceStopFailed,

    /// The service left `Failed` and is down again.
    ServiceFailureCleared,

    /// The service was detached from the graph. Last event of a controller.
    ServiceRemoved,

    // === Dependency events ===
    /// Every dependency is installed again (no missing dependency, transitively).
    DependencyInstalled,

    /// Some dependency is missing (directly or transitively).
    DependencyUninstalled,

    /// Some dependency failed to start (directly or transitively).
    DependencyFailed,

    /// No dependency is failed anymore.
    DependencyFailureCleared,
}

impl EventKind {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            EventKind::ListenerAdded => "listener_added",
            EventKind::ListenerRemoved => "listener_removed",
            EventKind::ModeChanged => "mode_changed",
            EventKind::ServiceStarting => "starting",
            EventKind::ServiceStarted => "started",
            EventKind::ServiceStartFailed => "start_failed",
            EventKind::ServiceStopping => "stopping",
            EventKind::ServiceStopped => "stopped",
            EventKind::ServiceStopFailed => "stop_failed",
            EventKind::ServiceFailureCleared => "failure_cleared",
            EventKind::ServiceRemoved => "removed",
            EventKind::DependencyInstalled => "dependency_installed",
            EventKind::DependencyUninstalled => "dependency_uninstalled",
            EventKind::DependencyFailed => "dependency_failed",
            EventKind::DependencyFailureCleared => "dependency_failure_cleared",
        }
    }
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Primary name of the service the event belongs to.
    pub service: Option<Arc<str>>,
    /// Mode of the service at the time of the event.
    pub mode: Option<Mode>,
    /// Human-readable reason (errors, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            service: None,
            mode: None,
            reason: None,
        }
    }

    /// Attaches a service name.
    #[inline]
    pub fn with_service(mut self, service: impl Into<Arc<str>>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Attaches the current mode.
    #[inline]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(
            self.kind,
            EventKind::ServiceStartFailed | EventKind::ServiceStopFailed
        )
    }
}
