//! # LogWriter: lifecycle event logger
//!
//! A minimal listener that renders incoming [`Event`]s as `tracing` records.
//! Attach it container-wide with `ContainerBuilder::with_listener`.
//!
//! ## Example output
//! ```text
//! [starting] service="db" mode=active
//! [start-failed] service="db" err="connection refused"
//! [dependency-failed] service="web"
//! [stopped] service="db"
//! [removed] service="db"
//! ```

use crate::events::{Event, EventKind};
use crate::listeners::Listen;

/// Event writer listener.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Listen for LogWriter {
    fn on_event(&self, e: &Event) {
        let service = e.service.as_deref().unwrap_or("unknown");
        match e.kind {
            EventKind::ServiceStartFailed | EventKind::ServiceStopFailed => {
                tracing::warn!(
                    "[{}] service={:?} err={:?}",
                    e.kind.as_label(),
                    service,
                    e.reason.as_deref().unwrap_or("unknown")
                );
            }
            EventKind::ModeChanged | EventKind::ServiceStarting => {
                tracing::info!(
                    "[{}] service={:?} mode={}",
                    e.kind.as_label(),
                    service,
                    e.mode.map(|m| m.as_label()).unwrap_or("unknown")
                );
            }
            EventKind::ListenerAdded | EventKind::ListenerRemoved => {
                tracing::debug!("[{}] service={:?}", e.kind.as_label(), service);
            }
            _ => {
                tracing::info!("[{}] service={:?}", e.kind.as_label(), service);
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
