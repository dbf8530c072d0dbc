//! # ListenerSet: ordered, panic-isolated fan-out
//!
//! [`ListenerSet`] is owned by a single controller task and hands each [`Event`] to
//! every attached listener.
//!
//! ## What it guarantees
//! - Each listener sees each event exactly once, in registration order.
//! - Panics inside listeners are caught and logged (isolation).
//! - A newly attached listener receives `ListenerAdded` before any other event.
//!
//! ## Diagram
//! ```text
//!    emit(&Event)
//!        ├──► listener 1 .on_event()
//!        ├──► listener 2 .on_event()
//!        └──► listener N .on_event()
//! ```

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::events::{Event, EventKind};

use super::Listen;

/// Ordered collection of listeners attached to one controller.
#[derive(Default)]
pub(crate) struct ListenerSet {
    listeners: Vec<Arc<dyn Listen>>,
}

impl ListenerSet {
    /// Creates an empty set.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Attaches a listener and greets it with `ListenerAdded`.
    ///
    /// Attaching the same listener twice is a no-op.
    pub(crate) fn add(&mut self, listener: Arc<dyn Listen>, greeting: Event) {
        if self.position(&listener).is_some() {
            return;
        }
        deliver(&listener, &greeting);
        self.listeners.push(listener);
    }

    /// Detaches a listener and sends it a final `ListenerRemoved`.
    ///
    /// Returns `false` if the listener was not attached.
    pub(crate) fn remove(&mut self, listener: &Arc<dyn Listen>, farewell: Event) -> bool {
        match self.position(listener) {
            Some(idx) => {
                let removed = self.listeners.remove(idx);
                debug_assert_eq!(farewell.kind, EventKind::ListenerRemoved);
                deliver(&removed, &farewell);
                true
            }
            None => false,
        }
    }

    /// Hands one event to every listener, in registration order.
    pub(crate) fn emit(&self, event: &Event) {
        for listener in &self.listeners {
            deliver(listener, event);
        }
    }

    fn position(&self, listener: &Arc<dyn Listen>) -> Option<usize> {
        let target = Arc::as_ptr(listener) as *const ();
        self.listeners
            .iter()
            .position(|l| Arc::as_ptr(l) as *const () == target)
    }
}

fn deliver(listener: &Arc<dyn Listen>, event: &Event) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(|| listener.on_event(event))) {
        tracing::warn!(
            listener = listener.name(),
            event = event.kind.as_label(),
            panic = %panic_message(panic.as_ref()),
            "listener panicked"
        );
    }
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
