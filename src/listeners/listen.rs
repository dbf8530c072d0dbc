//! # Core listener trait
//!
//! `Listen` is the extension point for observing controller transitions. A
//! controller invokes its listeners inline, in registration order, after the
//! transition has been committed and without holding any lock.
//!
//! ## Contract
//! - `on_event` must not block for long: the controller's next transition waits for it.
//! - A panic inside `on_event` is caught and logged; later listeners still run.
//! - A listener may call back into the container (install, set modes); those calls
//!   only enqueue work and never re-enter the calling controller.
//!
//! ## Example
//! ```rust
//! use servicevisor::{Event, EventKind, Listen};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! #[derive(Default)]
//! struct FailureCounter(AtomicUsize);
//!
//! impl Listen for FailureCounter {
//!     fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::ServiceStartFailed {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "failure-counter" }
//! }
//! ```

use crate::events::Event;

/// Contract for lifecycle listeners.
pub trait Listen: Send + Sync + 'static {
    /// Handle a single event.
    fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
