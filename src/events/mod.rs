//! Lifecycle events.
//!
//! This module groups the event **data model** emitted by controllers and delivered
//! to listeners.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//!
//! ## Quick reference
//! - **Publishers**: controller tasks, one event per observable transition.
//! - **Consumers**: the controller's [`ListenerSet`](crate::listeners::ListenerSet),
//!   which hands each event to every listener in registration order.

mod event;

pub use event::{Event, EventKind};
