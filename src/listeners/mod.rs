//! # Lifecycle listeners for service controllers.
//!
//! This module provides the [`Listen`] trait and the per-controller
//! [`ListenerSet`] that dispatches events to it.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   controller task ── transition committed ──► ListenerSet::emit(&Event)
//!                                                    │
//!                                         ┌──────────┼──────────┐
//!                                         ▼          ▼          ▼
//!                                    container   container   per-service
//!                                    listener 1  listener N  listeners
//! ```
//!
//! Container-wide listeners are attached to every controller at install time, ahead
//! of the listeners declared on the [`ServiceSpec`](crate::ServiceSpec).

mod listen;
#[cfg(feature = "logging")]
mod log;
mod set;

pub use listen::Listen;
#[cfg(feature = "logging")]
pub use log::LogWriter;
pub(crate) use set::ListenerSet;

pub(crate) use set::panic_message;
