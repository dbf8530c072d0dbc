//! # Service controllers.
//!
//! Every installed service is driven by one controller: a tokio task running the
//! lifecycle state machine, plus a [`ServiceController`] handle host code keeps.
//!
//! ## Architecture
//! ```text
//! ServiceController (handle) ──SetMode / listeners──┐
//! Registration (demand, running) ───────────────────┤
//! Registration (edge signals) ──────────────────────┼──► Mailbox ──► ControllerActor
//! payload task (start/stop done) ───────────────────┘                  │
//!                                                                      ├─► Registration::publish (own names)
//!                                                                      ├─► ListenerSet::emit
//!                                                                      └─► watch snapshot (handle queries)
//! ```
//!
//! - [`handle`]: host-facing handle (`state`, `set_mode`, `await_state`, ...)
//! - [`machine`]: the controller task
//! - [`mailbox`]: message type and sender
//! - [`state`]: public [`State`] and internal substates

mod handle;
mod machine;
mod mailbox;
mod state;

pub use handle::ServiceController;
pub use state::State;

pub(crate) use machine::{ControllerActor, ControllerParts};
pub(crate) use mailbox::{Mailbox, Message};
