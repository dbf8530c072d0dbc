//! # servicevisor
//!
//! **Servicevisor** is an in-process service lifecycle runtime for Rust.
//!
//! It manages a graph of named services with declared dependencies and drives
//! every service through a start/stop lifecycle ordered by that graph: a service
//! starts only after everything it depends on is up, and stops only after
//! everything depending on it has stopped. Services are activated lazily through
//! demand, optional dependencies couple softly, and cycles are rejected at install.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ ServiceSpec  │   │ ServiceSpec  │   │ ServiceSpec  │
//!     │    ("db")    │   │  ("cache")   │   │   ("web")    │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  ServiceContainer                                                 │
//! │  - Registry (one Registration per name/alias)                     │
//! │  - DependencyGraph (cycle detection at install)                   │
//! │  - Stability (in-flight messages and callbacks)                   │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ Controller   │◄──│ Registration │◄──│ Controller   │
//!     │ "db" (task)  │──►│    "db"      │──►│ "web" (task) │
//!     └──────┬───────┘   └──────────────┘   └──────┬───────┘
//!            │ demand ▲ / up, down, failed ▼        │
//!            ▼                                      ▼
//!     Service::start/stop                    ListenerSet::emit(&Event)
//! ```
//!
//! ### Lifecycle
//! ```text
//! install ──► Down ──(mode wants it ∧ deps up)──► Starting ──ok──► Up
//!              ▲                                     │              │
//!              │                                    err     (mode or deps changed)
//!              │                                     ▼              ▼
//!              ├──────(mode no longer wants it)── Failed     dependents told "down"
//!              │                                                    │ (none running)
//!              └────────────────────────── Stopping ◄───────────────┘
//!
//! mode = Remove: drain to Down ──► detach ──► Removed
//! ```
//!
//! ## Features
//! | Area              | Description                                                      | Key types / traits                                |
//! |-------------------|------------------------------------------------------------------|---------------------------------------------------|
//! | **Container**     | Install services, look them up, wait for quiescence, shut down.  | [`ServiceContainer`], [`ContainerBuilder`]        |
//! | **Controllers**   | Per-service state machine and host-facing handle.                | [`ServiceController`], [`State`], [`Mode`]        |
//! | **Services**      | Define payloads as trait impls or closures.                      | [`Service`], [`ServiceFn`], [`ServiceSpec`]       |
//! | **Listener API**  | Hook into lifecycle transitions (logging, metrics, tests).       | [`Listen`], [`Event`], [`EventKind`]              |
//! | **Errors**        | Typed errors for install, payloads, handles and shutdown.        | [`InstallError`], [`ServiceError`], [`RuntimeError`] |
//! | **Configuration** | Centralize container settings.                                   | [`ContainerConfig`]                               |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] listener _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use servicevisor::{
//!     ContainerConfig, Mode, NullService, ServiceContainer, ServiceSpec, State,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Build container (optionally with container-wide listeners)
//!     #[cfg(feature = "logging")]
//!     let container = ServiceContainer::builder(ContainerConfig::default())
//!         .with_listener(Arc::new(servicevisor::LogWriter::new()))
//!         .build();
//!     #[cfg(not(feature = "logging"))]
//!     let container = ServiceContainer::new(ContainerConfig::default());
//!
//!     // "db" only runs while something needs it
//!     let db = container.install(
//!         ServiceSpec::new("db", Arc::new(NullService)).with_mode(Mode::OnDemand),
//!     )?;
//!     container.await_stability().await;
//!     assert_eq!(db.state(), State::Down);
//!
//!     // "web" is active and demands "db"
//!     let web = container.install(
//!         ServiceSpec::new("web", Arc::new(NullService)).with_dependency("db"),
//!     )?;
//!     web.await_state(State::Up).await?;
//!     assert_eq!(db.state(), State::Up);
//!
//!     // Remove everything, dependents first
//!     container.shutdown().await?;
//!     Ok(())
//! }
//! ```
mod controller;
mod core;
mod edges;
mod error;
mod events;
mod listeners;
mod policies;
mod services;

// ---- Public re-exports ----

pub use controller::{ServiceController, State};
pub use core::{ContainerBuilder, ContainerConfig, ServiceContainer};
pub use error::{ControllerError, InstallError, RuntimeError, ServiceError};
pub use events::{Event, EventKind};
pub use listeners::Listen;
pub use policies::Mode;
pub use services::{
    DependencyKind, NullService, Service, ServiceFn, ServiceName, ServiceRef, ServiceSpec,
    ServiceValue, StartContext, StopContext,
};

// Optional: expose a simple built-in logger listener (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use listeners::LogWriter;
