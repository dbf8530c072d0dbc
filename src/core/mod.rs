//! Runtime core: the container and the registry behind it.
//!
//! The only public API from this module is [`ServiceContainer`] (with its
//! [`ContainerBuilder`] and [`ContainerConfig`]).
//!
//! Internal modules:
//! - [`registry`]: names, registrations, install/uninstall;
//! - [`cycle`]: install-time cycle detection;
//! - [`stability`]: quiescence tracking for `await_stability`;
//! - [`container`]: host-facing container and shutdown;
//! - [`builder`]: container construction.

mod builder;
mod config;
mod container;
mod cycle;
mod registry;
mod stability;

pub use builder::ContainerBuilder;
pub use config::ContainerConfig;
pub use container::ServiceContainer;

pub(crate) use registry::Registry;
pub(crate) use stability::Stability;
