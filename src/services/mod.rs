//! # Service payloads and install requests.
//!
//! This module provides the service-related types:
//! - [`Service`] - trait for start/stop callbacks
//! - [`ServiceFn`] - closure-backed service, [`NullService`] - no-op service
//! - [`ServiceRef`] - shared reference to a service (`Arc<dyn Service>`)
//! - [`ServiceSpec`] - install request bundling a service with its name, aliases and dependencies
//! - [`ServiceName`] - registration identity

mod name;
mod service;
mod service_fn;
mod spec;

pub use name::ServiceName;
pub use service::{Service, ServiceRef, ServiceValue, StartContext, StopContext};
pub use service_fn::{NullService, ServiceFn};
pub use spec::{DependencyKind, ServiceSpec};

pub(crate) use spec::SpecParts;
