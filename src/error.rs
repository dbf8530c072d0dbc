//! Error types used by the servicevisor container, controllers and services.
//!
//! This module defines four error enums:
//!
//! - [`InstallError`]: structural errors raised synchronously by [`ServiceContainer::install`](crate::ServiceContainer::install).
//! - [`ServiceError`]: errors raised by a service payload's start/stop callbacks.
//! - [`ControllerError`]: errors raised by controller handle operations.
//! - [`RuntimeError`]: errors raised by the container itself (shutdown).
//!
//! All types provide `as_label` for logging/metrics.

use std::time::Duration;
use thiserror::Error;

use crate::services::ServiceName;

/// # Structural errors produced while installing a service.
///
/// An install that fails with any of these leaves the container exactly as it was
/// before the call.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstallError {
    /// A name or alias of the service is already bound to another controller.
    #[error("duplicate service name: {name}")]
    DuplicateService {
        /// The offending name.
        name: ServiceName,
    },

    /// Installing the service would close one or more dependency cycles.
    #[error("circular dependency: {}", format_cycles(.cycles))]
    CircularDependency {
        /// Every distinct cycle found, each starting and ending at the new service.
        cycles: Vec<Vec<ServiceName>>,
    },

    /// The container has been shut down.
    #[error("container is shut down")]
    ShutDown,

    /// `install` was called outside of a tokio runtime.
    #[error("no tokio runtime available to drive the controller")]
    NoRuntime,
}

impl InstallError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use servicevisor::InstallError;
    ///
    /// let err = InstallError::DuplicateService { name: "db".into() };
    /// assert_eq!(err.as_label(), "install_duplicate_service");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            InstallError::DuplicateService { .. } => "install_duplicate_service",
            InstallError::CircularDependency { .. } => "install_circular_dependency",
            InstallError::ShutDown => "install_shut_down",
            InstallError::NoRuntime => "install_no_runtime",
        }
    }

    /// Returns the cycles reported by a [`InstallError::CircularDependency`], or an empty slice.
    pub fn cycles(&self) -> &[Vec<ServiceName>] {
        match self {
            InstallError::CircularDependency { cycles } => cycles,
            _ => &[],
        }
    }
}

fn format_cycles(cycles: &[Vec<ServiceName>]) -> String {
    cycles
        .iter()
        .map(|cycle| {
            cycle
                .iter()
                .map(ServiceName::as_str)
                .collect::<Vec<_>>()
                .join(" -> ")
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// # Errors produced by service payloads.
///
/// Start errors move the controller into [`State::Failed`](crate::State::Failed);
/// stop errors are reported and the controller still reaches `Down`.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The callback failed; a later manual restart may succeed.
    #[error("execution failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// The callback failed in a way the service considers permanent.
    #[error("fatal error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// The callback panicked.
    #[error("callback panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl ServiceError {
    /// Shorthand for [`ServiceError::Failed`].
    pub fn failed(error: impl Into<String>) -> Self {
        ServiceError::Failed {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use servicevisor::ServiceError;
    ///
    /// let err = ServiceError::failed("connection refused");
    /// assert_eq!(err.as_label(), "service_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::Failed { .. } => "service_failed",
            ServiceError::Fatal { .. } => "service_fatal",
            ServiceError::Panicked { .. } => "service_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ServiceError::Failed { error } => format!("error: {error}"),
            ServiceError::Fatal { error } => format!("fatal: {error}"),
            ServiceError::Panicked { info } => format!("panic: {info}"),
        }
    }
}

/// # Errors produced by [`ServiceController`](crate::ServiceController) operations.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// The controller is in [`Mode::Remove`](crate::Mode::Remove); its mode can no longer change.
    #[error("service {name} is being removed")]
    Removing {
        /// Service name.
        name: ServiceName,
    },

    /// The controller's task has already exited.
    #[error("service {name} is gone")]
    Gone {
        /// Service name.
        name: ServiceName,
    },
}

impl ControllerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ControllerError::Removing { .. } => "controller_removing",
            ControllerError::Gone { .. } => "controller_gone",
        }
    }
}

/// # Errors produced by the container runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some services were not removed in time.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Services still installed when the grace period ran out.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use servicevisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck services={stuck:?}")
            }
        }
    }
}
