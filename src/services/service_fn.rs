//! # Function-backed service (`ServiceFn`)
//!
//! [`ServiceFn`] wraps a closure `F: Fn(StartContext) -> Fut`, producing a fresh
//! start future per attempt. Stopping is a no-op; implement [`Service`] directly
//! when the service holds resources that need releasing.
//!
//! ## Example
//! ```rust
//! use servicevisor::{ServiceError, ServiceFn, ServiceRef, StartContext};
//!
//! let svc: ServiceRef = ServiceFn::arc(|ctx: StartContext| async move {
//!     if ctx.token().is_cancelled() {
//!         return Err(ServiceError::failed("cancelled"));
//!     }
//!     Ok(())
//! });
//! # let _ = svc;
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::services::service::{Service, ServiceValue, StartContext, StopContext};

/// Function-backed service implementation.
pub struct ServiceFn<F> {
    f: F,
    value: Option<ServiceValue>,
}

impl<F> ServiceFn<F> {
    /// Creates a new function-backed service.
    ///
    /// Prefer [`ServiceFn::arc`] when you immediately need a [`ServiceRef`](crate::ServiceRef).
    pub fn new(f: F) -> Self {
        Self { f, value: None }
    }

    /// Creates the service and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }

    /// Exposes `value` to dependents while the service is up.
    pub fn with_value(mut self, value: ServiceValue) -> Self {
        self.value = Some(value);
        self
    }
}

#[async_trait]
impl<F, Fut> Service for ServiceFn<F>
where
    F: Fn(StartContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ServiceError>> + Send + 'static,
{
    async fn start(&self, ctx: StartContext) -> Result<(), ServiceError> {
        (self.f)(ctx).await
    }

    async fn stop(&self, _ctx: StopContext) -> Result<(), ServiceError> {
        Ok(())
    }

    fn value(&self) -> Option<ServiceValue> {
        self.value.clone()
    }
}

/// Service whose start and stop always succeed immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullService;

#[async_trait]
impl Service for NullService {
    async fn start(&self, _ctx: StartContext) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn stop(&self, _ctx: StopContext) -> Result<(), ServiceError> {
        Ok(())
    }
}
