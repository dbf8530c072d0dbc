//! # Container configuration.
//!
//! Provides [`ContainerConfig`], the settings a [`ServiceContainer`](crate::ServiceContainer)
//! is built with.
//!
//! ## Sentinel values
//! - `grace = 0s` → shutdown does not wait; anything not removed yet is reported as stuck.

use std::time::Duration;

use crate::policies::Mode;

/// Configuration for a service container.
///
/// ## Field semantics
/// - `grace`: Maximum wait for every service to be removed during shutdown
/// - `default_mode`: Mode of services installed without an explicit one
/// - `cancel_on_shutdown`: Cancel the token handed to callbacks when shutdown begins
///
/// ## Notes
/// All fields are public for flexibility. Prefer using helper accessors to avoid
/// sprinkling sentinel checks across the codebase.
#[derive(Clone, Debug)]
pub struct ContainerConfig {
    /// Maximum time to wait for graceful shutdown.
    ///
    /// When shutdown is requested:
    /// - Every service is switched to `Mode::Remove`
    /// - The container waits up to `grace` for all of them to reach `Removed`
    /// - If time runs out, returns `RuntimeError::GraceExceeded`
    pub grace: Duration,

    /// Mode used when a [`ServiceSpec`](crate::ServiceSpec) does not set one.
    ///
    /// `Mode::Remove` is not a sensible default and is replaced with `Mode::Active`.
    pub default_mode: Mode,

    /// Whether shutdown cancels the token callbacks receive in their contexts.
    ///
    /// Long-running start callbacks should watch the token so shutdown is not held
    /// up by them.
    pub cancel_on_shutdown: bool,
}

impl ContainerConfig {
    /// Returns the shutdown grace period as an `Option`.
    ///
    /// - `None` → do not wait
    /// - `Some(d)` → wait up to `d`
    #[inline]
    pub fn grace_period(&self) -> Option<Duration> {
        if self.grace == Duration::ZERO {
            None
        } else {
            Some(self.grace)
        }
    }

    /// Resolves the mode for a spec that may or may not carry one.
    #[inline]
    pub fn mode_for(&self, explicit: Option<Mode>) -> Mode {
        match (explicit, self.default_mode) {
            (Some(mode), _) => mode,
            (None, Mode::Remove) => Mode::Active,
            (None, mode) => mode,
        }
    }
}

impl Default for ContainerConfig {
    /// Default configuration:
    ///
    /// - `grace = 60s`
    /// - `default_mode = Mode::Active`
    /// - `cancel_on_shutdown = true`
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(60),
            default_mode: Mode::Active,
            cancel_on_shutdown: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_mode_wins() {
        let cfg = ContainerConfig {
            default_mode: Mode::OnDemand,
            ..ContainerConfig::default()
        };
        assert_eq!(cfg.mode_for(Some(Mode::Never)), Mode::Never);
        assert_eq!(cfg.mode_for(None), Mode::OnDemand);
    }

    #[test]
    fn remove_is_never_a_default() {
        let cfg = ContainerConfig {
            default_mode: Mode::Remove,
            ..ContainerConfig::default()
        };
        assert_eq!(cfg.mode_for(None), Mode::Active);
    }

    #[test]
    fn zero_grace_means_no_wait() {
        let cfg = ContainerConfig {
            grace: Duration::ZERO,
            ..ContainerConfig::default()
        };
        assert_eq!(cfg.grace_period(), None);
        assert_eq!(ContainerConfig::default().grace_period(), Some(Duration::from_secs(60)));
    }
}
