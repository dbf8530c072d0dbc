//! # Controller modes.
//!
//! [`Mode`] decides whether a controller should be up, independently of its
//! dependencies being satisfied, and whether it pushes demand onto them.
//!
//! | Mode       | Should start          | Demands dependencies  |
//! |------------|-----------------------|-----------------------|
//! | `Active`   | always                | always                |
//! | `Passive`  | always                | while demanded        |
//! | `OnDemand` | while demanded        | while demanded        |
//! | `Never`    | never                 | never                 |
//! | `Remove`   | never, then removed   | never                 |
//!
//! `Remove` is terminal: once set, the mode cannot change again.

use std::fmt;

/// Policy governing whether a controller should be up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Start as soon as dependencies allow, and demand them.
    #[default]
    Active,
    /// Start whenever dependencies happen to be up; never demand them unless demanded.
    Passive,
    /// Start only while some dependent demands this service.
    OnDemand,
    /// Stay down.
    Never,
    /// Drain to down, detach from the graph and go away.
    Remove,
}

impl Mode {
    /// Whether a controller in this mode wants to be up, given `demand` from its dependents.
    pub fn should_start(self, demand: usize) -> bool {
        match self {
            Mode::Active | Mode::Passive => true,
            Mode::OnDemand => demand > 0,
            Mode::Never | Mode::Remove => false,
        }
    }

    /// Whether a controller in this mode pushes demand onto its dependencies.
    pub fn demands_dependencies(self, demand: usize) -> bool {
        match self {
            Mode::Active => true,
            Mode::Passive | Mode::OnDemand => demand > 0,
            Mode::Never | Mode::Remove => false,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            Mode::Active => "active",
            Mode::Passive => "passive",
            Mode::OnDemand => "on_demand",
            Mode::Never => "never",
            Mode::Remove => "remove",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_demand_follows_demand() {
        assert!(!Mode::OnDemand.should_start(0));
        assert!(Mode::OnDemand.should_start(1));
        assert!(!Mode::OnDemand.demands_dependencies(0));
        assert!(Mode::OnDemand.demands_dependencies(2));
    }

    #[test]
    fn passive_starts_without_demanding() {
        assert!(Mode::Passive.should_start(0));
        assert!(!Mode::Passive.demands_dependencies(0));
        assert!(Mode::Passive.demands_dependencies(1));
    }

    #[test]
    fn never_and_remove_stay_down() {
        for mode in [Mode::Never, Mode::Remove] {
            assert!(!mode.should_start(5));
            assert!(!mode.demands_dependencies(5));
        }
    }

    #[test]
    fn active_is_default() {
        assert_eq!(Mode::default(), Mode::Active);
        assert!(Mode::Active.should_start(0));
        assert!(Mode::Active.demands_dependencies(0));
    }
}
