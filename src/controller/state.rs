//! # Controller states.
//!
//! [`State`] is what host code observes. The controller task works with the finer
//! [`Substate`], which adds two transitional states that are reported under their
//! closest public state:
//!
//! ```text
//! Substate        State
//! ─────────────   ────────
//! New             New
//! Down            Down
//! Starting        Starting
//! Up              Up
//! StopRequested   Up        (dependents told "down", waiting for them to stop)
//! Stopping        Stopping
//! StartFailed     Failed
//! Removing        Down      (detaching from the graph)
//! Removed         Removed
//! ```

use std::fmt;

/// Host-visible lifecycle state of a service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum State {
    /// Installed; the controller task has not taken its first step yet.
    New,
    /// Not running.
    Down,
    /// The start callback is running.
    Starting,
    /// Running.
    Up,
    /// The stop callback is running.
    Stopping,
    /// The last start attempt failed.
    Failed,
    /// Detached from the graph. Final.
    Removed,
}

impl State {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            State::New => "new",
            State::Down => "down",
            State::Starting => "starting",
            State::Up => "up",
            State::Stopping => "stopping",
            State::Failed => "failed",
            State::Removed => "removed",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Substate {
    New,
    Down,
    Starting,
    Up,
    StopRequested,
    Stopping,
    StartFailed,
    Removing,
    Removed,
}

impl Substate {
    pub(crate) fn public(self) -> State {
        match self {
            Substate::New => State::New,
            Substate::Down | Substate::Removing => State::Down,
            Substate::Starting => State::Starting,
            Substate::Up | Substate::StopRequested => State::Up,
            Substate::Stopping => State::Stopping,
            Substate::StartFailed => State::Failed,
            Substate::Removed => State::Removed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitional_states_report_their_neighbour() {
        assert_eq!(Substate::StopRequested.public(), State::Up);
        assert_eq!(Substate::Removing.public(), State::Down);
        assert_eq!(Substate::StartFailed.public(), State::Failed);
        assert_eq!(State::Failed.to_string(), "failed");
    }
}
