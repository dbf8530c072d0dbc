//! # Host-facing controller handle.
//!
//! [`ServiceController`] is a cheap, cloneable handle to one installed service. It
//! never touches the controller's state directly: queries read a snapshot the
//! controller task publishes through a `watch` channel, and commands are enqueued on
//! the controller's mailbox.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::error::{ControllerError, ServiceError};
use crate::listeners::Listen;
use crate::policies::Mode;
use crate::services::{ServiceName, ServiceValue};

use super::mailbox::{Mailbox, Message};
use super::state::State;

/// Last state published by the controller task.
#[derive(Clone)]
pub(crate) struct Snapshot {
    pub(crate) state: State,
    pub(crate) failure: Option<ServiceError>,
    pub(crate) value: Option<ServiceValue>,
}

struct Shared {
    id: u64,
    name: ServiceName,
    aliases: Vec<ServiceName>,
    mailbox: Mailbox,
    mode: Mutex<Mode>,
    snapshot: watch::Sender<Snapshot>,
}

/// Handle to an installed service.
///
/// ## Example
/// ```rust
/// use servicevisor::{ContainerConfig, Mode, NullService, ServiceContainer, ServiceSpec, State};
/// use std::sync::Arc;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let container = ServiceContainer::new(ContainerConfig::default());
///     let db = container.install(ServiceSpec::new("db", Arc::new(NullService)))?;
///
///     db.await_state(State::Up).await?;
///     db.set_mode(Mode::Never)?;
///     db.await_state(State::Down).await?;
///
///     db.remove()?;
///     db.await_state(State::Removed).await?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct ServiceController {
    shared: Arc<Shared>,
}

impl ServiceController {
    pub(crate) fn new(
        id: u64,
        name: ServiceName,
        aliases: Vec<ServiceName>,
        mailbox: Mailbox,
        mode: Mode,
    ) -> Self {
        let (snapshot, _) = watch::channel(Snapshot {
            state: State::New,
            failure: None,
            value: None,
        });
        Self {
            shared: Arc::new(Shared {
                id,
                name,
                aliases,
                mailbox,
                mode: Mutex::new(mode),
                snapshot,
            }),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.shared.id
    }

    pub(crate) fn publish(&self, snapshot: Snapshot) {
        self.shared.snapshot.send_replace(snapshot);
    }

    fn mode_lock(&self) -> MutexGuard<'_, Mode> {
        self.shared.mode.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Primary name.
    pub fn name(&self) -> &ServiceName {
        &self.shared.name
    }

    /// Aliases the service is also registered under.
    pub fn aliases(&self) -> &[ServiceName] {
        &self.shared.aliases
    }

    /// Current state.
    pub fn state(&self) -> State {
        self.shared.snapshot.borrow().state
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        *self.mode_lock()
    }

    /// Error of the last failed start, while the service is in [`State::Failed`].
    pub fn failure(&self) -> Option<ServiceError> {
        self.shared.snapshot.borrow().failure.clone()
    }

    /// Value exposed by the service while it is up.
    pub fn value(&self) -> Option<ServiceValue> {
        self.shared.snapshot.borrow().value.clone()
    }

    /// Changes the mode.
    ///
    /// # Errors
    /// - [`ControllerError::Removing`] if the service is already in [`Mode::Remove`]
    ///   and `mode` is anything else
    pub fn set_mode(&self, mode: Mode) -> Result<(), ControllerError> {
        let mut current = self.mode_lock();
        if *current == mode {
            return Ok(());
        }
        if *current == Mode::Remove {
            return Err(ControllerError::Removing {
                name: self.name().clone(),
            });
        }
        if !self.shared.mailbox.send(Message::SetMode(mode)) {
            return Err(self.gone());
        }
        *current = mode;
        Ok(())
    }

    /// Shorthand for `set_mode(Mode::Remove)`.
    pub fn remove(&self) -> Result<(), ControllerError> {
        self.set_mode(Mode::Remove)
    }

    /// Waits until the service reaches `target`.
    ///
    /// # Errors
    /// - [`ControllerError::Gone`] if the service is removed before reaching `target`
    pub async fn await_state(&self, target: State) -> Result<(), ControllerError> {
        let mut rx = self.shared.snapshot.subscribe();
        let reached = rx
            .wait_for(|s| s.state == target || s.state == State::Removed)
            .await
            .map(|s| s.state)
            .map_err(|_| self.gone())?;
        if reached == target {
            Ok(())
        } else {
            Err(self.gone())
        }
    }

    /// Attaches a listener. It receives `ListenerAdded` before any other event.
    pub fn add_listener(&self, listener: Arc<dyn Listen>) -> Result<(), ControllerError> {
        if self.shared.mailbox.send(Message::AddListener(listener)) {
            Ok(())
        } else {
            Err(self.gone())
        }
    }

    /// Detaches a listener. It receives a final `ListenerRemoved`.
    pub fn remove_listener(&self, listener: Arc<dyn Listen>) -> Result<(), ControllerError> {
        if self.shared.mailbox.send(Message::RemoveListener(listener)) {
            Ok(())
        } else {
            Err(self.gone())
        }
    }

    fn gone(&self) -> ControllerError {
        ControllerError::Gone {
            name: self.name().clone(),
        }
    }
}

impl fmt::Debug for ServiceController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceController")
            .field("name", self.name())
            .field("state", &self.state())
            .field("mode", &self.mode())
            .finish()
    }
}
