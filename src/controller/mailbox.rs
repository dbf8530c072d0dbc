//! # Controller mailbox.
//!
//! Every controller task drains one unbounded queue of [`Message`]s. Everything that
//! can change a controller's mind arrives here: edge signals from its dependencies,
//! demand from its dependents, mode changes and listener updates from host code, and
//! callback completions from its own payload tasks.
//!
//! Sends never block and never fail loudly: a message for a controller that already
//! exited is dropped.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::core::Stability;
use crate::edges::Signal;
use crate::error::ServiceError;
use crate::listeners::Listen;
use crate::policies::Mode;

/// Input of a controller task.
pub(crate) enum Message {
    /// Status change on outbound edge `edge`.
    Edge { edge: usize, signal: Signal },
    AddDemand,
    RemoveDemand,
    /// The running-dependents count of one of the controller's names reached zero.
    DependentsStopped,
    SetMode(Mode),
    StartCompleted(Result<(), ServiceError>),
    StopCompleted(Result<(), ServiceError>),
    AddListener(Arc<dyn Listen>),
    RemoveListener(Arc<dyn Listen>),
}

/// Sending half of a controller's queue.
#[derive(Clone)]
pub(crate) struct Mailbox {
    tx: mpsc::UnboundedSender<Message>,
    stability: Stability,
}

impl Mailbox {
    pub(crate) fn channel(stability: Stability) -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, stability }, rx)
    }

    /// Enqueues a message. Returns `false` if the controller is gone.
    pub(crate) fn send(&self, msg: Message) -> bool {
        self.stability.enter();
        if self.tx.send(msg).is_err() {
            self.stability.leave();
            return false;
        }
        true
    }
}
