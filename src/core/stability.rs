//! # Quiescence tracking.
//!
//! [`Stability`] counts work that can still change the graph: mailbox messages not
//! yet handled and payload callbacks not yet finished. When the count drops to
//! zero, every controller has settled and [`Stability::settled`] resolves.
//!
//! ## Rules
//! - A message is counted before it is enqueued and released after its handler
//!   (including listener calls) returns.
//! - A callback task is counted before it is spawned and released after its
//!   completion message has been enqueued, so the count never dips to zero between
//!   the two.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Default)]
struct Inner {
    pending: AtomicUsize,
    notify: Notify,
}

/// Shared counter of in-flight work.
#[derive(Clone, Default)]
pub(crate) struct Stability {
    inner: Arc<Inner>,
}

impl Stability {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn enter(&self) {
        self.inner.pending.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn leave(&self) {
        let prev = self.inner.pending.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(prev > 0, "stability counter underflow");
        if prev == 1 {
            self.inner.notify.notify_waiters();
        }
    }

    /// Amount of in-flight work.
    pub(crate) fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::SeqCst)
    }

    /// Resolves once no work is in flight.
    pub(crate) async fn settled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn settles_after_last_leave() {
        let stability = Stability::new();
        stability.enter();
        stability.enter();

        let waiter = {
            let stability = stability.clone();
            tokio::spawn(async move { stability.settled().await })
        };

        stability.leave();
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        stability.leave();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("settled in time")
            .expect("waiter task");
    }

    #[tokio::test]
    async fn idle_counter_is_already_settled() {
        Stability::new().settled().await;
    }
}
