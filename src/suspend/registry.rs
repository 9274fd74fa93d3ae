//! The suspension registry.
//!
//! Every pending await is one [`PendingAwait`] entry holding the event kinds
//! it wants and the sending half of a per-registration queue. Dispatch walks
//! the entries in registration order and pushes a copy of the event to each
//! match; the receiving half lives in the [`Waiter`] the continuation holds.

use super::Waiter;
use crate::error::HandlerError;
use parking_lot::Mutex;
use slircbot_proto::{EventKind, IrcEvent};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Handle naming one registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AwaitId(u64);

impl fmt::Display for AwaitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "await#{}", self.0)
    }
}

/// What a registration is waiting for.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Interest {
    /// Event kinds that resume the registration. Empty means deadline-only.
    pub kinds: Vec<EventKind>,
    /// Absolute wake time, if any.
    pub deadline: Option<Instant>,
}

impl Interest {
    /// Interest in a set of event kinds with no deadline.
    pub fn events(kinds: &[EventKind]) -> Self {
        Self {
            kinds: kinds.to_vec(),
            deadline: None,
        }
    }

    /// Deadline-only interest.
    pub fn deadline(at: Instant) -> Self {
        Self {
            kinds: Vec::new(),
            deadline: Some(at),
        }
    }

    fn matches(&self, kind: EventKind) -> bool {
        self.kinds.contains(&kind)
    }
}

/// One registered await.
#[derive(Debug)]
struct PendingAwait {
    id: AwaitId,
    label: &'static str,
    interest: Interest,
    tx: mpsc::UnboundedSender<IrcEvent>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    pending: Vec<PendingAwait>,
}

/// Registry of pending continuations, shared by the dispatcher and every
/// handler that suspends.
#[derive(Clone, Debug, Default)]
pub struct Suspender {
    inner: Arc<Mutex<Inner>>,
}

impl Suspender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in `kinds`. The registration lives until the
    /// returned [`Waiter`] is dropped or [`Suspender::cancel`] is called.
    pub fn register(&self, kinds: &[EventKind], label: &'static str) -> Waiter {
        self.register_interest(Interest::events(kinds), label)
    }

    pub(crate) fn register_interest(&self, interest: Interest, label: &'static str) -> Waiter {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = AwaitId(inner.next_id);
        trace!(%id, label, kinds = ?interest.kinds, "Await registered");
        inner.pending.push(PendingAwait {
            id,
            label,
            interest,
            tx,
        });
        drop(inner);
        Waiter::new(self.clone(), id, label, rx)
    }

    /// Replace the interest of an existing registration, keeping its place
    /// in the FIFO order. Returns `false` if it is no longer registered.
    pub(crate) fn set_interest(&self, id: AwaitId, interest: Interest) -> bool {
        let mut inner = self.inner.lock();
        match inner.pending.iter_mut().find(|p| p.id == id) {
            Some(pending) => {
                pending.interest = interest;
                true
            }
            None => false,
        }
    }

    /// Remove a registration. Cancelling an unknown or already-cancelled id
    /// is a no-op; returns whether anything was removed.
    ///
    /// The waiter on the other end observes the cancellation as
    /// [`HandlerError::Cancelled`].
    pub fn cancel(&self, id: AwaitId) -> bool {
        let mut inner = self.inner.lock();
        let Some(pos) = inner.pending.iter().position(|p| p.id == id) else {
            return false;
        };
        let pending = inner.pending.remove(pos);
        trace!(%id, label = pending.label, "Await cancelled");
        true
    }

    /// Suspend the calling continuation for `duration`.
    ///
    /// The wait is a deadline-only registration, so it shows up in
    /// [`Suspender::pending_count`] and can be cancelled like any other.
    pub async fn delay(&self, duration: Duration) -> Result<(), HandlerError> {
        let deadline = Instant::now() + duration;
        let mut waiter = self.register_interest(Interest::deadline(deadline), "delay");
        match waiter.next_until(deadline).await? {
            None => Ok(()),
            Some(event) => Err(HandlerError::UnexpectedEvent {
                expected: "delay",
                got: event.kind,
            }),
        }
    }

    /// Deliver `event` to every registration interested in its kind, in
    /// registration order. Returns how many registrations received it.
    pub fn dispatch(&self, event: &IrcEvent) -> usize {
        let mut inner = self.inner.lock();
        let mut delivered = 0;
        inner.pending.retain(|pending| {
            if pending.tx.is_closed() {
                trace!(id = %pending.id, label = pending.label, "Dropping abandoned await");
                return false;
            }
            if pending.interest.matches(event.kind) {
                if pending.tx.send(event.clone()).is_err() {
                    trace!(id = %pending.id, label = pending.label, "Dropping abandoned await");
                    return false;
                }
                delivered += 1;
            }
            true
        });
        if delivered > 0 {
            debug!(kind = %event.kind, channel = ?event.channel, delivered, "Resumed awaits");
        }
        delivered
    }

    /// Number of live registrations.
    pub fn pending_count(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Interest of a live registration.
    pub fn interest_of(&self, id: AwaitId) -> Option<Interest> {
        self.inner
            .lock()
            .pending
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.interest.clone())
    }

    /// Ids of live registrations in FIFO order.
    #[cfg(test)]
    pub fn pending_ids(&self) -> Vec<AwaitId> {
        self.inner.lock().pending.iter().map(|p| p.id).collect()
    }

    /// Labels of live registrations in FIFO order.
    #[cfg(test)]
    pub fn labels(&self) -> Vec<&'static str> {
        self.inner.lock().pending.iter().map(|p| p.label).collect()
    }
}
