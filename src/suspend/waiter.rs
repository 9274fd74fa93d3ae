use super::{AwaitId, Suspender};
use crate::error::HandlerError;
use slircbot_proto::IrcEvent;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// The receiving end of one registration.
///
/// A continuation suspends by awaiting one of the `next*` methods. Dropping
/// the waiter cancels the registration, so every exit path of the owning
/// continuation unregisters it.
#[derive(Debug)]
pub struct Waiter {
    suspender: Suspender,
    id: AwaitId,
    label: &'static str,
    rx: mpsc::UnboundedReceiver<IrcEvent>,
}

impl Waiter {
    pub(super) fn new(
        suspender: Suspender,
        id: AwaitId,
        label: &'static str,
        rx: mpsc::UnboundedReceiver<IrcEvent>,
    ) -> Self {
        Self {
            suspender,
            id,
            label,
            rx,
        }
    }

    #[cfg(test)]
    pub fn id(&self) -> AwaitId {
        self.id
    }

    /// Suspend until the next event of interest arrives.
    pub async fn next(&mut self) -> Result<IrcEvent, HandlerError> {
        self.rx
            .recv()
            .await
            .ok_or(HandlerError::Cancelled(self.label))
    }

    /// Suspend until an event satisfying `accept` arrives.
    ///
    /// Deliveries that match the interest set by kind but fail the predicate
    /// are dropped and the waiter suspends again on the same interest.
    pub async fn next_matching<F>(&mut self, mut accept: F) -> Result<IrcEvent, HandlerError>
    where
        F: FnMut(&IrcEvent) -> bool,
    {
        loop {
            let event = self.next().await?;
            if accept(&event) {
                return Ok(event);
            }
        }
    }

    /// Like [`Waiter::next`], but gives up at `deadline` with `Ok(None)`.
    pub async fn next_until(&mut self, deadline: Instant) -> Result<Option<IrcEvent>, HandlerError> {
        if let Some(mut interest) = self.suspender.interest_of(self.id) {
            interest.deadline = Some(deadline);
            self.suspender.set_interest(self.id, interest);
        }
        match tokio::time::timeout_at(deadline, self.next()).await {
            Ok(result) => result.map(Some),
            Err(_) => Ok(None),
        }
    }

    /// Replace the interest set. Events already queued under the old set
    /// are still delivered.
    #[cfg(test)]
    pub fn rearm(&mut self, kinds: &[slircbot_proto::EventKind]) {
        self.suspender
            .set_interest(self.id, super::registry::Interest::events(kinds));
    }
}

impl Drop for Waiter {
    fn drop(&mut self) {
        self.suspender.cancel(self.id);
    }
}
