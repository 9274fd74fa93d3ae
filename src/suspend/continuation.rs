//! Running handler bodies as continuations.
//!
//! A handler body is an ordinary future. [`start`] polls it once on the
//! caller's stack: everything up to its first suspension point runs before
//! `start` returns. If it suspended, the remainder is moved onto a task of
//! the current runtime and resumes whenever its waiter is fed.

use crate::error::HandlerResult;
use crate::telemetry::spans;
use futures_util::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::task::Poll;
use tokio::task::JoinHandle;
use tracing::{Instrument, error, warn};

/// What became of a started continuation.
#[derive(Debug)]
pub enum Continuation {
    /// Ran to completion without suspending.
    Completed,
    /// Suspended at least once; the rest runs on this task.
    Suspended(JoinHandle<()>),
}

#[cfg(test)]
impl Continuation {
    pub fn is_suspended(&self) -> bool {
        matches!(self, Self::Suspended(_))
    }
}

/// Start `body` as a continuation named `name`.
///
/// Errors and panics end the continuation and are logged; they never reach
/// the caller.
pub async fn start<F>(name: &'static str, body: F) -> Continuation
where
    F: Future<Output = HandlerResult> + Send + 'static,
{
    let span = spans::continuation(name);
    let mut guarded = Box::pin(guard(name, body).instrument(span));

    match futures_util::poll!(guarded.as_mut()) {
        Poll::Ready(()) => Continuation::Completed,
        Poll::Pending => Continuation::Suspended(tokio::spawn(guarded)),
    }
}

async fn guard<F>(name: &'static str, body: F)
where
    F: Future<Output = HandlerResult>,
{
    match AssertUnwindSafe(body).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            warn!(continuation = name, code = e.error_code(), error = %e, "Continuation aborted");
        }
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "<non-string panic>".to_string());
            error!(continuation = name, panic = %message, "Continuation panicked");
        }
    }
}
