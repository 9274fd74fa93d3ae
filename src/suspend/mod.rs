//! Cooperative suspension of handler bodies.
//!
//! A handler that needs a later protocol event registers interest with the
//! [`Suspender`], gets a [`Waiter`] back, and awaits it. The dispatcher feeds
//! every inbound event to [`Suspender::dispatch`], which resumes each
//! registration whose interest contains the event's kind, oldest first.
//!
//! Handler bodies are started through [`continuation::start`], which runs
//! them inline until their first suspension.

pub mod continuation;
mod registry;
mod waiter;

pub use continuation::start;
pub use registry::{AwaitId, Suspender};
pub use waiter::Waiter;
