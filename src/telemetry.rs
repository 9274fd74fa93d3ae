//! Telemetry utilities for command timing and continuation tracing.

use std::time::Instant;
use tracing::debug;

/// Guard for timing command execution.
///
/// Logs the elapsed time when dropped. For a command that suspends this only
/// covers the part that ran before the first suspension.
pub struct CommandTimer {
    command: &'static str,
    start: Instant,
}

impl CommandTimer {
    /// Start timing a command.
    pub fn new(command: &'static str) -> Self {
        Self {
            command,
            start: Instant::now(),
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let elapsed_us = self.start.elapsed().as_micros() as u64;
        debug!(command = self.command, elapsed_us, "Command dispatched");
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, info_span};

    /// Create a span for a command execution.
    pub fn command(name: &str, source: &str, channel: Option<&str>) -> Span {
        if let Some(channel) = channel {
            info_span!("command", name = %name, source = %source, channel = %channel)
        } else {
            info_span!("command", name = %name, source = %source)
        }
    }

    /// Create a span for a continuation, covering every resumption.
    pub fn continuation(name: &str) -> Span {
        info_span!("continuation", name = %name)
    }

    /// Create a span for one inbound event.
    pub fn event(kind: &str, channel: Option<&str>) -> Span {
        info_span!("event", kind = %kind, channel = ?channel)
    }
}
