//! Unified error handling for slircbot.
//!
//! Conflict outcomes (already listed, not found) are plain result enums owned
//! by the stores. The types here cover what actually went wrong: bus traffic
//! we cannot interpret, and handlers that had to abort.

use crate::store::StoreError;
use slircbot_proto::EventKind;
use thiserror::Error;

// ============================================================================
// Bus Errors (control bus routing)
// ============================================================================

/// Errors raised while routing a control-bus message.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("empty bus payload")]
    EmptyPayload,

    /// The envelope said `admin` but the payload was not text.
    #[error("bus payload is not text: {0}")]
    MisCastPayload(String),

    #[error("unknown bus verb: {0}")]
    UnknownVerb(String),
}

impl BusError {
    /// Static error code for log labelling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyPayload => "empty_payload",
            Self::MisCastPayload(_) => "miscast_payload",
            Self::UnknownVerb(_) => "unknown_verb",
        }
    }
}

// ============================================================================
// Handler Errors (command and continuation bodies)
// ============================================================================

/// Errors that abort a single command or continuation.
///
/// None of these are reported over the wire; the continuation runner logs
/// them with full context and the rest of the bot carries on.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The await registration was cancelled from outside.
    #[error("await cancelled while waiting for {0}")]
    Cancelled(&'static str),

    /// A continuation was resumed with an event it never asked for.
    #[error("unexpected {got} event while waiting for {expected}")]
    UnexpectedEvent {
        expected: &'static str,
        got: EventKind,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Static error code for log labelling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Store(_) => "store_error",
            Self::Cancelled(_) => "cancelled",
            Self::UnexpectedEvent { .. } => "unexpected_event",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_error_codes() {
        assert_eq!(BusError::EmptyPayload.error_code(), "empty_payload");
        assert_eq!(BusError::UnknownVerb("frobnicate".into()).error_code(), "unknown_verb");
        assert_eq!(
            BusError::UnknownVerb("frobnicate".into()).to_string(),
            "unknown bus verb: frobnicate"
        );
    }

    #[test]
    fn test_handler_error_codes() {
        assert_eq!(HandlerError::Cancelled("SELFJOIN").error_code(), "cancelled");
        let err = HandlerError::UnexpectedEvent {
            expected: "join outcome",
            got: EventKind::Quit,
        };
        assert_eq!(err.error_code(), "unexpected_event");
        assert_eq!(err.to_string(), "unexpected QUIT event while waiting for join outcome");
    }
}
