//! The control bus.
//!
//! Best-effort notifications between components. Envelopes carry a header
//! naming the audience and an opaque payload; the admin command layer acts
//! on `admin` envelopes with a text payload and emits `reload` envelopes
//! when stores change on disk.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;
use tracing::debug;

/// Header addressing the admin command layer.
pub const ADMIN_HEADER: &str = "admin";
/// Header asking listeners to re-read persisted state.
pub const RELOAD_HEADER: &str = "reload";

/// Payload of a bus envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BusPayload {
    Text(String),
    Other(serde_json::Value),
}

impl fmt::Display for BusPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Other(value) => write!(f, "{value}"),
        }
    }
}

/// One bus envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BusMessage {
    pub header: String,
    pub payload: BusPayload,
}

impl BusMessage {
    pub fn text(header: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            payload: BusPayload::Text(text.into()),
        }
    }
}

/// Sending side of the bus.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: mpsc::UnboundedSender<BusMessage>,
}

impl Bus {
    pub fn new(tx: mpsc::UnboundedSender<BusMessage>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<BusMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Post a text notification. Nobody listening is not an error.
    pub fn notify(&self, header: &str, text: &str) {
        if self.tx.send(BusMessage::text(header, text)).is_err() {
            debug!(header, text, "Bus has no listener");
        }
    }
}
