//! Outbound protocol actions.
//!
//! Every action is fire-and-forget: whether a join worked is learned later
//! from inbound events, never from the call.

use std::fmt;
use tokio::sync::mpsc;
use tracing::warn;

/// One action for the transport to perform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutboundAction {
    Join {
        channel: String,
        key: Option<String>,
    },
    Part {
        channel: String,
        reason: Option<String>,
    },
    Raw(String),
    /// Reply in `target` (a channel, or the nickname for a query),
    /// addressed to `nickname`.
    Reply {
        target: String,
        nickname: String,
        text: String,
    },
    Quit {
        message: Option<String>,
        reconnect: bool,
    },
}

impl fmt::Display for OutboundAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Join { channel, key: Some(key) } => write!(f, "JOIN {channel} {key}"),
            Self::Join { channel, key: None } => write!(f, "JOIN {channel}"),
            Self::Part { channel, reason: Some(reason) } => write!(f, "PART {channel} :{reason}"),
            Self::Part { channel, reason: None } => write!(f, "PART {channel}"),
            Self::Raw(line) => f.write_str(line),
            Self::Reply { target, nickname, text } if target.starts_with(['#', '&', '+', '!']) => {
                write!(f, "PRIVMSG {target} :{nickname}: {text}")
            }
            Self::Reply { target, text, .. } => write!(f, "PRIVMSG {target} :{text}"),
            Self::Quit { message, .. } => write!(f, "QUIT :{}", message.as_deref().unwrap_or("")),
        }
    }
}

/// Sink for outbound actions.
pub trait Outbound: Send + Sync {
    fn send(&self, action: OutboundAction);

    fn join(&self, channel: &str, key: Option<&str>) {
        self.send(OutboundAction::Join {
            channel: channel.to_string(),
            key: key.map(str::to_string),
        });
    }

    fn part(&self, channel: &str, reason: Option<&str>) {
        self.send(OutboundAction::Part {
            channel: channel.to_string(),
            reason: reason.map(str::to_string),
        });
    }

    fn send_raw(&self, line: String) {
        self.send(OutboundAction::Raw(line));
    }

    fn reply(&self, target: &str, nickname: &str, text: &str) {
        self.send(OutboundAction::Reply {
            target: target.to_string(),
            nickname: nickname.to_string(),
            text: text.to_string(),
        });
    }
}

/// Queues actions on a channel drained by the transport.
#[derive(Clone, Debug)]
pub struct QueuedOutbound {
    tx: mpsc::UnboundedSender<OutboundAction>,
}

impl QueuedOutbound {
    pub fn new(tx: mpsc::UnboundedSender<OutboundAction>) -> Self {
        Self { tx }
    }

    /// A queue together with its receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OutboundAction>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl Outbound for QueuedOutbound {
    fn send(&self, action: OutboundAction) {
        if let Err(e) = self.tx.send(action) {
            warn!(action = %e.0, "Transport gone, dropping outbound action");
        }
    }
}
