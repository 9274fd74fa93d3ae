//! Invocation context shared by every command.

use crate::error::HandlerError;
use crate::outbound::Outbound;
use crate::state::BotState;
use crate::store::StoreError;
use slircbot_proto::ChannelExt;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Permission class of a sender, lowest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Permission {
    Blacklist,
    Anyone,
    Registered,
    Whitelist,
    Elevated,
    Operator,
    Staff,
    Admin,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Blacklist => "blacklist",
            Self::Anyone => "anyone",
            Self::Registered => "registered",
            Self::Whitelist => "whitelist",
            Self::Elevated => "elevated",
            Self::Operator => "operator",
            Self::Staff => "staff",
            Self::Admin => "admin",
        };
        f.write_str(name)
    }
}

/// Where an invocation came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    Chat,
    Bus,
}

impl Origin {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Bus => "bus",
        }
    }
}

/// Where a command reports its outcome.
pub trait ReplySink: Send + Sync {
    fn origin(&self) -> Origin;

    /// Channel replies land in, if any.
    fn target_channel(&self) -> Option<&str>;

    fn reply(&self, text: &str);
}

/// Replies over the wire to the channel or query the command came from.
pub struct ChatSink {
    outbound: Arc<dyn Outbound>,
    nickname: String,
    channel: Option<String>,
}

impl ChatSink {
    pub fn new(outbound: Arc<dyn Outbound>, nickname: &str, channel: Option<&str>) -> Self {
        Self {
            outbound,
            nickname: nickname.to_string(),
            channel: channel.map(str::to_string),
        }
    }
}

impl ReplySink for ChatSink {
    fn origin(&self) -> Origin {
        Origin::Chat
    }

    fn target_channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    fn reply(&self, text: &str) {
        let target = self.channel.as_deref().unwrap_or(&self.nickname);
        self.outbound.reply(target, &self.nickname, text);
    }
}

/// Reports bus-triggered commands on the local console.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleSink;

impl ReplySink for ConsoleSink {
    fn origin(&self) -> Origin {
        Origin::Bus
    }

    fn target_channel(&self) -> Option<&str> {
        None
    }

    fn reply(&self, text: &str) {
        info!(target: "admin", "{text}");
    }
}

/// Who invoked a command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invoker {
    pub nickname: String,
    pub account: Option<String>,
    pub hostmask: Option<String>,
    pub permission: Permission,
    /// Reached the bot by private message.
    pub via_query: bool,
}

impl Invoker {
    /// The operator console behind the control bus.
    pub fn console() -> Self {
        Self {
            nickname: String::new(),
            account: None,
            hostmask: None,
            permission: Permission::Admin,
            via_query: false,
        }
    }
}

impl fmt::Display for Invoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.account, self.nickname.is_empty()) {
            (_, true) => f.write_str("console"),
            (Some(account), false) => write!(f, "{} ({account})", self.nickname),
            (None, false) => f.write_str(&self.nickname),
        }
    }
}

/// One command invocation.
pub struct Invocation {
    pub state: Arc<BotState>,
    pub verb: &'static str,
    pub invoker: Invoker,
    /// Channel scope; `None` for queries and the bus.
    pub channel: Option<String>,
    /// Whitespace-separated arguments after the verb.
    pub args: Vec<String>,
    pub sink: Arc<dyn ReplySink>,
}

impl Invocation {
    pub fn reply(&self, text: impl AsRef<str>) {
        self.sink.reply(text.as_ref());
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Arguments from `index` on, joined back with single spaces.
    pub fn rest(&self, index: usize) -> Option<String> {
        let rest = self.args.get(index..)?;
        if rest.is_empty() {
            None
        } else {
            Some(rest.join(" "))
        }
    }

    /// Channel argument at `index`, or the invocation's own channel scope
    /// when the argument is absent. A present argument that is not a channel
    /// name is refused, as is having no channel at all; both reply and
    /// return `None`.
    pub fn channel_arg(&self, index: usize) -> Option<String> {
        match self.arg(index) {
            Some(arg) if arg.is_channel_name() => Some(arg.to_string()),
            Some(bad) => {
                self.reply(format!("Invalid channel name: {bad}"));
                None
            }
            None if self.channel.is_some() => self.channel.clone(),
            None => {
                self.reply("Please specify a channel.");
                None
            }
        }
    }

    /// Pass a store result through, telling the invoker `{action} failed`
    /// when it is an error.
    pub fn stored<T>(
        &self,
        action: &str,
        result: Result<T, StoreError>,
    ) -> Result<T, HandlerError> {
        result.map_err(|e| {
            self.reply(format!("{action} failed: {e}"));
            HandlerError::from(e)
        })
    }

    pub fn origin(&self) -> Origin {
        self.sink.origin()
    }
}
