//! Command routing for chat messages and the control bus.

use super::{
    COMMANDS, ChannelPolicy, ChatSink, CommandSpec, ConsoleSink, Invocation, Invoker, Origin,
    Permission, PrefixPolicy,
};
use crate::bus::{ADMIN_HEADER, BusMessage, BusPayload};
use crate::error::BusError;
use crate::state::BotState;
use crate::suspend;
use crate::telemetry::{CommandTimer, spans};
use slircbot_proto::{IrcEvent, irc_eq};
use std::sync::Arc;
use tracing::{Instrument, debug};

/// A chat message that may carry a command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    pub nickname: String,
    pub account: Option<String>,
    pub hostmask: Option<String>,
    pub permission: Permission,
    /// `None` for private messages.
    pub channel: Option<String>,
    pub text: String,
}

impl ChatMessage {
    /// Build from a `CHAN` or `QUERY` event. The permission class is
    /// computed by the caller.
    pub fn from_event(event: &IrcEvent, permission: Permission) -> Self {
        Self {
            nickname: event.sender.nickname.clone(),
            account: event.sender.account.clone(),
            hostmask: event.sender.hostmask(),
            permission,
            channel: event.channel.clone(),
            text: event.content.clone(),
        }
    }
}

/// Routes chat and bus traffic to registered commands.
pub struct CommandRouter {
    commands: Vec<&'static CommandSpec>,
}

impl Default for CommandRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRouter {
    /// A router over the admin command table.
    pub fn new() -> Self {
        let mut router = Self {
            commands: Vec::with_capacity(COMMANDS.len()),
        };
        for spec in COMMANDS {
            router.register(spec);
        }
        router
    }

    /// An empty router.
    #[cfg(test)]
    pub fn empty() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Add a command. Equal priorities keep registration order.
    pub fn register(&mut self, spec: &'static CommandSpec) {
        let at = self
            .commands
            .iter()
            .position(|existing| existing.priority < spec.priority)
            .unwrap_or(self.commands.len());
        self.commands.insert(at, spec);
    }

    /// Run every command the message triggers, highest priority first,
    /// stopping after the first non-chainable one. Returns how many ran.
    pub async fn route(&self, state: &Arc<BotState>, message: ChatMessage) -> usize {
        let words: Vec<&str> = message.text.split_whitespace().collect();
        if words.is_empty() {
            return 0;
        }

        let mut invoked = 0;
        for &spec in &self.commands {
            let Some(verb_at) = verb_position(spec.prefix, state, &message, &words) else {
                continue;
            };
            let verb = strip_prefix(spec.prefix, state, &message, words[verb_at]);
            if !verb.eq_ignore_ascii_case(spec.verb) {
                continue;
            }
            if spec.permission > message.permission {
                debug!(verb = spec.verb, nickname = %message.nickname, "Insufficient permission");
                continue;
            }
            if !channel_accepted(spec.channels, state, message.channel.as_deref()) {
                continue;
            }

            let invocation = Invocation {
                state: Arc::clone(state),
                verb: spec.verb,
                invoker: Invoker {
                    nickname: message.nickname.clone(),
                    account: message.account.clone(),
                    hostmask: message.hostmask.clone(),
                    permission: message.permission,
                    via_query: message.channel.is_none(),
                },
                channel: message.channel.clone(),
                args: words[verb_at + 1..].iter().map(|w| w.to_string()).collect(),
                sink: Arc::new(ChatSink::new(
                    Arc::clone(&state.outbound),
                    &message.nickname,
                    message.channel.as_deref(),
                )),
            };
            invoked += 1;
            run(spec, invocation).await;

            if !spec.chainable {
                break;
            }
        }
        invoked
    }

    /// Handle a control-bus envelope.
    ///
    /// Envelopes for other audiences are ignored. The payload must be text
    /// of the form `verb [args]`; the command reports to the console.
    pub async fn route_bus(
        &self,
        state: &Arc<BotState>,
        message: &BusMessage,
    ) -> Result<(), BusError> {
        if message.header != ADMIN_HEADER {
            return Ok(());
        }
        let text = match &message.payload {
            BusPayload::Text(text) => text.trim(),
            BusPayload::Other(value) => return Err(BusError::MisCastPayload(value.to_string())),
        };
        if text.is_empty() {
            return Err(BusError::EmptyPayload);
        }

        let (verb, rest) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
        let spec = self
            .commands
            .iter()
            .find(|spec| spec.verb.eq_ignore_ascii_case(verb))
            .ok_or_else(|| BusError::UnknownVerb(verb.to_string()))?;

        let invocation = Invocation {
            state: Arc::clone(state),
            verb: spec.verb,
            invoker: Invoker::console(),
            channel: None,
            args: rest.split_whitespace().map(str::to_string).collect(),
            sink: Arc::new(ConsoleSink),
        };
        run(spec, invocation).await;
        Ok(())
    }
}

/// Index of the verb word, if the message is shaped for `policy`.
fn verb_position(
    policy: PrefixPolicy,
    state: &BotState,
    message: &ChatMessage,
    words: &[&str],
) -> Option<usize> {
    match policy {
        PrefixPolicy::Prefixed => {
            let prefix = state.config.bot.prefix.as_str();
            let prefixed = words[0].len() > prefix.len() && words[0].starts_with(prefix);
            (prefixed || message.channel.is_none()).then_some(0)
        }
        PrefixPolicy::Nickname => {
            let addressed = words[0].trim_end_matches([':', ',']);
            (words.len() > 1 && irc_eq(addressed, &state.config.bot.nickname)).then_some(1)
        }
        PrefixPolicy::Direct => Some(0),
    }
}

fn strip_prefix<'a>(
    policy: PrefixPolicy,
    state: &BotState,
    message: &ChatMessage,
    word: &'a str,
) -> &'a str {
    match policy {
        PrefixPolicy::Prefixed => {
            let stripped = word.strip_prefix(state.config.bot.prefix.as_str());
            match stripped {
                Some(verb) if !verb.is_empty() => verb,
                _ if message.channel.is_none() => word,
                _ => "",
            }
        }
        PrefixPolicy::Nickname | PrefixPolicy::Direct => word,
    }
}

fn channel_accepted(policy: ChannelPolicy, state: &BotState, channel: Option<&str>) -> bool {
    match policy {
        ChannelPolicy::Any => true,
        ChannelPolicy::Home => channel.is_some_and(|c| state.is_home(c)),
    }
}

async fn run(spec: &'static CommandSpec, invocation: Invocation) {
    if invocation.args.len() < spec.min_args {
        let usage = match invocation.origin() {
            Origin::Chat => format!("Usage: {}{}", invocation.state.config.bot.prefix, spec.usage),
            Origin::Bus => format!("Usage: {}", spec.usage),
        };
        invocation.reply(usage);
        return;
    }

    let span = spans::command(
        spec.verb,
        invocation.origin().as_str(),
        invocation.channel.as_deref(),
    );
    let _timer = CommandTimer::new(spec.verb);
    suspend::start(spec.verb, (spec.run)(invocation))
        .instrument(span)
        .await;
}
