//! Admin commands.
//!
//! One data-driven table ([`COMMANDS`]) serves both entry points: chat
//! messages routed by [`CommandRouter::route`] and control-bus envelopes
//! routed by [`CommandRouter::route_bus`]. Handlers never know which one
//! called them beyond the [`ReplySink`] they report to.

mod channels;
mod classify;
mod context;
mod hostmask;
mod lifecycle;
mod router;

pub use context::{
    ChatSink, ConsoleSink, Invocation, Invoker, Origin, Permission, ReplySink,
};
pub use router::{ChatMessage, CommandRouter};

use crate::error::HandlerResult;
use futures_util::future::BoxFuture;

/// Entry point of a command.
pub type CommandFn = fn(Invocation) -> BoxFuture<'static, HandlerResult>;

/// Channels a chat command is accepted in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelPolicy {
    /// Only in home channels.
    Home,
    /// Any channel, and private messages.
    Any,
}

/// How the verb is spotted in a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrefixPolicy {
    /// `!verb`. In a private message the prefix may be left off.
    Prefixed,
    /// `botnick: verb`.
    Nickname,
    /// `verb`, no prefix at all.
    Direct,
}

/// One registered command.
#[derive(Debug)]
pub struct CommandSpec {
    pub verb: &'static str,
    pub usage: &'static str,
    /// Fewer arguments than this gets the usage line instead of a run.
    pub min_args: usize,
    pub permission: Permission,
    pub channels: ChannelPolicy,
    pub prefix: PrefixPolicy,
    /// Higher runs first.
    pub priority: i16,
    /// Whether lower-priority handlers for the same message still run.
    pub chainable: bool,
    pub run: CommandFn,
}

impl CommandSpec {
    const fn admin(
        verb: &'static str,
        usage: &'static str,
        min_args: usize,
        permission: Permission,
        run: CommandFn,
    ) -> Self {
        Self {
            verb,
            usage,
            min_args,
            permission,
            channels: ChannelPolicy::Any,
            prefix: PrefixPolicy::Prefixed,
            priority: 0,
            chainable: false,
            run,
        }
    }
}

const CLASS_USAGE: &str = "{add|del|list} [account|nickname] [channel]";

/// Every admin command.
pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec::admin(
        "home",
        "home {add|del|list} [channel]",
        1,
        Permission::Operator,
        channels::home,
    ),
    CommandSpec::admin(
        "guest",
        "guest {add|del|list} [channel]",
        1,
        Permission::Operator,
        channels::guest,
    ),
    CommandSpec::admin("join", "join [channel] [key]", 0, Permission::Operator, channels::join),
    CommandSpec::admin("part", "part [channel] [reason]", 0, Permission::Operator, channels::part),
    CommandSpec::admin(
        "cycle",
        "cycle [channel] [delay] [key]",
        0,
        Permission::Operator,
        channels::cycle,
    ),
    CommandSpec::admin("whitelist", CLASS_USAGE, 1, Permission::Operator, classify::classify),
    CommandSpec::admin("elevated", CLASS_USAGE, 1, Permission::Operator, classify::classify),
    CommandSpec::admin("blacklist", CLASS_USAGE, 1, Permission::Operator, classify::classify),
    CommandSpec::admin("operator", CLASS_USAGE, 1, Permission::Staff, classify::classify),
    CommandSpec::admin("staff", CLASS_USAGE, 1, Permission::Admin, classify::classify),
    CommandSpec::admin(
        "hostmask",
        "hostmask {add account mask | del mask | list}",
        1,
        Permission::Admin,
        hostmask::hostmask,
    ),
    CommandSpec::admin("save", "save", 0, Permission::Admin, lifecycle::save),
    CommandSpec::admin("reload", "reload [plugin]", 0, Permission::Admin, lifecycle::reload),
    CommandSpec::admin(
        "reconnect",
        "reconnect [message]",
        0,
        Permission::Admin,
        lifecycle::reconnect,
    ),
    CommandSpec::admin("quit", "quit [message]", 0, Permission::Admin, lifecycle::quit),
    CommandSpec::admin("get", "get plugin[.setting]", 1, Permission::Admin, lifecycle::get),
    CommandSpec::admin("set", "set plugin.setting=value", 1, Permission::Admin, lifecycle::set),
    CommandSpec::admin("printraw", "printraw", 0, Permission::Admin, lifecycle::printraw),
    CommandSpec::admin("printbytes", "printbytes", 0, Permission::Admin, lifecycle::printbytes),
    CommandSpec::admin("status", "status", 0, Permission::Operator, lifecycle::status),
];
