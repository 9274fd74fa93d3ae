//! Inbound protocol events.
//!
//! The transport layer turns each server line into an [`IrcEvent`] tagged
//! with a closed [`EventKind`]. Everything downstream matches on the tag and
//! the channel; the remaining fields are payload for whoever handles it.

use std::fmt;

/// Event type tag.
///
/// Numeric replies carry their RFC 2812 / modern numeric (see
/// [`EventKind::numeric`]). Self-directed membership changes are split out
/// from other users' so awaits can name them directly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    /// Anything the transport could not classify.
    #[default]
    Unknown,
    /// Message to a channel.
    Chan,
    /// Private message to the bot.
    Query,
    /// Another user joined a channel.
    Join,
    /// The bot joined a channel.
    SelfJoin,
    /// Another user left a channel.
    Part,
    /// The bot left a channel.
    SelfPart,
    /// A user disconnected.
    Quit,
    /// A user changed nickname.
    Nick,
    /// A user logged in or out (`ACCOUNT`, IRCv3 account-notify).
    Account,

    /// 330 - WHOIS account line.
    WhoisAccount,
    /// 318 - end of WHOIS.
    EndOfWhois,
    /// 401 - no such nick/channel.
    NoSuchNick,

    /// 403 - no such channel.
    ErrNoSuchChannel,
    /// 405 - joined too many channels.
    ErrTooManyChannels,
    /// 407 - too many targets / duplicate join.
    ErrTooManyTargets,
    /// 437 - channel temporarily unavailable.
    ErrUnavailResource,
    /// 470 - forwarded to another channel.
    ErrLinkChannel,
    /// 471 - channel is full (+l).
    ErrChannelIsFull,
    /// 473 - invite only (+i).
    ErrInviteOnlyChan,
    /// 474 - banned (+b).
    ErrBannedFromChan,
    /// 475 - bad channel key (+k).
    ErrBadChannelKey,
    /// 476 - malformed channel mask.
    ErrBadChanMask,
    /// 477 - registered nicks only (+R).
    ErrNeedReggedNick,
    /// 489 - TLS only (+z).
    ErrSecureOnlyChan,
    /// 520 - IRC operators only (+O).
    ErrOperOnly,
}

impl EventKind {
    /// Map a numeric reply to its tag, if it is one we name.
    pub fn from_numeric(code: u16) -> Option<Self> {
        Some(match code {
            318 => Self::EndOfWhois,
            330 => Self::WhoisAccount,
            401 => Self::NoSuchNick,
            403 => Self::ErrNoSuchChannel,
            405 => Self::ErrTooManyChannels,
            407 => Self::ErrTooManyTargets,
            437 => Self::ErrUnavailResource,
            470 => Self::ErrLinkChannel,
            471 => Self::ErrChannelIsFull,
            473 => Self::ErrInviteOnlyChan,
            474 => Self::ErrBannedFromChan,
            475 => Self::ErrBadChannelKey,
            476 => Self::ErrBadChanMask,
            477 => Self::ErrNeedReggedNick,
            489 => Self::ErrSecureOnlyChan,
            520 => Self::ErrOperOnly,
            _ => return None,
        })
    }

    /// The numeric for reply tags, `None` for command-derived tags.
    pub fn numeric(self) -> Option<u16> {
        Some(match self {
            Self::EndOfWhois => 318,
            Self::WhoisAccount => 330,
            Self::NoSuchNick => 401,
            Self::ErrNoSuchChannel => 403,
            Self::ErrTooManyChannels => 405,
            Self::ErrTooManyTargets => 407,
            Self::ErrUnavailResource => 437,
            Self::ErrLinkChannel => 470,
            Self::ErrChannelIsFull => 471,
            Self::ErrInviteOnlyChan => 473,
            Self::ErrBannedFromChan => 474,
            Self::ErrBadChannelKey => 475,
            Self::ErrBadChanMask => 476,
            Self::ErrNeedReggedNick => 477,
            Self::ErrSecureOnlyChan => 489,
            Self::ErrOperOnly => 520,
            _ => return None,
        })
    }

    /// Upper-case tag name, used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Chan => "CHAN",
            Self::Query => "QUERY",
            Self::Join => "JOIN",
            Self::SelfJoin => "SELFJOIN",
            Self::Part => "PART",
            Self::SelfPart => "SELFPART",
            Self::Quit => "QUIT",
            Self::Nick => "NICK",
            Self::Account => "ACCOUNT",
            Self::WhoisAccount => "RPL_WHOISACCOUNT",
            Self::EndOfWhois => "RPL_ENDOFWHOIS",
            Self::NoSuchNick => "ERR_NOSUCHNICK",
            Self::ErrNoSuchChannel => "ERR_NOSUCHCHANNEL",
            Self::ErrTooManyChannels => "ERR_TOOMANYCHANNELS",
            Self::ErrTooManyTargets => "ERR_TOOMANYTARGETS",
            Self::ErrUnavailResource => "ERR_UNAVAILRESOURCE",
            Self::ErrLinkChannel => "ERR_LINKCHANNEL",
            Self::ErrChannelIsFull => "ERR_CHANNELISFULL",
            Self::ErrInviteOnlyChan => "ERR_INVITEONLYCHAN",
            Self::ErrBannedFromChan => "ERR_BANNEDFROMCHAN",
            Self::ErrBadChannelKey => "ERR_BADCHANNELKEY",
            Self::ErrBadChanMask => "ERR_BADCHANMASK",
            Self::ErrNeedReggedNick => "ERR_NEEDREGGEDNICK",
            Self::ErrSecureOnlyChan => "ERR_SECUREONLYCHAN",
            Self::ErrOperOnly => "ERR_OPERONLY",
        }
    }

    /// Whether this is a chat message that may carry a command.
    pub fn is_message(self) -> bool {
        matches!(self, Self::Chan | Self::Query)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who sent an event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EventSender {
    /// Nickname (empty for server-originated events).
    pub nickname: String,
    /// Ident, when the prefix carried one.
    pub ident: String,
    /// Address, when the prefix carried one.
    pub address: String,
    /// Services account, when known from tags or account-notify.
    pub account: Option<String>,
}

impl EventSender {
    /// Full `nickname!ident@address`, when all three parts are known.
    pub fn hostmask(&self) -> Option<String> {
        if self.nickname.is_empty() || self.ident.is_empty() || self.address.is_empty() {
            return None;
        }
        Some(format!("{}!{}@{}", self.nickname, self.ident, self.address))
    }
}

/// The user a reply is about (WHOIS numerics, ERR_NOSUCHNICK).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EventTarget {
    /// Nickname the reply concerns.
    pub nickname: Option<String>,
    /// Account the reply reports.
    pub account: Option<String>,
}

/// One inbound protocol event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct IrcEvent {
    /// Type tag.
    pub kind: EventKind,
    /// Channel the event concerns, if any.
    pub channel: Option<String>,
    /// Originating user.
    pub sender: EventSender,
    /// User the event is about, for replies.
    pub target: EventTarget,
    /// Free-text content (message body, reason, numeric trailing).
    pub content: String,
    /// Remaining positional fields (e.g. the forward target of 470).
    pub aux: Vec<String>,
    /// The raw line as received.
    pub raw: String,
}

impl IrcEvent {
    /// A bare event of the given kind.
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Set the channel.
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// Set the sender from its prefix parts.
    pub fn with_sender(
        mut self,
        nickname: impl Into<String>,
        ident: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        self.sender.nickname = nickname.into();
        self.sender.ident = ident.into();
        self.sender.address = address.into();
        self
    }

    /// Set the sender's account.
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.sender.account = Some(account.into());
        self
    }

    /// Set the nickname a reply concerns.
    pub fn with_target(mut self, nickname: impl Into<String>, account: Option<&str>) -> Self {
        self.target.nickname = Some(nickname.into());
        self.target.account = account.map(str::to_string);
        self
    }

    /// Set the content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Append a positional field.
    pub fn with_aux(mut self, field: impl Into<String>) -> Self {
        self.aux.push(field.into());
        self
    }

    /// Set the raw line.
    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = raw.into();
        self
    }
}
