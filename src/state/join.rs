//! Join confirmation state machine.
//!
//! Adding a channel moves through
//! `Validating -> Joining -> AwaitingConfirmation -> {Succeeded | Redirected | Failed}`.
//! The first two happen synchronously in the command handler. This module
//! owns the last step: classifying each delivered event against the channel
//! being waited on.

use slircbot_proto::{EventKind, IrcEvent, irc_eq};

/// Every event that can settle a join attempt.
pub const JOIN_INTEREST: [EventKind; 14] = [
    EventKind::SelfJoin,
    EventKind::ErrNoSuchChannel,
    EventKind::ErrTooManyChannels,
    EventKind::ErrTooManyTargets,
    EventKind::ErrUnavailResource,
    EventKind::ErrLinkChannel,
    EventKind::ErrChannelIsFull,
    EventKind::ErrInviteOnlyChan,
    EventKind::ErrBannedFromChan,
    EventKind::ErrBadChannelKey,
    EventKind::ErrBadChanMask,
    EventKind::ErrNeedReggedNick,
    EventKind::ErrSecureOnlyChan,
    EventKind::ErrOperOnly,
];

/// Why a join was refused.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinFailure {
    pub kind: EventKind,
    /// Server-supplied text, possibly empty.
    pub reason: String,
}

impl JoinFailure {
    /// Short human explanation.
    pub fn describe(&self) -> &'static str {
        match self.kind {
            EventKind::ErrNoSuchChannel => "no such channel",
            EventKind::ErrTooManyChannels => "joined too many channels",
            EventKind::ErrTooManyTargets => "too many targets",
            EventKind::ErrUnavailResource => "channel is temporarily unavailable",
            EventKind::ErrLinkChannel => "redirected without a target",
            EventKind::ErrChannelIsFull => "channel is full",
            EventKind::ErrInviteOnlyChan => "channel is invite only",
            EventKind::ErrBannedFromChan => "banned from channel",
            EventKind::ErrBadChannelKey => "wrong channel key",
            EventKind::ErrBadChanMask => "bad channel mask",
            EventKind::ErrNeedReggedNick => "registered users only",
            EventKind::ErrSecureOnlyChan => "secure connections only",
            EventKind::ErrOperOnly => "IRC operators only",
            _ => "join refused",
        }
    }
}

/// What one delivered event means for the join of a channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JoinStep {
    /// Not about this channel; keep waiting.
    Ignore,
    Succeeded,
    /// The server forwarded us; keep waiting for the new channel.
    Redirected { to: String },
    Failed(JoinFailure),
}

/// Classify `event` against the join of `target`.
pub fn step(target: &str, event: &IrcEvent) -> JoinStep {
    let about_target = event
        .channel
        .as_deref()
        .is_some_and(|channel| irc_eq(channel, target));
    if !about_target {
        return JoinStep::Ignore;
    }

    match event.kind {
        EventKind::SelfJoin => JoinStep::Succeeded,
        EventKind::ErrLinkChannel => match event.aux.first() {
            Some(to) if !to.is_empty() && !irc_eq(to, target) => {
                JoinStep::Redirected { to: to.clone() }
            }
            _ => JoinStep::Failed(failure(event)),
        },
        kind if JOIN_INTEREST.contains(&kind) => JoinStep::Failed(failure(event)),
        _ => JoinStep::Ignore,
    }
}

fn failure(event: &IrcEvent) -> JoinFailure {
    JoinFailure {
        kind: event.kind,
        reason: event.content.clone(),
    }
}
