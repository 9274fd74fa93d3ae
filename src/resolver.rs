//! Turning a user-supplied nickname into an account.

use crate::outbound::Outbound;
use crate::state::BotState;
use crate::suspend::Suspender;
use async_trait::async_trait;
use slircbot_proto::{EventKind, NickExt, irc_eq};
use std::sync::Arc;
use tracing::debug;

/// External account-resolution capability.
///
/// One call, one answer: `Some(account)` on success, `None` on failure.
#[async_trait]
pub trait AccountLookup: Send + Sync {
    async fn lookup(&self, nickname: &str) -> Option<String>;
}

/// Replies that settle a WHOIS.
pub const WHOIS_INTEREST: [EventKind; 3] = [
    EventKind::WhoisAccount,
    EventKind::EndOfWhois,
    EventKind::NoSuchNick,
];

/// Resolves accounts with `WHOIS nick nick`.
pub struct WhoisLookup {
    suspender: Suspender,
    outbound: Arc<dyn Outbound>,
}

impl WhoisLookup {
    pub fn new(suspender: Suspender, outbound: Arc<dyn Outbound>) -> Self {
        Self {
            suspender,
            outbound,
        }
    }
}

#[async_trait]
impl AccountLookup for WhoisLookup {
    async fn lookup(&self, nickname: &str) -> Option<String> {
        let mut waiter = self.suspender.register(&WHOIS_INTEREST, "whois");
        self.outbound.send_raw(format!("WHOIS {nickname} {nickname}"));

        let reply = waiter
            .next_matching(|event| {
                event
                    .target
                    .nickname
                    .as_deref()
                    .is_some_and(|target| irc_eq(target, nickname))
            })
            .await;

        match reply {
            Ok(event) if event.kind == EventKind::WhoisAccount => event.target.account,
            Ok(event) => {
                debug!(nickname, reply = %event.kind, "WHOIS found no account");
                None
            }
            Err(e) => {
                debug!(nickname, error = %e, "WHOIS abandoned");
                None
            }
        }
    }
}

/// How an identifier was resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Already known this session (account, or hostmask store match).
    Known(String),
    /// Confirmed by the lookup capability.
    Resolved(String),
    /// The lookup failed; the literal string stands in as the identifier.
    Unverified(String),
    /// Not a syntactically valid nickname, and not known.
    InvalidNickname,
}

impl Resolution {
    pub fn account(&self) -> Option<&str> {
        match self {
            Self::Known(a) | Self::Resolved(a) | Self::Unverified(a) => Some(a),
            Self::InvalidNickname => None,
        }
    }
}

/// Account already known for `nickname`, without any network round-trip.
pub fn known_account(state: &BotState, nickname: &str) -> Option<String> {
    if let Some(account) = state.session.account_of(nickname) {
        return Some(account);
    }
    let hostmask = state.session.hostmask_of(nickname)?;
    state
        .hostmasks
        .lock()
        .account_for(&hostmask)
        .map(str::to_string)
}

/// Resolve `specified` to an account.
///
/// Unresolvable nicknames fall back to the literal string. That admits
/// identifiers no service has vouched for, which is accepted.
pub async fn resolve(state: &BotState, specified: &str) -> Resolution {
    if let Some(account) = known_account(state, specified) {
        return Resolution::Known(account);
    }
    if !specified.is_valid_nick() {
        return Resolution::InvalidNickname;
    }
    match state.lookup.lookup(specified).await {
        Some(account) => Resolution::Resolved(account),
        None => Resolution::Unverified(specified.to_string()),
    }
}
