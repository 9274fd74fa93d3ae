//! Hostmask patterns.
//!
//! A hostmask identifies a user by `nickname!ident@address`. Patterns used
//! for account mapping may carry `*` and `?` wildcards in any part.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Reasons a string is not a hostmask.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostmaskError {
    /// Nothing to parse.
    #[error("empty hostmask")]
    Empty,
    /// No `!` separating nickname from ident.
    #[error("hostmask is missing '!'")]
    MissingBang,
    /// No `@` separating ident from address.
    #[error("hostmask is missing '@'")]
    MissingAt,
    /// One of the three parts is empty.
    #[error("hostmask {0} part is empty")]
    EmptyPart(&'static str),
    /// Whitespace, control characters, or a stray separator.
    #[error("hostmask contains invalid character {0:?}")]
    InvalidChar(char),
}

/// A parsed `nickname!ident@address` pattern.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Hostmask {
    /// Nickname part.
    pub nickname: String,
    /// Ident (username) part.
    pub ident: String,
    /// Address (hostname) part.
    pub address: String,
}

impl Hostmask {
    /// Build a hostmask from its three parts without validation.
    pub fn new(
        nickname: impl Into<String>,
        ident: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            nickname: nickname.into(),
            ident: ident.into(),
            address: address.into(),
        }
    }

    /// Parse and validate a hostmask pattern.
    pub fn parse(s: &str) -> Result<Self, HostmaskError> {
        if s.is_empty() {
            return Err(HostmaskError::Empty);
        }
        if let Some(bad) = s.chars().find(|c| c.is_whitespace() || c.is_control()) {
            return Err(HostmaskError::InvalidChar(bad));
        }

        let (nickname, rest) = s.split_once('!').ok_or(HostmaskError::MissingBang)?;
        let (ident, address) = rest.split_once('@').ok_or(HostmaskError::MissingAt)?;

        if nickname.contains('@') {
            return Err(HostmaskError::InvalidChar('@'));
        }
        if ident.contains('!') || address.contains('!') {
            return Err(HostmaskError::InvalidChar('!'));
        }
        if address.contains('@') {
            return Err(HostmaskError::InvalidChar('@'));
        }

        for (name, part) in [("nickname", nickname), ("ident", ident), ("address", address)] {
            if part.is_empty() {
                return Err(HostmaskError::EmptyPart(name));
            }
        }

        Ok(Self::new(nickname, ident, address))
    }

    /// Whether the pattern contains `*` or `?` anywhere.
    pub fn is_wildcard(&self) -> bool {
        [&self.nickname, &self.ident, &self.address]
            .iter()
            .any(|part| part.contains(['*', '?']))
    }
}

impl fmt::Display for Hostmask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}@{}", self.nickname, self.ident, self.address)
    }
}

impl FromStr for Hostmask {
    type Err = HostmaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
