//! Home and guest channel lists.
//!
//! A channel is on at most one of the two lists. Both lists compare names
//! with RFC 1459 case mapping but keep the spelling they were added with.

use crate::store::{StoreError, read_json, write_json};
use serde::{Deserialize, Serialize};
use slircbot_proto::irc_eq;
use std::fmt;
use std::path::Path;

/// Which list a channel belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelRole {
    Home,
    Guest,
}

impl ChannelRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Guest => "guest",
        }
    }
}

impl fmt::Display for ChannelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of [`ChannelMembership::add`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddChannelOutcome {
    Added,
    AlreadyPresent,
    /// Adding as guest a channel that is already home.
    AlreadyHome,
    /// Adding as home a channel that was a guest; it left the guest list.
    Promoted,
}

/// The bot's channel lists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMembership {
    #[serde(default)]
    home: Vec<String>,
    #[serde(default)]
    guest: Vec<String>,
}

impl ChannelMembership {
    pub fn new(home: Vec<String>, guest: Vec<String>) -> Self {
        Self { home, guest }
    }

    /// Lists saved in `path`, or `fallback` if nothing was saved yet.
    pub fn load(path: &Path, fallback: Self) -> Result<Self, StoreError> {
        Ok(read_json(path)?.unwrap_or(fallback))
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        write_json(path, self)
    }

    fn list_mut(&mut self, role: ChannelRole) -> &mut Vec<String> {
        match role {
            ChannelRole::Home => &mut self.home,
            ChannelRole::Guest => &mut self.guest,
        }
    }

    pub fn list(&self, role: ChannelRole) -> &[String] {
        match role {
            ChannelRole::Home => &self.home,
            ChannelRole::Guest => &self.guest,
        }
    }

    pub fn contains(&self, role: ChannelRole, channel: &str) -> bool {
        self.list(role).iter().any(|c| irc_eq(c, channel))
    }

    /// Role of `channel`, if it is on either list.
    #[cfg(test)]
    pub fn role_of(&self, channel: &str) -> Option<ChannelRole> {
        [ChannelRole::Home, ChannelRole::Guest]
            .into_iter()
            .find(|role| self.contains(*role, channel))
    }

    pub fn add(&mut self, role: ChannelRole, channel: &str) -> AddChannelOutcome {
        if self.contains(role, channel) {
            return AddChannelOutcome::AlreadyPresent;
        }
        let outcome = match role {
            ChannelRole::Guest if self.contains(ChannelRole::Home, channel) => {
                return AddChannelOutcome::AlreadyHome;
            }
            ChannelRole::Home if self.remove(ChannelRole::Guest, channel) => {
                AddChannelOutcome::Promoted
            }
            _ => AddChannelOutcome::Added,
        };
        self.list_mut(role).push(channel.to_string());
        outcome
    }

    /// Remove `channel` from the list; `false` if it was not there.
    pub fn remove(&mut self, role: ChannelRole, channel: &str) -> bool {
        let list = self.list_mut(role);
        let before = list.len();
        list.retain(|c| !irc_eq(c, channel));
        list.len() != before
    }

    /// Every channel the bot should sit in, home first.
    pub fn all(&self) -> impl Iterator<Item = &str> {
        self.home.iter().chain(&self.guest).map(String::as_str)
    }
}
