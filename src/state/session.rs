//! What the bot has learned during this connection.
//!
//! Users are keyed by case-mapped nickname. Knowledge comes only from
//! inbound events; nothing here is persisted.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use slircbot_proto::{EventKind, IrcEvent, irc_to_lower};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::trace;

/// A user seen on the network.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KnownUser {
    pub nickname: String,
    pub account: Option<String>,
    pub hostmask: Option<String>,
}

/// Result of a settings write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettingUpdate {
    Updated { previous: String },
    UnknownSetting,
}

/// Connection-scoped knowledge and runtime toggles.
#[derive(Debug)]
pub struct Session {
    users: DashMap<String, KnownUser>,
    settings: Mutex<BTreeMap<String, String>>,
    printraw: AtomicBool,
    printbytes: AtomicBool,
    started: DateTime<Utc>,
}

impl Session {
    pub fn new(settings: BTreeMap<String, String>, printraw: bool, printbytes: bool) -> Self {
        Self {
            users: DashMap::new(),
            settings: Mutex::new(settings),
            printraw: AtomicBool::new(printraw),
            printbytes: AtomicBool::new(printbytes),
            started: Utc::now(),
        }
    }

    /// Learn from one inbound event.
    pub fn observe(&self, event: &IrcEvent) {
        match event.kind {
            EventKind::Quit => {
                self.users.remove(&irc_to_lower(&event.sender.nickname));
            }
            EventKind::Nick => {
                let old = irc_to_lower(&event.sender.nickname);
                let new_nick = event.content.trim();
                if new_nick.is_empty() {
                    return;
                }
                if let Some((_, mut user)) = self.users.remove(&old) {
                    user.nickname = new_nick.to_string();
                    user.hostmask = None;
                    self.users.insert(irc_to_lower(new_nick), user);
                }
            }
            EventKind::Account => {
                let account = match event.content.trim() {
                    "" | "*" => None,
                    name => Some(name.to_string()),
                };
                self.remember(event).account = account;
            }
            EventKind::WhoisAccount => {
                if let (Some(nick), Some(account)) = (&event.target.nickname, &event.target.account)
                {
                    self.users
                        .entry(irc_to_lower(nick))
                        .or_insert_with(|| KnownUser {
                            nickname: nick.clone(),
                            ..KnownUser::default()
                        })
                        .account = Some(account.clone());
                }
            }
            _ => {
                if !event.sender.nickname.is_empty() {
                    let mut user = self.remember(event);
                    if let Some(account) = &event.sender.account {
                        user.account = Some(account.clone());
                    }
                }
            }
        }
    }

    fn remember(&self, event: &IrcEvent) -> dashmap::mapref::one::RefMut<'_, String, KnownUser> {
        let sender = &event.sender;
        let mut user = self
            .users
            .entry(irc_to_lower(&sender.nickname))
            .or_insert_with(|| KnownUser {
                nickname: sender.nickname.clone(),
                ..KnownUser::default()
            });
        if let Some(mask) = sender.hostmask() {
            trace!(nickname = %sender.nickname, hostmask = %mask, "Learned hostmask");
            user.hostmask = Some(mask);
        }
        user
    }

    pub fn user(&self, nickname: &str) -> Option<KnownUser> {
        self.users.get(&irc_to_lower(nickname)).map(|u| u.clone())
    }

    pub fn account_of(&self, nickname: &str) -> Option<String> {
        self.user(nickname).and_then(|u| u.account)
    }

    pub fn hostmask_of(&self, nickname: &str) -> Option<String> {
        self.user(nickname).and_then(|u| u.hostmask)
    }

    pub fn known_users(&self) -> usize {
        self.users.len()
    }

    /// Value of `plugin.setting`.
    pub fn setting(&self, key: &str) -> Option<String> {
        self.settings.lock().get(key).cloned()
    }

    /// Every setting of `plugin`, as `(setting, value)`.
    pub fn plugin_settings(&self, plugin: &str) -> Vec<(String, String)> {
        let prefix = format!("{plugin}.");
        self.settings
            .lock()
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(&prefix)
                    .map(|name| (name.to_string(), value.clone()))
            })
            .collect()
    }

    /// Overwrite an existing setting. Unknown settings are not created.
    pub fn set_setting(&self, key: &str, value: &str) -> SettingUpdate {
        match self.settings.lock().get_mut(key) {
            Some(slot) => SettingUpdate::Updated {
                previous: std::mem::replace(slot, value.to_string()),
            },
            None => SettingUpdate::UnknownSetting,
        }
    }

    pub fn printraw(&self) -> bool {
        self.printraw.load(Ordering::Relaxed)
    }

    pub fn printbytes(&self) -> bool {
        self.printbytes.load(Ordering::Relaxed)
    }

    /// Flip `printraw`, returning the new value.
    pub fn toggle_printraw(&self) -> bool {
        !self.printraw.fetch_xor(true, Ordering::Relaxed)
    }

    /// Flip `printbytes`, returning the new value.
    pub fn toggle_printbytes(&self) -> bool {
        !self.printbytes.fetch_xor(true, Ordering::Relaxed)
    }

    pub fn started(&self) -> DateTime<Utc> {
        self.started
    }
}
