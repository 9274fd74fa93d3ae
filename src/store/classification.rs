//! Classification store: which accounts hold which class in which channel.
//!
//! On disk this is `users.json`:
//!
//! ```json
//! {
//!   "whitelist": { "#straylight": ["case", "molly"] },
//!   "blacklist": { "<#channel>": ["<account>"] }
//! }
//! ```
//!
//! Placeholders document the shape for people editing the file by hand. A
//! class with no channels holds a single [`PLACEHOLDER_CHANNEL`] bucket, and
//! a channel bucket with no accounts holds a single [`PLACEHOLDER_ACCOUNT`].
//! The store inserts and drops them itself; callers never see them.

use super::{StoreError, read_json, write_json};
use slircbot_proto::irc_to_lower;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

/// Channel key standing in for "no channels yet".
pub const PLACEHOLDER_CHANNEL: &str = "<#channel>";
/// Account entry standing in for "no accounts yet".
pub const PLACEHOLDER_ACCOUNT: &str = "<account>";

/// Permission class an account can be listed under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Class {
    Admin,
    Staff,
    Operator,
    Elevated,
    Whitelist,
    Registered,
    Blacklist,
}

impl Class {
    /// Every class, in file order.
    pub const ALL: [Class; 7] = [
        Class::Admin,
        Class::Staff,
        Class::Operator,
        Class::Elevated,
        Class::Whitelist,
        Class::Registered,
        Class::Blacklist,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Staff => "staff",
            Self::Operator => "operator",
            Self::Elevated => "elevated",
            Self::Whitelist => "whitelist",
            Self::Registered => "registered",
            Self::Blacklist => "blacklist",
        }
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Class {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Class::ALL
            .into_iter()
            .find(|class| class.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

/// Result of [`ClassificationStore::alter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlterOutcome {
    Success,
    /// Add of an account already listed.
    AlreadyInList,
    /// Remove from a bucket that lacks the account.
    NoSuchAccount,
    /// Remove from a (class, channel) bucket that does not exist.
    NoSuchChannel,
}

type Buckets = BTreeMap<String, Vec<String>>;

/// Durable `{class, channel} -> accounts` mapping.
#[derive(Debug)]
pub struct ClassificationStore {
    path: PathBuf,
    classes: BTreeMap<String, Buckets>,
}

impl ClassificationStore {
    /// Load the store from `path`, creating a placeholder file if absent.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let mut store = Self {
            path,
            classes: BTreeMap::new(),
        };
        let existed = store.read()?;
        if !existed {
            info!(path = %store.path.display(), "Creating classification store");
            store.save()?;
        }
        Ok(store)
    }

    /// Re-read the backing file, discarding the in-memory view.
    pub fn reload(&mut self) -> Result<(), StoreError> {
        self.read()?;
        debug!(path = %self.path.display(), "Classification store reloaded");
        Ok(())
    }

    fn read(&mut self) -> Result<bool, StoreError> {
        let loaded: Option<BTreeMap<String, Buckets>> = read_json(&self.path)?;
        let existed = loaded.is_some();
        self.classes = loaded
            .unwrap_or_default()
            .into_iter()
            .map(|(class, buckets)| (class, fold_channel_keys(buckets)))
            .collect();
        self.seed_placeholders();
        Ok(existed)
    }

    fn seed_placeholders(&mut self) {
        for class in Class::ALL {
            let buckets = self.classes.entry(class.as_str().to_string()).or_default();
            if buckets.is_empty() {
                buckets.insert(
                    PLACEHOLDER_CHANNEL.to_string(),
                    vec![PLACEHOLDER_ACCOUNT.to_string()],
                );
            }
        }
        for buckets in self.classes.values_mut() {
            for accounts in buckets.values_mut() {
                if accounts.is_empty() {
                    accounts.push(PLACEHOLDER_ACCOUNT.to_string());
                }
            }
        }
    }

    /// Persist the whole store.
    pub fn save(&self) -> Result<(), StoreError> {
        write_json(&self.path, &self.classes)
    }

    /// Backing file.
    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Add or remove `account` under `(class, channel)`.
    ///
    /// The change is applied to a copy and only becomes visible once it is
    /// on disk; a failed write leaves the store as it was.
    pub fn alter(
        &mut self,
        add: bool,
        class: Class,
        account: &str,
        channel: &str,
    ) -> Result<AlterOutcome, StoreError> {
        let mut next = self.classes.clone();
        let outcome = apply(&mut next, add, class, account, &irc_to_lower(channel));
        if outcome != AlterOutcome::Success {
            return Ok(outcome);
        }

        self.commit(next)?;
        info!(
            class = %class,
            account = %account,
            channel = %channel,
            add,
            "Classification changed"
        );
        Ok(outcome)
    }

    /// Put `account` in `class` for `channel` and take it out of every other
    /// class there, as a single write. Returns the outcome of the add and the
    /// classes the account left.
    pub fn enlist(
        &mut self,
        class: Class,
        account: &str,
        channel: &str,
    ) -> Result<(AlterOutcome, Vec<Class>), StoreError> {
        let key = irc_to_lower(channel);
        let mut next = self.classes.clone();
        let left: Vec<Class> = Class::ALL
            .into_iter()
            .filter(|other| *other != class)
            .filter(|other| apply(&mut next, false, *other, account, &key) == AlterOutcome::Success)
            .collect();
        let outcome = apply(&mut next, true, class, account, &key);
        if outcome != AlterOutcome::Success && left.is_empty() {
            return Ok((outcome, left));
        }

        self.commit(next)?;
        info!(
            class = %class,
            account = %account,
            channel = %channel,
            left = ?left,
            "Account enlisted"
        );
        Ok((outcome, left))
    }

    fn commit(&mut self, next: BTreeMap<String, Buckets>) -> Result<(), StoreError> {
        write_json(&self.path, &next)?;
        self.classes = next;
        Ok(())
    }

    /// Accounts listed under `(class, channel)`.
    pub fn list(&self, class: Class, channel: &str) -> Vec<String> {
        self.classes
            .get(class.as_str())
            .and_then(|buckets| buckets.get(&irc_to_lower(channel)))
            .map(|accounts| {
                accounts
                    .iter()
                    .filter(|a| *a != PLACEHOLDER_ACCOUNT)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether `account` is listed under `(class, channel)`.
    pub fn contains(&self, class: Class, account: &str, channel: &str) -> bool {
        self.list(class, channel).iter().any(|a| a == account)
    }

    /// Every class `account` holds in `channel`.
    pub fn classes_of(&self, account: &str, channel: &str) -> Vec<Class> {
        Class::ALL
            .into_iter()
            .filter(|class| self.contains(*class, account, channel))
            .collect()
    }

    /// Every real `(class, channel, account)` entry, placeholders excluded.
    ///
    /// Classes not known to [`Class`] are kept on disk but not yielded here.
    #[cfg(test)]
    pub fn entries(&self) -> Vec<(Class, String, String)> {
        let mut out = Vec::new();
        for class in Class::ALL {
            let Some(buckets) = self.classes.get(class.as_str()) else {
                continue;
            };
            for (channel, accounts) in buckets {
                if channel == PLACEHOLDER_CHANNEL {
                    continue;
                }
                for account in accounts.iter().filter(|a| *a != PLACEHOLDER_ACCOUNT) {
                    out.push((class, channel.clone(), account.clone()));
                }
            }
        }
        out
    }
}

fn apply(
    classes: &mut BTreeMap<String, Buckets>,
    add: bool,
    class: Class,
    account: &str,
    key: &str,
) -> AlterOutcome {
    if add {
        let buckets = classes.entry(class.as_str().to_string()).or_default();
        let accounts = buckets.entry(key.to_string()).or_default();
        if accounts.iter().any(|a| a == account) {
            return AlterOutcome::AlreadyInList;
        }
        accounts.retain(|a| a != PLACEHOLDER_ACCOUNT);
        accounts.push(account.to_string());
        buckets.remove(PLACEHOLDER_CHANNEL);
        return AlterOutcome::Success;
    }

    let Some(accounts) = classes
        .get_mut(class.as_str())
        .and_then(|buckets| buckets.get_mut(key))
    else {
        return AlterOutcome::NoSuchChannel;
    };
    let Some(pos) = accounts.iter().position(|a| a == account) else {
        return AlterOutcome::NoSuchAccount;
    };
    accounts.remove(pos);
    if accounts.is_empty() {
        accounts.push(PLACEHOLDER_ACCOUNT.to_string());
    }
    AlterOutcome::Success
}

/// Fold hand-written channel keys onto their case-mapped form, merging
/// buckets that collide.
fn fold_channel_keys(buckets: Buckets) -> Buckets {
    let mut folded = Buckets::new();
    for (channel, accounts) in buckets {
        let key = if channel == PLACEHOLDER_CHANNEL {
            channel
        } else {
            irc_to_lower(&channel)
        };
        let merged: &mut Vec<String> = folded.entry(key).or_default();
        for account in accounts {
            if !merged.contains(&account) {
                merged.push(account);
            }
        }
    }
    for accounts in folded.values_mut() {
        if accounts.len() > 1 {
            accounts.retain(|a| a != PLACEHOLDER_ACCOUNT);
        }
    }
    folded
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::tempdir;

    fn store_in(dir: &tempfile::TempDir) -> ClassificationStore {
        ClassificationStore::load(dir.path().join("users.json")).unwrap()
    }

    #[test]
    fn fresh_store_writes_placeholder_file() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.path().exists());
        assert!(store.entries().is_empty());

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["whitelist"][PLACEHOLDER_CHANNEL][0], PLACEHOLDER_ACCOUNT);
    }

    #[test]
    fn add_twice_reports_already() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        assert_eq!(
            store.alter(true, Class::Whitelist, "case", "#sprawl").unwrap(),
            AlterOutcome::Success
        );
        assert_eq!(
            store.alter(true, Class::Whitelist, "case", "#sprawl").unwrap(),
            AlterOutcome::AlreadyInList
        );
        assert_eq!(store.list(Class::Whitelist, "#sprawl"), vec!["case".to_string()]);
    }

    #[test]
    fn remove_reports_missing_bucket_then_missing_account() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        assert_eq!(
            store.alter(false, Class::Staff, "case", "#sprawl").unwrap(),
            AlterOutcome::NoSuchChannel
        );

        store.alter(true, Class::Staff, "case", "#sprawl").unwrap();
        assert_eq!(
            store.alter(false, Class::Staff, "case", "#sprawl").unwrap(),
            AlterOutcome::Success
        );
        assert_eq!(
            store.alter(false, Class::Staff, "case", "#sprawl").unwrap(),
            AlterOutcome::NoSuchAccount
        );
        assert!(store.list(Class::Staff, "#sprawl").is_empty());
    }

    #[test]
    fn placeholders_come_and_go_with_real_entries() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);

        store.alter(true, Class::Operator, "molly", "#Sprawl").unwrap();
        let buckets = &store.classes["operator"];
        assert!(!buckets.contains_key(PLACEHOLDER_CHANNEL));
        assert_eq!(buckets["#sprawl"], vec!["molly".to_string()]);

        store.alter(false, Class::Operator, "molly", "#sprawl").unwrap();
        assert_eq!(
            store.classes["operator"]["#sprawl"],
            vec![PLACEHOLDER_ACCOUNT.to_string()]
        );

        store.alter(true, Class::Operator, "riviera", "#sprawl").unwrap();
        assert_eq!(
            store.classes["operator"]["#sprawl"],
            vec!["riviera".to_string()]
        );
    }

    #[test]
    fn channel_keys_are_case_insensitive() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        store.alter(true, Class::Elevated, "armitage", "#Chiba[City]").unwrap();
        assert!(store.contains(Class::Elevated, "armitage", "#chiba{city}"));
        assert_eq!(store.classes_of("armitage", "#CHIBA[CITY]"), vec![Class::Elevated]);
    }

    #[test]
    fn persist_then_reload_round_trips() {
        let dir = tempdir().unwrap();
        let tuples = [
            (Class::Whitelist, "#sprawl", "case"),
            (Class::Whitelist, "#sprawl", "molly"),
            (Class::Blacklist, "#sprawl", "wage"),
            (Class::Staff, "#freeside", "3jane"),
            (Class::Admin, "#freeside", "wintermute"),
        ];

        let mut store = store_in(&dir);
        for (class, channel, account) in tuples {
            store.alter(true, class, account, channel).unwrap();
        }
        store.alter(true, Class::Registered, "temp", "#zion").unwrap();
        store.alter(false, Class::Registered, "temp", "#zion").unwrap();

        let reloaded = store_in(&dir);
        let got: BTreeSet<_> = reloaded.entries().into_iter().collect();
        let want: BTreeSet<_> = tuples
            .iter()
            .map(|(c, ch, a)| (*c, ch.to_string(), a.to_string()))
            .collect();
        assert_eq!(got, want);
    }

    #[test]
    fn reload_picks_up_external_edits() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        std::fs::write(
            store.path(),
            r##"{ "whitelist": { "#sprawl": ["dixie"] }, "custom": { "#x": [] } }"##,
        )
        .unwrap();
        store.reload().unwrap();
        assert_eq!(store.list(Class::Whitelist, "#sprawl"), vec!["dixie".to_string()]);
        assert_eq!(store.classes["custom"]["#x"], vec![PLACEHOLDER_ACCOUNT.to_string()]);
        assert!(store.classes["staff"].contains_key(PLACEHOLDER_CHANNEL));
    }

    #[test]
    fn hand_written_channel_keys_are_folded_on_read() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        std::fs::write(
            store.path(),
            r##"{ "whitelist": { "#Sprawl": ["dixie"], "#sprawl": ["case", "dixie"] } }"##,
        )
        .unwrap();
        store.reload().unwrap();
        assert_eq!(
            store.list(Class::Whitelist, "#SPRAWL"),
            vec!["dixie".to_string(), "case".to_string()]
        );
        assert_eq!(
            store.alter(false, Class::Whitelist, "dixie", "#Sprawl").unwrap(),
            AlterOutcome::Success
        );
        assert_eq!(store.list(Class::Whitelist, "#sprawl"), vec!["case".to_string()]);
    }

    #[test]
    fn failed_write_leaves_store_untouched() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        std::fs::remove_file(store.path()).unwrap();
        std::fs::create_dir(store.path()).unwrap();

        assert!(store.alter(true, Class::Whitelist, "case", "#sprawl").is_err());
        assert!(store.list(Class::Whitelist, "#sprawl").is_empty());
        assert!(store.classes["whitelist"].contains_key(PLACEHOLDER_CHANNEL));
    }

    #[test]
    fn enlist_moves_account_between_classes() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        store.alter(true, Class::Blacklist, "riviera", "#x").unwrap();
        store.alter(true, Class::Elevated, "riviera", "#x").unwrap();

        let (outcome, left) = store.enlist(Class::Whitelist, "riviera", "#X").unwrap();
        assert_eq!(outcome, AlterOutcome::Success);
        assert_eq!(left, vec![Class::Elevated, Class::Blacklist]);
        assert_eq!(store.classes_of("riviera", "#x"), vec![Class::Whitelist]);

        let (outcome, left) = store.enlist(Class::Whitelist, "riviera", "#x").unwrap();
        assert_eq!(outcome, AlterOutcome::AlreadyInList);
        assert!(left.is_empty());

        let reloaded = store_in(&dir);
        assert_eq!(reloaded.classes_of("riviera", "#x"), vec![Class::Whitelist]);
    }

    #[test]
    fn failed_enlist_keeps_previous_classes() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        store.alter(true, Class::Blacklist, "riviera", "#x").unwrap();
        std::fs::remove_file(store.path()).unwrap();
        std::fs::create_dir(store.path()).unwrap();

        assert!(store.enlist(Class::Whitelist, "riviera", "#x").is_err());
        assert_eq!(store.classes_of("riviera", "#x"), vec![Class::Blacklist]);
    }

    #[test]
    fn class_names_parse_case_insensitively() {
        assert_eq!("Whitelist".parse::<Class>(), Ok(Class::Whitelist));
        assert_eq!("BLACKLIST".parse::<Class>(), Ok(Class::Blacklist));
        assert!("friends".parse::<Class>().is_err());
    }
}
