//! Hostmask store: `nickname!ident@address` patterns mapped to accounts.
//!
//! Used on networks without services, where a hostmask is the closest thing
//! to an account. `hostmasks.json` is a flat object; while it has no real
//! entries it holds one [`PLACEHOLDER_MASK`] line showing the format.

use super::{StoreError, read_json, write_json};
use regex::{Regex, RegexBuilder};
use slircbot_proto::{Hostmask, HostmaskError};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, warn};

/// Key standing in for "no hostmasks yet".
pub const PLACEHOLDER_MASK: &str = "<nickname>!<ident>@<address>";
/// Value paired with [`PLACEHOLDER_MASK`].
pub const PLACEHOLDER_MASK_ACCOUNT: &str = "<account>";

/// Result of [`HostmaskStore::modify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaskOutcome {
    Added,
    /// The mask was already mapped; it now points at the new account.
    Replaced { previous: String },
    Removed,
    InvalidMask(HostmaskError),
    /// The mask is [`PLACEHOLDER_MASK`], which cannot be mapped.
    ReservedMask,
    NoSuchMask,
}

/// Durable hostmask → account mapping.
#[derive(Debug)]
pub struct HostmaskStore {
    path: PathBuf,
    masks: BTreeMap<String, String>,
    compiled: Vec<(Regex, String)>,
}

impl HostmaskStore {
    /// Load the store from `path`, creating a placeholder file if absent.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let mut store = Self {
            path: path.into(),
            masks: BTreeMap::new(),
            compiled: Vec::new(),
        };
        if !store.read()? {
            info!(path = %store.path.display(), "Creating hostmask store");
            store.save()?;
        }
        Ok(store)
    }

    /// Re-read the backing file, discarding the in-memory view.
    pub fn reload(&mut self) -> Result<(), StoreError> {
        self.read().map(|_| ())
    }

    fn read(&mut self) -> Result<bool, StoreError> {
        let loaded: Option<BTreeMap<String, String>> = read_json(&self.path)?;
        let existed = loaded.is_some();
        self.masks = loaded.unwrap_or_default();
        normalise_placeholder(&mut self.masks);
        self.recompile();
        Ok(existed)
    }

    fn recompile(&mut self) {
        self.compiled = self
            .masks
            .iter()
            .filter(|(mask, _)| mask.as_str() != PLACEHOLDER_MASK)
            .filter_map(|(mask, account)| match mask_regex(mask) {
                Ok(re) => Some((re, account.clone())),
                Err(e) => {
                    warn!(mask = %mask, error = %e, "Skipping unusable hostmask");
                    None
                }
            })
            .collect();
    }

    /// Persist the whole store.
    pub fn save(&self) -> Result<(), StoreError> {
        write_json(&self.path, &self.masks)
    }

    /// Backing file.
    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Add (`add == true`) a mapping from `mask` to `account`, or remove `mask`.
    ///
    /// `account` is ignored on removal. Nothing is mutated unless the outcome
    /// is `Added`, `Replaced` or `Removed`, and those are on disk before they
    /// become visible; a failed write leaves the store as it was.
    pub fn modify(
        &mut self,
        add: bool,
        account: &str,
        mask: &str,
    ) -> Result<MaskOutcome, StoreError> {
        if mask == PLACEHOLDER_MASK {
            return Ok(if add {
                MaskOutcome::ReservedMask
            } else {
                MaskOutcome::NoSuchMask
            });
        }

        let mut next = self.masks.clone();
        let outcome = if add {
            if let Err(e) = Hostmask::parse(mask) {
                return Ok(MaskOutcome::InvalidMask(e));
            }
            next.remove(PLACEHOLDER_MASK);
            match next.insert(mask.to_string(), account.to_string()) {
                Some(previous) => MaskOutcome::Replaced { previous },
                None => MaskOutcome::Added,
            }
        } else {
            if next.remove(mask).is_none() {
                return Ok(MaskOutcome::NoSuchMask);
            }
            normalise_placeholder(&mut next);
            MaskOutcome::Removed
        };

        write_json(&self.path, &next)?;
        self.masks = next;
        self.recompile();
        info!(mask = %mask, account = %account, add, "Hostmask definition changed");
        Ok(outcome)
    }

    /// Every real `(mask, account)` pair.
    pub fn list(&self) -> Vec<(String, String)> {
        self.masks
            .iter()
            .filter(|(mask, _)| mask.as_str() != PLACEHOLDER_MASK)
            .map(|(mask, account)| (mask.clone(), account.clone()))
            .collect()
    }

    /// Account of the first pattern matching a full `nick!ident@host`.
    pub fn account_for(&self, hostmask: &str) -> Option<&str> {
        self.compiled
            .iter()
            .find(|(re, _)| re.is_match(hostmask))
            .map(|(_, account)| account.as_str())
    }
}

/// Keep the placeholder exactly while there are no real masks.
fn normalise_placeholder(masks: &mut BTreeMap<String, String>) {
    if masks.keys().any(|mask| mask != PLACEHOLDER_MASK) {
        masks.remove(PLACEHOLDER_MASK);
    } else {
        masks.insert(
            PLACEHOLDER_MASK.to_string(),
            PLACEHOLDER_MASK_ACCOUNT.to_string(),
        );
    }
}

/// Compile a wildcard hostmask into an anchored case-insensitive regex.
fn mask_regex(mask: &str) -> Result<Regex, regex::Error> {
    let mut pattern = String::with_capacity(mask.len() + 8);
    pattern.push('^');
    let mut literal = [0u8; 4];
    for c in mask.chars() {
        match c {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            _ => pattern.push_str(&regex::escape(c.encode_utf8(&mut literal))),
        }
    }
    pattern.push('$');
    RegexBuilder::new(&pattern).case_insensitive(true).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(dir: &tempfile::TempDir) -> HostmaskStore {
        HostmaskStore::load(dir.path().join("hostmasks.json")).unwrap()
    }

    #[test]
    fn fresh_store_has_only_placeholder() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.list().is_empty());
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains(PLACEHOLDER_MASK));
    }

    #[test]
    fn add_drops_placeholder_and_overwrites() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        assert_eq!(
            store.modify(true, "case", "case!~c@chiba.city").unwrap(),
            MaskOutcome::Added
        );
        assert!(!store.masks.contains_key(PLACEHOLDER_MASK));
        assert_eq!(
            store.modify(true, "molly", "case!~c@chiba.city").unwrap(),
            MaskOutcome::Replaced {
                previous: "case".into()
            }
        );
        assert_eq!(
            store.list(),
            vec![("case!~c@chiba.city".to_string(), "molly".to_string())]
        );
    }

    #[test]
    fn invalid_mask_mutates_nothing() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        store.modify(true, "case", "case!~c@chiba.city").unwrap();
        let before = std::fs::read_to_string(store.path()).unwrap();

        let outcome = store.modify(true, "molly", "molly!razor").unwrap();
        assert_eq!(outcome, MaskOutcome::InvalidMask(HostmaskError::MissingAt));
        assert_eq!(store.list().len(), 1);
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), before);
    }

    #[test]
    fn remove_restores_placeholder_when_empty() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        store.modify(true, "case", "case!~c@chiba.city").unwrap();
        assert_eq!(
            store.modify(false, "", "case!~c@chiba.city").unwrap(),
            MaskOutcome::Removed
        );
        assert!(store.masks.contains_key(PLACEHOLDER_MASK));
        assert_eq!(
            store.modify(false, "", "case!~c@chiba.city").unwrap(),
            MaskOutcome::NoSuchMask
        );
        assert_eq!(
            store.modify(false, "", PLACEHOLDER_MASK).unwrap(),
            MaskOutcome::NoSuchMask
        );
    }

    #[test]
    fn placeholder_mask_cannot_be_mapped() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        assert_eq!(
            store.modify(true, "case", PLACEHOLDER_MASK).unwrap(),
            MaskOutcome::ReservedMask
        );
        assert_eq!(store.masks[PLACEHOLDER_MASK], PLACEHOLDER_MASK_ACCOUNT);
        assert!(store.list().is_empty());
    }

    #[test]
    fn failed_write_leaves_masks_untouched() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        store.modify(true, "case", "case!*@*").unwrap();
        std::fs::remove_file(store.path()).unwrap();
        std::fs::create_dir(store.path()).unwrap();

        assert!(store.modify(true, "molly", "molly!*@*").is_err());
        assert!(store.modify(false, "", "case!*@*").is_err());
        assert_eq!(store.list(), vec![("case!*@*".to_string(), "case".to_string())]);
        assert_eq!(store.account_for("molly!x@y"), None);
        assert_eq!(store.account_for("case!x@y"), Some("case"));
    }

    #[test]
    fn wildcards_match_case_insensitively() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        store.modify(true, "dixie", "*!*@*.Sense.Net").unwrap();
        store.modify(true, "finn", "f?nn!~finn@*").unwrap();

        assert_eq!(store.account_for("flatline!~d@rom.sense.net"), Some("dixie"));
        assert_eq!(store.account_for("FINN!~finn@loft"), Some("finn"));
        assert_eq!(store.account_for("finn!other@loft"), None);
        assert_eq!(store.account_for("x!y@sense.net.evil"), None);
    }

    #[test]
    fn literal_regex_characters_are_escaped() {
        let re = mask_regex("[nick]!id@host.net").unwrap();
        assert!(re.is_match("[nick]!id@host.net"));
        assert!(!re.is_match("n!id@hostxnet"));
    }

    #[test]
    fn reload_survives_round_trip() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        store.modify(true, "case", "case!*@*").unwrap();
        let reloaded = store_in(&dir);
        assert_eq!(reloaded.list(), store.list());
        assert_eq!(reloaded.account_for("case!x@y"), Some("case"));
    }
}
