//! State management module.
//!
//! [`BotState`] is the one shared container every handler and continuation
//! reaches through an `Arc`. Handlers run one at a time on a single thread;
//! the locks only make the state shareable across the tasks continuations
//! are parked on, and no guard is ever held across a suspension point.

mod join;
mod membership;
mod session;

pub use join::{JOIN_INTEREST, JoinStep, step as join_step};
pub use membership::{AddChannelOutcome, ChannelMembership, ChannelRole};
pub use session::{Session, SettingUpdate};

use crate::bus::Bus;
use crate::config::Config;
use crate::outbound::Outbound;
use crate::resolver::{AccountLookup, WhoisLookup};
use crate::store::{ClassificationStore, HostmaskStore, StoreError};
use crate::suspend::Suspender;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Central shared state of the bot.
pub struct BotState {
    /// Configuration as loaded at startup.
    pub config: Config,

    /// Home and guest channel lists.
    pub channels: Mutex<ChannelMembership>,

    /// Per-channel account classes (`users.json`).
    pub classes: Mutex<ClassificationStore>,

    /// Hostmask to account mappings (`hostmasks.json`).
    pub hostmasks: Mutex<HostmaskStore>,

    /// Users and toggles learned this connection.
    pub session: Session,

    /// Pending awaits.
    pub suspender: Suspender,

    /// Outbound protocol actions.
    pub outbound: Arc<dyn Outbound>,

    /// Control bus for notifications to other components.
    pub bus: Bus,

    /// Account resolution capability.
    pub lookup: Arc<dyn AccountLookup>,
}

impl BotState {
    /// Build the state, loading every store from the resource directory.
    ///
    /// Channel lists come from `channels.json` if one was saved, otherwise
    /// from the config.
    pub fn new(config: Config, outbound: Arc<dyn Outbound>, bus: Bus) -> Result<Self, StoreError> {
        let resources = &config.resources;
        let classes = ClassificationStore::load(resources.users_file())?;
        let hostmasks = HostmaskStore::load(resources.hostmasks_file())?;
        let channels = ChannelMembership::load(
            &resources.channels_file(),
            ChannelMembership::new(
                config.bot.home_channels.clone(),
                config.bot.guest_channels.clone(),
            ),
        )?;
        info!(
            home = channels.list(ChannelRole::Home).len(),
            guest = channels.list(ChannelRole::Guest).len(),
            hostmasks = hostmasks.list().len(),
            "Loaded state"
        );

        let session = Session::new(
            config.flat_settings(),
            config.admin.printraw,
            config.admin.printbytes,
        );
        let suspender = Suspender::new();
        let lookup: Arc<dyn AccountLookup> =
            Arc::new(WhoisLookup::new(suspender.clone(), Arc::clone(&outbound)));

        Ok(Self {
            config,
            channels: Mutex::new(channels),
            classes: Mutex::new(classes),
            hostmasks: Mutex::new(hostmasks),
            session,
            suspender,
            outbound,
            bus,
            lookup,
        })
    }

    /// Replace the account resolution capability.
    #[cfg(test)]
    pub fn with_lookup(mut self, lookup: Arc<dyn AccountLookup>) -> Self {
        self.lookup = lookup;
        self
    }

    /// Write the channel lists and both stores to disk.
    pub fn save(&self) -> Result<(), StoreError> {
        self.channels
            .lock()
            .save(&self.config.resources.channels_file())?;
        self.classes.lock().save()?;
        self.hostmasks.lock().save()?;
        Ok(())
    }

    /// Re-read both stores from disk.
    pub fn reload(&self) -> Result<(), StoreError> {
        self.classes.lock().reload()?;
        self.hostmasks.lock().reload()?;
        Ok(())
    }

    /// Whether `channel` is one of the home channels.
    pub fn is_home(&self, channel: &str) -> bool {
        self.channels.lock().contains(ChannelRole::Home, channel)
    }
}
