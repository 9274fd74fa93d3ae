//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use slircbot_proto::{ChannelExt, NickExt, irc_eq};
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("bot.nickname is not a valid nickname: '{0}'")]
    InvalidNickname(String),
    #[error("bot.prefix must not be empty or contain whitespace")]
    InvalidPrefix,
    #[error("invalid channel name: '{0}'")]
    InvalidChannel(String),
    #[error("channel '{0}' is listed as both home and guest")]
    HomeAndGuest(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !config.bot.nickname.is_valid_nick() {
        errors.push(ValidationError::InvalidNickname(config.bot.nickname.clone()));
    }

    let prefix = &config.bot.prefix;
    if prefix.is_empty() || prefix.chars().any(char::is_whitespace) {
        errors.push(ValidationError::InvalidPrefix);
    }

    for channel in config.bot.home_channels.iter().chain(&config.bot.guest_channels) {
        if !channel.is_channel_name() {
            errors.push(ValidationError::InvalidChannel(channel.clone()));
        }
    }

    for home in &config.bot.home_channels {
        if config.bot.guest_channels.iter().any(|guest| irc_eq(guest, home)) {
            errors.push(ValidationError::HomeAndGuest(home.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
