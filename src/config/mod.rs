//! Configuration loading and management.
//!
//! - [`types`]: config structs and TOML loading
//! - [`validation`]: startup checks that report every problem at once

mod types;
pub mod validation;

pub use types::{AdminConfig, BotConfig, Config, ConfigError, ResourceConfig};
