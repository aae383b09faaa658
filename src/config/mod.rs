//! Configuration module for the group keeper bot.
//!
//! Handles loading and validation of the bot token and the owner
//! allow-list. Configuration is read once at startup; errors here are the
//! only fatal errors in the whole process.

mod settings;

pub use settings::{Config, ConfigError, TOKEN_PLACEHOLDER};
