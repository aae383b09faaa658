//! Bot configuration loading.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Placeholder written into generated template configs.
pub const TOKEN_PLACEHOLDER: &str = "PUT_YOUR_BOT_TOKEN_HERE";

/// Configuration errors. All of these are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "Config template created at {0}. Fill in your bot_token and owner_ids, then run again."
    )]
    TemplateCreated(String),

    #[error("bot_token is missing or still set to the placeholder")]
    InvalidToken,

    #[error("owner_ids must contain at least one Telegram user id")]
    NoOwners,

    #[error("OWNER_IDS must be a comma-separated list of integers: {0}")]
    InvalidOwnerIds(String),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Static bot configuration: credential and owner allow-list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Bot API token, passed through to the Telegram client.
    pub bot_token: String,

    /// User ids allowed to issue privileged commands.
    #[serde(default)]
    pub owner_ids: Vec<u64>,
}

impl Config {
    /// Loads configuration from a JSON file, applying environment overrides.
    ///
    /// When the file is absent a template is written in its place and
    /// [`ConfigError::TemplateCreated`] is returned so the process exits
    /// with instructions instead of running with an unusable credential.
    ///
    /// Environment overrides: `BOT_TOKEN` replaces `bot_token`, `OWNER_IDS`
    /// (comma-separated) replaces `owner_ids`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str::<Self>(&content)?
        } else {
            Self::template().save_to_file(path)?;
            return Err(ConfigError::TemplateCreated(path.display().to_string()));
        };

        if let Ok(token) = std::env::var("BOT_TOKEN") {
            config.bot_token = token;
        }
        if let Ok(ids) = std::env::var("OWNER_IDS") {
            config.owner_ids = parse_owner_ids(&ids)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the loaded configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_token.is_empty() || self.bot_token == TOKEN_PLACEHOLDER {
            return Err(ConfigError::InvalidToken);
        }
        if self.owner_ids.is_empty() {
            return Err(ConfigError::NoOwners);
        }
        Ok(())
    }

    /// Returns a template configuration for the user to fill in.
    #[must_use]
    pub fn template() -> Self {
        Self {
            bot_token: TOKEN_PLACEHOLDER.to_owned(),
            owner_ids: vec![123_456_789],
        }
    }

    /// Saves the configuration to a JSON file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Checks whether the given user id is an owner.
    #[must_use]
    pub fn is_owner(&self, user_id: Option<u64>) -> bool {
        user_id.is_some_and(|id| self.owner_ids.contains(&id))
    }
}

/// Parses a comma-separated list of owner ids.
fn parse_owner_ids(raw: &str) -> Result<Vec<u64>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse()
                .map_err(|_| ConfigError::InvalidOwnerIds(part.to_owned()))
        })
        .collect()
}
