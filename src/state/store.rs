//! JSON-backed state store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Default message broadcast to tracked groups.
pub const DEFAULT_REGULAR_MESSAGE: &str = "Hello everyone! Keeping the group active.";

/// Default broadcast interval: 7 minutes.
pub const DEFAULT_INTERVAL_SECS: u64 = 7 * 60;

/// Errors that can occur while persisting state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Failed to write state file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Persistent bot state.
///
/// Every field carries a default so documents written by older versions
/// (or a completely absent file) load without errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BotState {
    /// Tracked group chats: chat id -> last-known title.
    #[serde(default)]
    pub groups: BTreeMap<i64, String>,

    /// Message sent by the periodic broadcast.
    #[serde(default = "default_regular_message")]
    pub regular_message: String,

    /// Whether periodic broadcasts are enabled.
    #[serde(default = "default_enabled")]
    pub broadcasts_enabled: bool,

    /// Broadcast interval in seconds.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_regular_message() -> String {
    DEFAULT_REGULAR_MESSAGE.to_owned()
}

const fn default_enabled() -> bool {
    true
}

const fn default_interval_secs() -> u64 {
    DEFAULT_INTERVAL_SECS
}

impl Default for BotState {
    fn default() -> Self {
        Self {
            groups: BTreeMap::new(),
            regular_message: default_regular_message(),
            broadcasts_enabled: default_enabled(),
            interval_secs: default_interval_secs(),
        }
    }
}

impl BotState {
    /// Returns the broadcast interval as a [`Duration`].
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Returns the tracked chat ids.
    #[must_use]
    pub fn chat_ids(&self) -> Vec<i64> {
        self.groups.keys().copied().collect()
    }
}

/// Shared, disk-backed state store.
///
/// All mutations go through [`StateStore::mutate`], which applies the change
/// under a write lock and rewrites the backing file before releasing it.
/// A failed write is surfaced to the caller but the in-memory state stays
/// authoritative, so the bot keeps working without persistence.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    state: RwLock<BotState>,
}

impl StateStore {
    /// Loads the store from disk, falling back to defaults when the file is
    /// absent or unreadable.
    #[must_use]
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(state) => state,
                Err(e) => {
                    warn!("State file {} is malformed ({}), starting fresh", path.display(), e);
                    BotState::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No state file at {}, starting fresh", path.display());
                BotState::default()
            }
            Err(e) => {
                warn!("Failed to read state file {} ({}), starting fresh", path.display(), e);
                BotState::default()
            }
        };

        Self {
            path,
            state: RwLock::new(state),
        }
    }

    /// Creates a store with the given initial state without touching disk.
    #[must_use]
    pub fn with_state(path: impl Into<PathBuf>, state: BotState) -> Self {
        Self {
            path: path.into(),
            state: RwLock::new(state),
        }
    }

    /// Returns a clone of the current state.
    pub async fn snapshot(&self) -> BotState {
        self.state.read().await.clone()
    }

    /// Applies a mutation and persists the full document if it changed.
    ///
    /// Returns `Ok(true)` when the mutation changed state (and the file was
    /// rewritten), `Ok(false)` for a no-op. On a write failure the mutation
    /// is still applied in memory and the error is returned.
    pub async fn mutate<F>(&self, f: F) -> Result<bool, StateError>
    where
        F: FnOnce(&mut BotState) -> bool,
    {
        let mut state = self.state.write().await;
        if !f(&mut state) {
            return Ok(false);
        }
        write_document(&self.path, &state)?;
        Ok(true)
    }

    /// Forces a full rewrite of the backing file.
    pub async fn save(&self) -> Result<(), StateError> {
        let state = self.state.read().await;
        write_document(&self.path, &state)
    }

    /// Adds a group (or refreshes its title). No-op if already tracked
    /// under the same title.
    pub async fn add_group(&self, chat_id: i64, title: &str) -> Result<bool, StateError> {
        self.mutate(|state| {
            if state.groups.get(&chat_id).map(String::as_str) == Some(title) {
                return false;
            }
            state.groups.insert(chat_id, title.to_owned());
            true
        })
        .await
    }

    /// Removes a group. No-op if not tracked.
    pub async fn remove_group(&self, chat_id: i64) -> Result<bool, StateError> {
        self.mutate(|state| state.groups.remove(&chat_id).is_some())
            .await
    }

    /// Overwrites the regular broadcast message.
    pub async fn set_regular_message(&self, text: &str) -> Result<bool, StateError> {
        self.mutate(|state| {
            if state.regular_message == text {
                return false;
            }
            state.regular_message = text.to_owned();
            true
        })
        .await
    }

    /// Enables or disables periodic broadcasts.
    pub async fn set_enabled(&self, enabled: bool) -> Result<bool, StateError> {
        self.mutate(|state| {
            if state.broadcasts_enabled == enabled {
                return false;
            }
            state.broadcasts_enabled = enabled;
            true
        })
        .await
    }

    /// Changes the broadcast interval.
    pub async fn set_interval(&self, interval_secs: u64) -> Result<bool, StateError> {
        self.mutate(|state| {
            if state.interval_secs == interval_secs {
                return false;
            }
            state.interval_secs = interval_secs;
            true
        })
        .await
    }
}

/// Writes the full document atomically: temp file in the same directory,
/// then rename over the target.
fn write_document(path: &Path, state: &BotState) -> Result<(), StateError> {
    let json = serde_json::to_string_pretty(state)?;
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, json)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
