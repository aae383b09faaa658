//! Membership tracking.
//!
//! Reacts to "bot added to / removed from chat" events by updating the
//! tracked group set. Transitions are idempotent: re-adding a tracked chat
//! or re-removing an untracked one is a no-op and writes nothing to disk.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::state::StateStore;

/// The bot's membership status in a chat, as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipStatus {
    Member,
    Administrator,
    Left,
    Kicked,
}

impl MembershipStatus {
    /// Whether this status means the bot can post in the chat.
    #[must_use]
    pub const fn is_present(self) -> bool {
        matches!(self, Self::Member | Self::Administrator)
    }
}

/// Applies membership transitions to the state store.
#[derive(Debug)]
pub struct MembershipTracker {
    store: Arc<StateStore>,
}

impl MembershipTracker {
    /// Creates a new membership tracker.
    #[must_use]
    pub fn new(store: Arc<StateStore>) -> Self {
        Self { store }
    }

    /// Handles a membership status change for the given chat.
    pub async fn handle_transition(&self, chat_id: i64, title: &str, status: MembershipStatus) {
        let result = if status.is_present() {
            match self.store.add_group(chat_id, title).await {
                Ok(true) => {
                    info!("Now tracking group \"{}\" ({})", title, chat_id);
                    Ok(())
                }
                Ok(false) => {
                    debug!("Group {} already tracked", chat_id);
                    Ok(())
                }
                Err(e) => Err(e),
            }
        } else {
            match self.store.remove_group(chat_id).await {
                Ok(true) => {
                    info!("Stopped tracking group {} (status: {:?})", chat_id, status);
                    Ok(())
                }
                Ok(false) => {
                    debug!("Group {} was not tracked", chat_id);
                    Ok(())
                }
                Err(e) => Err(e),
            }
        };

        // Persistence failures are not fatal; in-memory state stays authoritative.
        if let Err(e) = result {
            warn!("Failed to persist membership change for {}: {}", chat_id, e);
        }
    }
}
