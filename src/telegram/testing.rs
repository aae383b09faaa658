//! Test doubles for the platform seam.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use super::sender::{ChatSender, SendError};

/// Test sender that records deliveries and fails for configured chats.
#[derive(Debug, Default)]
pub struct MockSender {
    /// Successfully "delivered" messages, in send order.
    pub sent: Mutex<Vec<(i64, String)>>,

    /// Chats that fail with a transient API error.
    pub fail_chats: HashSet<i64>,

    /// Chats that fail with a bot-is-gone error.
    pub gone_chats: HashSet<i64>,
}

impl MockSender {
    /// Chat ids that received a message, in send order.
    pub fn sent_chats(&self) -> Vec<i64> {
        self.sent.lock().unwrap().iter().map(|(id, _)| *id).collect()
    }
}

#[async_trait]
impl ChatSender for MockSender {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), SendError> {
        if self.gone_chats.contains(&chat_id) {
            return Err(SendError::ChatGone("bot was kicked".to_owned()));
        }
        if self.fail_chats.contains(&chat_id) {
            return Err(SendError::Api("internal server error".to_owned()));
        }
        self.sent.lock().unwrap().push((chat_id, text.to_owned()));
        Ok(())
    }
}
