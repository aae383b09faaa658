//! Message delivery abstraction and its Bot API implementation.

use std::time::Duration;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::{ApiError, RequestError};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur when sending a message to a chat.
#[derive(Debug, Error)]
pub enum SendError {
    /// The bot is no longer able to post in this chat (kicked, blocked,
    /// chat deleted). The chat should be pruned from the tracked set.
    #[error("Bot can no longer post in this chat: {0}")]
    ChatGone(String),

    /// The platform asked us to slow down.
    #[error("Rate limited, retry after {0:?}")]
    RateLimited(Duration),

    /// The send did not complete within the per-send timeout.
    #[error("Send timed out")]
    Timeout,

    /// Any other API failure.
    #[error("API error: {0}")]
    Api(String),
}

impl SendError {
    /// Whether this failure means the chat is permanently unreachable.
    #[must_use]
    pub const fn is_chat_gone(&self) -> bool {
        matches!(self, Self::ChatGone(_))
    }
}

impl From<RequestError> for SendError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::RetryAfter(duration) => Self::RateLimited(duration),
            RequestError::Api(api_err) => match api_err {
                ApiError::BotKicked
                | ApiError::BotKickedFromSupergroup
                | ApiError::BotBlocked
                | ApiError::ChatNotFound
                | ApiError::GroupDeactivated => Self::ChatGone(api_err.to_string()),
                other => Self::Api(other.to_string()),
            },
            other => Self::Api(other.to_string()),
        }
    }
}

/// Sends a text message to a chat.
///
/// The trait exists so the broadcaster and scheduler can be exercised
/// without a live Telegram connection.
#[async_trait]
pub trait ChatSender: Send + Sync {
    /// Sends `text` to the chat identified by `chat_id`.
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), SendError>;
}

/// [`ChatSender`] backed by the Telegram Bot API.
#[derive(Debug, Clone)]
pub struct TelegramSender {
    bot: Bot,
}

impl TelegramSender {
    /// Creates a sender around an existing bot handle.
    #[must_use]
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatSender for TelegramSender {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), SendError> {
        debug!("Sending message to chat {}", chat_id);
        self.bot.send_message(ChatId(chat_id), text).await?;
        Ok(())
    }
}
