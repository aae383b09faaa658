//! Broadcast fan-out.
//!
//! Sends one message to many chats as a sequence of independent attempts:
//! a failure for one chat never aborts the rest, every attempt is bounded
//! by a timeout, and results are collected into a [`BroadcastReport`].

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::pacer::SendPacer;
use super::sender::{ChatSender, SendError};

/// Gap between consecutive sends within one broadcast.
const SEND_GAP: Duration = Duration::from_millis(50);

/// Upper bound for a single send attempt.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of a broadcast to a set of chats.
#[derive(Debug, Default)]
pub struct BroadcastReport {
    /// Chats that received the message.
    pub delivered: Vec<i64>,

    /// Chats that did not, with the reason.
    pub failed: Vec<(i64, SendError)>,
}

impl BroadcastReport {
    /// Chats whose failure means the bot is no longer a member there.
    #[must_use]
    pub fn gone_chats(&self) -> Vec<i64> {
        self.failed
            .iter()
            .filter(|(_, e)| e.is_chat_gone())
            .map(|(chat_id, _)| *chat_id)
            .collect()
    }

    /// Total number of attempted chats.
    #[must_use]
    pub fn total(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }

    /// Human-readable per-chat summary for the owner reply.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "Broadcast delivered to {} of {} chats.",
            self.delivered.len(),
            self.total()
        )];
        for (chat_id, error) in &self.failed {
            lines.push(format!("  {chat_id}: {error}"));
        }
        lines.join("\n")
    }
}

/// Paced, fault-isolated fan-out over a [`ChatSender`].
pub struct Broadcaster {
    sender: Arc<dyn ChatSender>,
    pacer: SendPacer,
    send_timeout: Duration,
}

impl Broadcaster {
    /// Creates a broadcaster over the given sender.
    #[must_use]
    pub fn new(sender: Arc<dyn ChatSender>) -> Self {
        Self {
            sender,
            pacer: SendPacer::new(SEND_GAP),
            send_timeout: SEND_TIMEOUT,
        }
    }

    /// Overrides the per-send timeout.
    #[must_use]
    pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    /// Sends `text` to every chat in `chats`.
    ///
    /// Failures are collected, never propagated; a rate-limit response
    /// additionally delays the remaining sends.
    pub async fn broadcast(&self, chats: &[i64], text: &str) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        for &chat_id in chats {
            self.pacer.pace().await;

            let attempt = timeout(self.send_timeout, self.sender.send_text(chat_id, text)).await;
            match attempt {
                Ok(Ok(())) => {
                    debug!("Delivered to chat {}", chat_id);
                    report.delivered.push(chat_id);
                }
                Ok(Err(e)) => {
                    warn!("Failed to send to chat {}: {}", chat_id, e);
                    if let SendError::RateLimited(penalty) = &e {
                        self.pacer.penalize(*penalty).await;
                    }
                    report.failed.push((chat_id, e));
                }
                Err(_) => {
                    warn!("Send to chat {} timed out", chat_id);
                    report.failed.push((chat_id, SendError::Timeout));
                }
            }
        }

        info!(
            "Broadcast finished: {}/{} delivered",
            report.delivered.len(),
            report.total()
        );
        report
    }
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("send_timeout", &self.send_timeout)
            .finish_non_exhaustive()
    }
}
