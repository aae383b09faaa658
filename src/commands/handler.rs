//! Command handler implementation.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::types::{BotCommand, CommandResult};
use crate::state::StateStore;

/// Maximum broadcast interval: 24 hours, in minutes.
const MAX_INTERVAL_MINUTES: u64 = 24 * 60;

/// Handles owner commands and applies their effects to the state store.
pub struct CommandHandler {
    /// User ids allowed to issue privileged commands.
    owner_ids: Vec<u64>,

    /// Shared bot state.
    store: Arc<StateStore>,
}

impl CommandHandler {
    /// Creates a new command handler.
    #[must_use]
    pub fn new(owner_ids: Vec<u64>, store: Arc<StateStore>) -> Self {
        Self { owner_ids, store }
    }

    /// Tries to parse and execute a command from a message.
    ///
    /// Returns `None` if the message is not a command, or if a non-owner
    /// issued a privileged command (silent-ignore policy).
    pub async fn try_handle(&self, user_id: Option<u64>, text: &str) -> Option<CommandResult> {
        let command = BotCommand::parse(text)?;

        if command.is_privileged() && !self.is_owner(user_id) {
            debug!(
                "Ignoring privileged command {} from non-owner {:?}",
                command.name(),
                user_id
            );
            return None;
        }

        debug!("Handling command: {}", command);
        let result = self.execute(command).await;
        info!("Command result: success={}", result.success);

        Some(result)
    }

    fn is_owner(&self, user_id: Option<u64>) -> bool {
        user_id.is_some_and(|id| self.owner_ids.contains(&id))
    }

    /// Executes a parsed command.
    async fn execute(&self, command: BotCommand) -> CommandResult {
        match command {
            BotCommand::Start => Self::handle_start(),
            BotCommand::Help => Self::handle_help(),
            BotCommand::Status => self.handle_status().await,
            BotCommand::SendBroadcast(text) => Self::handle_send_broadcast(&text),
            BotCommand::SetRegular(text) => self.handle_set_regular(&text).await,
            BotCommand::ToggleBroadcast(arg) => self.handle_toggle(&arg).await,
            BotCommand::SetInterval(arg) => self.handle_set_interval(&arg).await,
            BotCommand::ListGroups => self.handle_list_groups().await,
        }
    }

    fn handle_start() -> CommandResult {
        CommandResult::success(
            "Hello! I keep groups active with periodic messages. \
             Add me to a group and I'll take it from there.",
        )
    }

    fn handle_help() -> CommandResult {
        let mut lines = vec!["Group Keeper commands:".to_owned(), String::new()];
        for (usage, desc) in BotCommand::all_commands() {
            lines.push(format!("  {usage} - {desc}"));
        }
        CommandResult::success(lines.join("\n"))
    }

    async fn handle_status(&self) -> CommandResult {
        let state = self.store.snapshot().await;
        let status = if state.broadcasts_enabled { "ON" } else { "OFF" };

        CommandResult::success(format!(
            "Periodic broadcasts: {status}\n\
             Interval: {} min\n\
             Groups: {}\n\
             Message: \"{}\"",
            state.interval_secs / 60,
            state.groups.len(),
            truncate(&state.regular_message, 60),
        ))
    }

    fn handle_send_broadcast(text: &str) -> CommandResult {
        let text = text.trim();
        if text.is_empty() {
            return CommandResult::error("Usage: /send_broadcast <text>");
        }
        // The caller performs the sends and replies with the delivery summary.
        CommandResult::success_with_broadcast("Sending broadcast...", text)
    }

    async fn handle_set_regular(&self, text: &str) -> CommandResult {
        let text = text.trim();
        if text.is_empty() {
            return CommandResult::error("Usage: /set_regular <text>");
        }

        match self.store.set_regular_message(text).await {
            Ok(_) => CommandResult::success(format!(
                "Regular broadcast message updated to \"{}\".",
                truncate(text, 60)
            )),
            Err(e) => {
                warn!("Failed to save state: {}", e);
                CommandResult::error(format!("Message updated but failed to save: {e}"))
            }
        }
    }

    async fn handle_toggle(&self, arg: &str) -> CommandResult {
        let enabled = match arg.trim().to_lowercase().as_str() {
            "on" => true,
            "off" => false,
            _ => return CommandResult::error("Usage: /toggle_broadcast on|off"),
        };

        match self.store.set_enabled(enabled).await {
            Ok(changed) => {
                if !changed {
                    debug!("Broadcast flag already {}", enabled);
                }
                CommandResult::success(format!(
                    "Periodic broadcasts are now {}.",
                    if enabled { "enabled" } else { "disabled" }
                ))
            }
            Err(e) => {
                warn!("Failed to save state: {}", e);
                CommandResult::error(format!("Flag updated but failed to save: {e}"))
            }
        }
    }

    async fn handle_set_interval(&self, arg: &str) -> CommandResult {
        let minutes: u64 = match arg.trim().parse() {
            Ok(m) if (1..=MAX_INTERVAL_MINUTES).contains(&m) => m,
            _ => {
                return CommandResult::error(format!(
                    "Usage: /set_interval <minutes> (1-{MAX_INTERVAL_MINUTES})"
                ))
            }
        };

        let interval_secs = minutes * 60;
        match self.store.set_interval(interval_secs).await {
            Ok(_) => CommandResult::success_with_reschedule(
                format!("Broadcast interval set to {minutes} minutes."),
                Duration::from_secs(interval_secs),
            ),
            Err(e) => {
                warn!("Failed to save state: {}", e);
                CommandResult::error(format!("Interval updated but failed to save: {e}"))
            }
        }
    }

    async fn handle_list_groups(&self) -> CommandResult {
        let state = self.store.snapshot().await;

        if state.groups.is_empty() {
            return CommandResult::success("Tracked groups (0): none yet.");
        }

        let mut lines = vec![format!("Tracked groups ({}):", state.groups.len())];
        for (chat_id, title) in &state.groups {
            lines.push(format!("  {title} ({chat_id})"));
        }
        CommandResult::success(lines.join("\n"))
    }
}

impl std::fmt::Debug for CommandHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandHandler")
            .field("owner_ids", &self.owner_ids)
            .finish_non_exhaustive()
    }
}

/// Truncates a string for display, adding "..." if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{StateStore, DEFAULT_REGULAR_MESSAGE};

    const OWNER: Option<u64> = Some(1);
    const STRANGER: Option<u64> = Some(999);

    fn handler() -> (tempfile::TempDir, Arc<StateStore>, CommandHandler) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(StateStore::load(dir.path().join("state.json")));
        let handler = CommandHandler::new(vec![1], Arc::clone(&store));
        (dir, store, handler)
    }

    #[tokio::test]
    async fn test_non_command_text_is_ignored() {
        let (_dir, _store, handler) = handler();
        assert!(handler.try_handle(OWNER, "just chatting").await.is_none());
    }

    #[tokio::test]
    async fn test_non_owner_privileged_command_silently_ignored() {
        let (_dir, store, handler) = handler();
        let result = handler
            .try_handle(STRANGER, "/send_broadcast hacked")
            .await;
        assert!(result.is_none());
        assert_eq!(store.snapshot().await, Default::default());
    }

    #[tokio::test]
    async fn test_non_owner_gets_start_greeting() {
        let (_dir, _store, handler) = handler();
        let result = handler.try_handle(STRANGER, "/start").await.unwrap();
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_send_broadcast_requests_broadcast() {
        let (_dir, _store, handler) = handler();
        let result = handler
            .try_handle(OWNER, "/send_broadcast Meeting in 5!")
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.broadcast.as_deref(), Some("Meeting in 5!"));
    }

    #[tokio::test]
    async fn test_send_broadcast_empty_text_is_usage_error() {
        let (_dir, _store, handler) = handler();
        let result = handler.try_handle(OWNER, "/send_broadcast").await.unwrap();
        assert!(!result.success);
        assert!(result.broadcast.is_none());
        assert!(result.message.contains("Usage"));
    }

    #[tokio::test]
    async fn test_set_regular_updates_state() {
        let (_dir, store, handler) = handler();
        let result = handler
            .try_handle(OWNER, "/set_regular Stay active!")
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(store.snapshot().await.regular_message, "Stay active!");
    }

    #[tokio::test]
    async fn test_set_regular_empty_text_is_usage_error() {
        let (_dir, store, handler) = handler();
        let result = handler.try_handle(OWNER, "/set_regular   ").await.unwrap();
        assert!(!result.success);
        assert_eq!(
            store.snapshot().await.regular_message,
            DEFAULT_REGULAR_MESSAGE
        );
    }

    #[tokio::test]
    async fn test_toggle_off_and_on() {
        let (_dir, store, handler) = handler();

        let result = handler
            .try_handle(OWNER, "/toggle_broadcast off")
            .await
            .unwrap();
        assert!(result.success);
        assert!(!store.snapshot().await.broadcasts_enabled);

        let result = handler
            .try_handle(OWNER, "/toggle_broadcast on")
            .await
            .unwrap();
        assert!(result.success);
        assert!(store.snapshot().await.broadcasts_enabled);
    }

    #[tokio::test]
    async fn test_toggle_same_value_twice_is_stable() {
        let (_dir, store, handler) = handler();
        let _ = handler.try_handle(OWNER, "/toggle_broadcast off").await;
        let result = handler
            .try_handle(OWNER, "/toggle_broadcast off")
            .await
            .unwrap();
        assert!(result.success);
        assert!(!store.snapshot().await.broadcasts_enabled);
    }

    #[tokio::test]
    async fn test_toggle_bad_argument_is_usage_error() {
        let (_dir, _store, handler) = handler();
        let result = handler
            .try_handle(OWNER, "/toggle_broadcast maybe")
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.message.contains("Usage"));
    }

    #[tokio::test]
    async fn test_set_interval_reschedules() {
        let (_dir, store, handler) = handler();
        let result = handler.try_handle(OWNER, "/set_interval 15").await.unwrap();
        assert!(result.success);
        assert_eq!(result.reschedule, Some(Duration::from_secs(15 * 60)));
        assert_eq!(store.snapshot().await.interval_secs, 15 * 60);
    }

    #[tokio::test]
    async fn test_set_interval_out_of_bounds() {
        let (_dir, _store, handler) = handler();
        for arg in ["/set_interval 0", "/set_interval 100000", "/set_interval x"] {
            let result = handler.try_handle(OWNER, arg).await.unwrap();
            assert!(!result.success, "expected usage error for {arg}");
        }
    }

    #[tokio::test]
    async fn test_list_groups() {
        let (_dir, store, handler) = handler();
        store.add_group(111, "Alpha").await.unwrap();
        store.add_group(222, "Beta").await.unwrap();

        let result = handler.try_handle(OWNER, "/list_groups").await.unwrap();
        assert!(result.message.contains("Alpha (111)"));
        assert!(result.message.contains("Beta (222)"));
    }

    #[tokio::test]
    async fn test_status_reports_flag_and_count() {
        let (_dir, store, handler) = handler();
        store.add_group(111, "Alpha").await.unwrap();

        let result = handler.try_handle(OWNER, "/status").await.unwrap();
        assert!(result.message.contains("ON"));
        assert!(result.message.contains("Groups: 1"));
    }
}
