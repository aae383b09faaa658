//! Command types and parsing.

use std::fmt;
use std::time::Duration;

/// Available bot commands.
///
/// Argument-carrying variants hold the raw argument string; validation
/// (empty text, bad flags, interval bounds) happens in the handler so that
/// malformed input produces a usage reply rather than silence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// Greeting; the only command available to non-owners.
    Start,

    /// Show the command list.
    Help,

    /// Show the broadcast status summary.
    Status,

    /// Send a custom broadcast to every tracked group right now.
    SendBroadcast(String),

    /// Overwrite the regular broadcast message.
    SetRegular(String),

    /// Enable or disable periodic broadcasts ("on"/"off").
    ToggleBroadcast(String),

    /// Change the broadcast interval (minutes).
    SetInterval(String),

    /// List the tracked groups.
    ListGroups,
}

impl BotCommand {
    /// Parses a command from a message text.
    ///
    /// Accepts an optional `@botname` suffix on the command word (Telegram
    /// appends it in groups). Returns `None` for anything that is not a
    /// known command.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let rest = text.strip_prefix('/')?;

        let (word, args) = match rest.split_once(char::is_whitespace) {
            Some((word, args)) => (word, args.trim()),
            None => (rest, ""),
        };

        // "/send_broadcast@my_bot" -> "/send_broadcast"
        let word = word.split('@').next().unwrap_or(word).to_lowercase();

        match word.as_str() {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            "status" => Some(Self::Status),
            "send_broadcast" => Some(Self::SendBroadcast(args.to_owned())),
            "set_regular" => Some(Self::SetRegular(args.to_owned())),
            "toggle_broadcast" => Some(Self::ToggleBroadcast(args.to_owned())),
            "set_interval" => Some(Self::SetInterval(args.to_owned())),
            "list_groups" => Some(Self::ListGroups),
            _ => None,
        }
    }

    /// Whether the command requires the sender to be an owner.
    #[must_use]
    pub const fn is_privileged(&self) -> bool {
        !matches!(self, Self::Start)
    }

    /// Returns the command name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::Status => "status",
            Self::SendBroadcast(_) => "send_broadcast",
            Self::SetRegular(_) => "set_regular",
            Self::ToggleBroadcast(_) => "toggle_broadcast",
            Self::SetInterval(_) => "set_interval",
            Self::ListGroups => "list_groups",
        }
    }

    /// Returns all commands with usage and description, for help output.
    #[must_use]
    pub fn all_commands() -> Vec<(&'static str, &'static str)> {
        vec![
            ("/send_broadcast <text>", "Send a custom broadcast now"),
            ("/set_regular <text>", "Set the regular broadcast message"),
            ("/toggle_broadcast on|off", "Enable or disable broadcasts"),
            ("/set_interval <minutes>", "Change the broadcast interval"),
            ("/list_groups", "List tracked groups"),
            ("/status", "Show broadcast status"),
            ("/help", "Show this help message"),
        ]
    }
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SendBroadcast(text) | Self::SetRegular(text) => {
                write!(f, "{} <{} chars>", self.name(), text.chars().count())
            }
            Self::ToggleBroadcast(arg) | Self::SetInterval(arg) => {
                write!(f, "{} {arg}", self.name())
            }
            _ => write!(f, "{}", self.name()),
        }
    }
}

/// Result of command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Whether the command was successful.
    pub success: bool,

    /// Reply to send to the invoking chat.
    pub message: String,

    /// Text to broadcast immediately to every tracked group, if any.
    pub broadcast: Option<String>,

    /// New broadcast interval to apply to the scheduler, if changed.
    pub reschedule: Option<Duration>,
}

impl CommandResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            broadcast: None,
            reschedule: None,
        }
    }

    /// Creates a successful result that requests an immediate broadcast.
    #[must_use]
    pub fn success_with_broadcast(message: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            broadcast: Some(text.into()),
            reschedule: None,
        }
    }

    /// Creates a successful result that reschedules the broadcast timer.
    #[must_use]
    pub fn success_with_reschedule(message: impl Into<String>, interval: Duration) -> Self {
        Self {
            success: true,
            message: message.into(),
            broadcast: None,
            reschedule: Some(interval),
        }
    }

    /// Creates an error result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            broadcast: None,
            reschedule: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(BotCommand::parse("/start"), Some(BotCommand::Start));
        assert_eq!(BotCommand::parse("/help"), Some(BotCommand::Help));
        assert_eq!(BotCommand::parse("/list_groups"), Some(BotCommand::ListGroups));
        assert_eq!(BotCommand::parse("/status"), Some(BotCommand::Status));
    }

    #[test]
    fn test_parse_with_bot_suffix() {
        assert_eq!(
            BotCommand::parse("/list_groups@group_keeper_bot"),
            Some(BotCommand::ListGroups)
        );
    }

    #[test]
    fn test_parse_send_broadcast() {
        assert_eq!(
            BotCommand::parse("/send_broadcast Hello there"),
            Some(BotCommand::SendBroadcast("Hello there".to_owned()))
        );
    }

    #[test]
    fn test_parse_send_broadcast_without_text_keeps_empty_arg() {
        // The handler turns the empty argument into a usage error.
        assert_eq!(
            BotCommand::parse("/send_broadcast"),
            Some(BotCommand::SendBroadcast(String::new()))
        );
    }

    #[test]
    fn test_parse_toggle() {
        assert_eq!(
            BotCommand::parse("/toggle_broadcast off"),
            Some(BotCommand::ToggleBroadcast("off".to_owned()))
        );
    }

    #[test]
    fn test_parse_set_interval() {
        assert_eq!(
            BotCommand::parse("/set_interval 15"),
            Some(BotCommand::SetInterval("15".to_owned()))
        );
    }

    #[test]
    fn test_parse_unknown_command() {
        assert_eq!(BotCommand::parse("/frobnicate"), None);
        assert_eq!(BotCommand::parse("plain text"), None);
        assert_eq!(BotCommand::parse(""), None);
    }

    #[test]
    fn test_parse_case_insensitive_and_whitespace() {
        assert_eq!(BotCommand::parse("  /STATUS  "), Some(BotCommand::Status));
    }

    #[test]
    fn test_privileged() {
        assert!(!BotCommand::Start.is_privileged());
        assert!(BotCommand::ListGroups.is_privileged());
        assert!(BotCommand::SendBroadcast(String::new()).is_privileged());
    }
}
