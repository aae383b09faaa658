//! Command handling module.
//!
//! Parses owner commands from chat messages and applies their effects to
//! the state store. Handlers never talk to the platform client directly;
//! they return a [`CommandResult`] describing the reply and any broadcast
//! or reschedule the caller should perform.

mod handler;
mod types;

pub use handler::CommandHandler;
pub use types::{BotCommand, CommandResult};
