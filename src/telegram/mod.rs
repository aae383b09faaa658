//! Telegram platform seam.
//!
//! Everything that touches the Bot API lives here: the [`ChatSender`]
//! abstraction over message delivery, the paced fan-out [`Broadcaster`],
//! and the update dispatcher that routes membership changes and owner
//! commands into the core handlers.

mod broadcaster;
mod dispatcher;
mod pacer;
mod sender;
#[cfg(test)]
pub mod testing;

pub use broadcaster::{BroadcastReport, Broadcaster};
pub use dispatcher::{run_dispatcher, BotDeps};
pub use pacer::SendPacer;
pub use sender::{ChatSender, SendError, TelegramSender};
