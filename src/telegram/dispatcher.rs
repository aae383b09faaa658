//! Update dispatching.
//!
//! Routes inbound platform updates to the core handlers: membership
//! changes go to the tracker, text messages to the command handler. The
//! handlers themselves never see teloxide types.

use std::sync::Arc;

use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::types::{ChatMemberKind, ChatMemberUpdated};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::broadcaster::Broadcaster;
use crate::commands::CommandHandler;
use crate::scheduler::SchedulerMessage;
use crate::state::StateStore;
use crate::tracker::{MembershipStatus, MembershipTracker};

/// Shared dependencies injected into dispatcher endpoints.
#[derive(Clone)]
pub struct BotDeps {
    pub store: Arc<StateStore>,
    pub tracker: Arc<MembershipTracker>,
    pub commands: Arc<CommandHandler>,
    pub broadcaster: Arc<Broadcaster>,
    pub scheduler_tx: mpsc::Sender<SchedulerMessage>,
}

/// Builds the dispatch tree and runs it until shutdown (ctrl-c).
pub async fn run_dispatcher(bot: Bot, deps: BotDeps) {
    let handler = dptree::entry()
        .branch(Update::filter_my_chat_member().endpoint(on_membership_update))
        .branch(Update::filter_message().endpoint(on_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![deps])
        .enable_ctrlc_handler()
        .error_handler(LoggingErrorHandler::with_custom_text("Dispatcher error"))
        .build()
        .dispatch()
        .await;
}

/// Handles a change of the bot's own membership status in a chat.
async fn on_membership_update(deps: BotDeps, update: ChatMemberUpdated) -> ResponseResult<()> {
    let chat = &update.chat;
    if !(chat.is_group() || chat.is_supergroup()) {
        return Ok(());
    }

    let status = membership_status(&update.new_chat_member.kind);
    let title = chat
        .title()
        .map_or_else(|| chat.id.to_string(), str::to_owned);

    deps.tracker.handle_transition(chat.id.0, &title, status).await;
    Ok(())
}

/// Handles an inbound text message.
async fn on_message(bot: Bot, deps: BotDeps, msg: Message) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let user_id = msg.from().map(|user| user.id.0);

    let Some(result) = deps.commands.try_handle(user_id, text).await else {
        return Ok(());
    };

    if let Some(interval) = result.reschedule {
        if deps
            .scheduler_tx
            .send(SchedulerMessage::Reschedule(interval))
            .await
            .is_err()
        {
            error!("Scheduler channel closed, reschedule dropped");
        }
    }

    // A requested broadcast is performed here; the owner gets the per-chat
    // delivery summary instead of the generic confirmation.
    let reply = if let Some(broadcast_text) = result.broadcast {
        let chats = deps.store.snapshot().await.chat_ids();
        let report = deps.broadcaster.broadcast(&chats, &broadcast_text).await;

        for chat_id in report.gone_chats() {
            match deps.store.remove_group(chat_id).await {
                Ok(true) => info!("Pruned unreachable chat {}", chat_id),
                Ok(false) => {}
                Err(e) => warn!("Failed to persist pruning of {}: {}", chat_id, e),
            }
        }

        report.summary()
    } else {
        result.message
    };

    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

/// Maps the platform's member-status kind onto the tracker's view.
fn membership_status(kind: &ChatMemberKind) -> MembershipStatus {
    match kind {
        ChatMemberKind::Owner(_) | ChatMemberKind::Administrator(_) => {
            MembershipStatus::Administrator
        }
        ChatMemberKind::Member => MembershipStatus::Member,
        ChatMemberKind::Restricted(restricted) => {
            if restricted.is_member {
                MembershipStatus::Member
            } else {
                MembershipStatus::Left
            }
        }
        ChatMemberKind::Left => MembershipStatus::Left,
        ChatMemberKind::Banned(_) => MembershipStatus::Kicked,
    }
}

impl std::fmt::Debug for BotDeps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotDeps").finish_non_exhaustive()
    }
}
