//! Broadcast scheduler runner.
//!
//! Each firing follows the same shape:
//! 1. Snapshot the state (groups, message, enabled flag)
//! 2. If disabled or no groups -> skip
//! 3. Fan out the regular message through the broadcaster
//! 4. Prune chats that reported the bot gone, then persist
//!
//! Firings run to completion inside the select loop and the interval uses
//! delayed missed-tick behavior, so two firings can never overlap or burst.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::state::StateStore;
use crate::telegram::Broadcaster;

/// Messages that can be sent to the scheduler.
#[derive(Debug, Clone)]
pub enum SchedulerMessage {
    /// Fire a broadcast now (still honors the enabled flag).
    TriggerBroadcast,
    /// Change the firing interval.
    Reschedule(Duration),
    /// Stop the scheduler.
    Shutdown,
}

/// Periodic broadcast scheduler.
pub struct BroadcastScheduler {
    /// Shared bot state.
    store: Arc<StateStore>,

    /// Fan-out used for the sends.
    broadcaster: Arc<Broadcaster>,
}

impl BroadcastScheduler {
    /// Creates a new broadcast scheduler.
    #[must_use]
    pub fn new(store: Arc<StateStore>, broadcaster: Arc<Broadcaster>) -> Self {
        Self { store, broadcaster }
    }

    /// Runs the scheduler loop until shutdown.
    pub async fn run(&self, mut rx: mpsc::Receiver<SchedulerMessage>) {
        let period = self.store.snapshot().await.interval();
        info!("Broadcast scheduler started (interval: {:?})", period);

        let mut timer = new_timer(period);

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    self.fire().await;
                }
                msg = rx.recv() => {
                    match msg {
                        Some(SchedulerMessage::TriggerBroadcast) => {
                            debug!("Received trigger message");
                            self.fire().await;
                        }
                        Some(SchedulerMessage::Reschedule(period)) => {
                            info!("Rescheduling broadcasts every {:?}", period);
                            timer = new_timer(period);
                        }
                        Some(SchedulerMessage::Shutdown) | None => {
                            info!("Scheduler shutting down");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Single firing of the scheduler.
    async fn fire(&self) {
        let state = self.store.snapshot().await;

        if !state.broadcasts_enabled {
            trace!("Broadcasts disabled, skipping firing");
            return;
        }
        if state.groups.is_empty() {
            trace!("No tracked groups, skipping firing");
            return;
        }

        let chats = state.chat_ids();
        debug!("Broadcasting to {} groups", chats.len());

        let report = self
            .broadcaster
            .broadcast(&chats, &state.regular_message)
            .await;

        // Chats that said the bot is gone are pruned so the tracked set
        // converges without owner intervention.
        for chat_id in report.gone_chats() {
            match self.store.remove_group(chat_id).await {
                Ok(true) => info!("Pruned unreachable chat {}", chat_id),
                Ok(false) => {}
                Err(e) => warn!("Failed to persist pruning of {}: {}", chat_id, e),
            }
        }
    }
}

/// Builds an interval timer whose first tick is consumed, so the first
/// broadcast happens one full period after startup.
fn new_timer(period: Duration) -> tokio::time::Interval {
    let mut timer = interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer.reset();
    timer
}

impl std::fmt::Debug for BroadcastScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastScheduler").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::telegram::testing::MockSender;
    use crate::telegram::ChatSender;

    fn scheduler_with(
        sender: Arc<MockSender>,
    ) -> (tempfile::TempDir, Arc<StateStore>, BroadcastScheduler) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(StateStore::load(dir.path().join("state.json")));
        let broadcaster = Arc::new(Broadcaster::new(sender as Arc<dyn ChatSender>));
        let scheduler = BroadcastScheduler::new(Arc::clone(&store), broadcaster);
        (dir, store, scheduler)
    }

    #[tokio::test]
    async fn test_firing_sends_regular_message() {
        let sender = Arc::new(MockSender::default());
        let (_dir, store, scheduler) = scheduler_with(Arc::clone(&sender));

        store.add_group(111, "Group").await.unwrap();
        store.set_regular_message("Stay active!").await.unwrap();

        scheduler.fire().await;

        let sent = sender.sent.lock().unwrap().clone();
        assert_eq!(sent, vec![(111, "Stay active!".to_owned())]);
    }

    #[tokio::test]
    async fn test_disabled_firing_sends_nothing() {
        let sender = Arc::new(MockSender::default());
        let (_dir, store, scheduler) = scheduler_with(Arc::clone(&sender));

        store.add_group(111, "Group").await.unwrap();
        store.set_enabled(false).await.unwrap();

        scheduler.fire().await;
        assert!(sender.sent.lock().unwrap().is_empty());

        // Re-enabling makes the next firing send again.
        store.set_enabled(true).await.unwrap();
        scheduler.fire().await;
        assert_eq!(sender.sent_chats(), vec![111]);
    }

    #[tokio::test]
    async fn test_gone_chat_is_pruned() {
        let sender = Arc::new(MockSender {
            gone_chats: HashSet::from([222]),
            ..Default::default()
        });
        let (_dir, store, scheduler) = scheduler_with(Arc::clone(&sender));

        store.add_group(111, "Alive").await.unwrap();
        store.add_group(222, "Gone").await.unwrap();

        scheduler.fire().await;

        assert_eq!(sender.sent_chats(), vec![111]);
        assert_eq!(store.snapshot().await.chat_ids(), vec![111]);
    }

    #[tokio::test]
    async fn test_transient_failure_does_not_prune() {
        let sender = Arc::new(MockSender {
            fail_chats: HashSet::from([222]),
            ..Default::default()
        });
        let (_dir, store, scheduler) = scheduler_with(Arc::clone(&sender));

        store.add_group(111, "Alive").await.unwrap();
        store.add_group(222, "Flaky").await.unwrap();

        scheduler.fire().await;

        assert_eq!(sender.sent_chats(), vec![111]);
        assert_eq!(store.snapshot().await.chat_ids(), vec![111, 222]);
    }

    #[tokio::test]
    async fn test_trigger_message_fires_immediately() {
        let sender = Arc::new(MockSender::default());
        let (_dir, store, scheduler) = scheduler_with(Arc::clone(&sender));

        store.add_group(111, "Group").await.unwrap();

        let (tx, rx) = mpsc::channel(4);
        tx.send(SchedulerMessage::TriggerBroadcast).await.unwrap();
        tx.send(SchedulerMessage::Shutdown).await.unwrap();

        tokio::time::timeout(Duration::from_secs(1), scheduler.run(rx))
            .await
            .unwrap();

        assert_eq!(sender.sent_chats(), vec![111]);
    }

    #[tokio::test]
    async fn test_shutdown_stops_run_loop() {
        let sender = Arc::new(MockSender::default());
        let (_dir, _store, scheduler) = scheduler_with(sender);

        let (tx, rx) = mpsc::channel(4);
        tx.send(SchedulerMessage::Shutdown).await.unwrap();

        // Completes only if the loop honors the shutdown message.
        tokio::time::timeout(Duration::from_secs(1), scheduler.run(rx))
            .await
            .unwrap();
    }
}
