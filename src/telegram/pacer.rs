//! Pacing between consecutive sends.
//!
//! Keeps a minimum gap between messages so a broadcast to many chats does
//! not trip the Bot API flood limits, and honors retry-after penalties
//! reported by the platform.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

/// Enforces a minimum delay between operations.
#[derive(Debug)]
pub struct SendPacer {
    /// Minimum gap between consecutive sends.
    min_gap: Duration,

    /// Earliest instant the next send is allowed.
    next_allowed: Mutex<Option<Instant>>,
}

impl SendPacer {
    /// Creates a pacer with the given minimum gap.
    #[must_use]
    pub fn new(min_gap: Duration) -> Self {
        Self {
            min_gap,
            next_allowed: Mutex::new(None),
        }
    }

    /// Waits until the next send is allowed, then reserves the slot.
    pub async fn pace(&self) {
        let mut next_allowed = self.next_allowed.lock().await;

        if let Some(deadline) = *next_allowed {
            let now = Instant::now();
            if deadline > now {
                let wait = deadline - now;
                debug!("Pacing: waiting {:?} before next send", wait);
                tokio::time::sleep(wait).await;
            }
        }

        *next_allowed = Some(Instant::now() + self.min_gap);
    }

    /// Pushes the next allowed send out by `penalty` (e.g. a platform
    /// retry-after). Does not sleep itself.
    pub async fn penalize(&self, penalty: Duration) {
        let mut next_allowed = self.next_allowed.lock().await;
        let candidate = Instant::now() + penalty;
        *next_allowed = Some(match *next_allowed {
            Some(current) if current > candidate => current,
            _ => candidate,
        });
    }
}
