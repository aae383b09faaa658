//! Periodic broadcast scheduler module.
//!
//! Fires at a fixed interval and, when broadcasts are enabled, sends the
//! regular message to every tracked group.

mod runner;

pub use runner::{BroadcastScheduler, SchedulerMessage};
