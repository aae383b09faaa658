//! Bot state and persistence.
//!
//! The whole bot state lives in a single small JSON document that is
//! rewritten after every mutation. Loading is tolerant: a missing file or
//! missing fields fall back to defaults so that first runs and upgrades
//! from older state files just work.

mod store;

pub use store::{BotState, StateError, StateStore, DEFAULT_INTERVAL_SECS, DEFAULT_REGULAR_MESSAGE};
