//! Group Keeper Bot Library
//!
//! A Telegram bot that keeps group chats active with periodic broadcasts.
//!
//! This crate provides the core functionality for:
//! - Tracking the groups the bot has been added to
//! - Persisting bot state to a JSON file
//! - Handling owner commands via chat messages
//! - Broadcasting the configured message on a schedule

pub mod commands;
pub mod config;
pub mod scheduler;
pub mod state;
pub mod telegram;
pub mod tracker;
