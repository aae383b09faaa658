//! Standalone checker for configuration and state files.
//!
//! Validates the bot configuration and summarizes the persisted state
//! without starting the bot. Useful before deploys and after hand-edits.

use std::process::ExitCode;

use clap::Parser;

use group_keeper::config::{Config, TOKEN_PLACEHOLDER};
use group_keeper::state::BotState;

/// Configuration and state file checker.
#[derive(Parser, Debug)]
#[command(name = "check_config")]
#[command(about = "Validates group keeper configuration and state files")]
#[command(version)]
struct Args {
    /// Path to the JSON configuration file.
    #[arg(short, long, default_value = "config.json")]
    config: String,

    /// Path to the JSON state file.
    #[arg(short, long, default_value = "state.json")]
    state: String,

    /// List every tracked group in the state summary.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config_ok = check_config(&args.config);
    summarize_state(&args.state, args.verbose);

    if config_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn check_config(path: &str) -> bool {
    println!("Checking config: {path}");

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("✗ Failed to read config: {e}");
            return false;
        }
    };

    let config: Config = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("✗ Failed to parse config: {e}");
            return false;
        }
    };

    let mut ok = true;

    if config.bot_token.is_empty() || config.bot_token == TOKEN_PLACEHOLDER {
        eprintln!("✗ bot_token is missing or still the placeholder");
        ok = false;
    } else {
        println!("✓ bot_token is set");
    }

    if config.owner_ids.is_empty() {
        eprintln!("✗ owner_ids is empty; nobody can control the bot");
        ok = false;
    } else {
        println!("✓ {} owner(s) configured", config.owner_ids.len());
    }

    ok
}

fn summarize_state(path: &str, verbose: bool) {
    println!("\nState file: {path}");

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => {
            println!("  (absent - the bot will start with defaults)");
            return;
        }
    };

    let state: BotState = match serde_json::from_str(&content) {
        Ok(s) => s,
        Err(e) => {
            println!("  (malformed: {e} - the bot will start with defaults)");
            return;
        }
    };

    println!("  Broadcasts: {}", if state.broadcasts_enabled { "ON" } else { "OFF" });
    println!("  Interval:   {} min", state.interval_secs / 60);
    println!("  Message:    \"{}\"", state.regular_message);
    println!("  Groups:     {}", state.groups.len());

    if verbose {
        for (chat_id, title) in &state.groups {
            println!("    {title} ({chat_id})");
        }
    }
}
