//! Group Keeper Bot - Main Entry Point
//!
//! A Telegram bot that keeps group chats active by periodically
//! broadcasting a configurable message to every group it was added to.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use teloxide::Bot;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use group_keeper::commands::CommandHandler;
use group_keeper::config::Config;
use group_keeper::scheduler::{BroadcastScheduler, SchedulerMessage};
use group_keeper::state::StateStore;
use group_keeper::telegram::{run_dispatcher, BotDeps, Broadcaster, ChatSender, TelegramSender};
use group_keeper::tracker::MembershipTracker;

/// Telegram bot that keeps group chats active with periodic broadcasts.
#[derive(Parser, Debug)]
#[command(name = "group_keeper")]
#[command(about = "Keep Telegram groups active with periodic broadcasts")]
#[command(version)]
struct Args {
    /// Path to the JSON configuration file (bot token + owner ids).
    #[arg(short, long, default_value = "config.json")]
    config: String,

    /// Path to the JSON state file (tracked groups, message, flags).
    #[arg(short, long, default_value = "state.json")]
    state: String,

    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Generate a template configuration file and exit.
    #[arg(long)]
    generate_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    if args.generate_config {
        return generate_template_config(&args.config);
    }

    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    // The only fatal error in the process: a usable credential and owner
    // list are required to do anything at all.
    let config = Config::load(&args.config).context("Failed to load configuration")?;
    info!("Configuration loaded ({} owner(s))", config.owner_ids.len());

    let store = Arc::new(StateStore::load(&args.state));
    {
        let state = store.snapshot().await;
        info!(
            "State loaded: {} tracked group(s), broadcasts {} every {} min",
            state.groups.len(),
            if state.broadcasts_enabled { "on" } else { "off" },
            state.interval_secs / 60,
        );
    }

    let bot = Bot::new(&config.bot_token);
    let sender = Arc::new(TelegramSender::new(bot.clone()));
    let broadcaster = Arc::new(Broadcaster::new(sender as Arc<dyn ChatSender>));

    let tracker = Arc::new(MembershipTracker::new(Arc::clone(&store)));
    let commands = Arc::new(CommandHandler::new(
        config.owner_ids.clone(),
        Arc::clone(&store),
    ));

    let (scheduler_tx, scheduler_rx) = mpsc::channel::<SchedulerMessage>(32);

    let scheduler = BroadcastScheduler::new(Arc::clone(&store), Arc::clone(&broadcaster));
    let scheduler_handle = tokio::spawn(async move {
        scheduler.run(scheduler_rx).await;
    });

    info!("Group keeper bot starting...");

    let deps = BotDeps {
        store,
        tracker,
        commands,
        broadcaster,
        scheduler_tx: scheduler_tx.clone(),
    };

    // Blocks until ctrl-c stops the dispatcher.
    run_dispatcher(bot, deps).await;

    info!("Shutting down...");
    let _ = scheduler_tx.send(SchedulerMessage::Shutdown).await;
    let _ = scheduler_handle.await;

    Ok(())
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Generates a template configuration file.
fn generate_template_config(path: &str) -> Result<()> {
    Config::template()
        .save_to_file(path)
        .context("Failed to write template config")?;

    println!("✓ Template configuration written to: {path}");
    println!("\nTo use this bot:");
    println!("1. Create a bot with @BotFather and copy the token");
    println!("2. Fill in bot_token and owner_ids in {path}");
    println!("3. Run: group_keeper");

    Ok(())
}
