// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `rollcall serve` command implementation.
//!
//! Opens SQLite storage, repairs the active event's count, connects the
//! Telegram channel, and runs the bot loop until SIGINT/SIGTERM.

use std::sync::Arc;

use rollcall_agent::{BotLoop, Dispatcher, InMemorySessionStore, shutdown};
use rollcall_config::RollcallConfig;
use rollcall_core::error::RollcallError;
use rollcall_core::types::HealthStatus;
use rollcall_core::{ChannelAdapter, PluginAdapter, StorageAdapter};
use rollcall_storage::SqliteStorage;
use rollcall_telegram::TelegramChannel;
use tracing::{info, warn};

/// Crates whose logs follow `bot.log_level`; everything else logs at `warn`.
const LOG_TARGETS: [&str; 5] = [
    "rollcall",
    "rollcall_agent",
    "rollcall_config",
    "rollcall_storage",
    "rollcall_telegram",
];

/// Runs the `rollcall serve` command.
pub async fn run_serve(config: RollcallConfig) -> Result<(), RollcallError> {
    init_tracing(&config.bot.log_level);

    info!(bot = config.bot.name.as_str(), "starting rollcall serve");

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;

    let dispatcher = Arc::new(Dispatcher::new(
        storage.clone(),
        Arc::new(InMemorySessionStore::new()),
        &config,
    ));

    // Crash recovery: a crash between the row write and the count update
    // leaves the count off by one.
    match dispatcher.admission().reconcile_active().await {
        Ok(Some((before, after))) => info!(before, after, "active event count reconciled"),
        Ok(None) => info!("no active event; registration is closed until /addevent"),
        Err(e) => warn!(error = %e, "count reconciliation failed, continuing"),
    }

    let mut channel = TelegramChannel::new(&config.telegram)?;
    match channel.health_check().await? {
        HealthStatus::Healthy => info!("Telegram bot reachable"),
        status => warn!(?status, "Telegram health check did not pass, continuing"),
    }
    channel.connect().await?;
    if config.telegram.bot_username.is_none() {
        warn!("telegram.bot_username is not set; /qrcode is unavailable");
    }

    let cancel = shutdown::install_signal_handler();

    let bot = BotLoop::new(Arc::new(channel), dispatcher, storage);
    bot.run(cancel).await?;

    info!("rollcall serve shutdown complete");
    Ok(())
}

fn default_filter(log_level: &str) -> String {
    let mut directives: Vec<String> = LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={log_level}"))
        .collect();
    directives.push("warn".to_string());
    directives.join(",")
}

/// Initializes the tracing subscriber with the given log level.
///
/// `RUST_LOG` takes precedence when set.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(log_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}
