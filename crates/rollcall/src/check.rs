// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `rollcall check` command implementation.
//!
//! Runs diagnostic checks against the loaded configuration and the
//! database: Telegram settings, admin list, schema, and the active
//! event's count against its registration rows.

use std::time::{Duration, Instant};

use rollcall_config::RollcallConfig;
use rollcall_core::error::RollcallError;
use rollcall_core::{EventRepository, StorageAdapter};
use rollcall_storage::SqliteStorage;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, started: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: started.elapsed(),
        }
    }
}

/// Run the `rollcall check` command. Fails if any check failed.
pub async fn run_check(config: &RollcallConfig) -> Result<(), RollcallError> {
    let results = collect_checks(config).await;

    println!();
    println!("  rollcall check");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    let mut warn_count = 0;
    for result in &results {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => {
                warn_count += 1;
                "[WARN]"
            }
            CheckStatus::Fail => {
                fail_count += 1;
                "[FAIL]"
            }
        };
        println!(
            "    {tag} {:<20} {} ({}ms)",
            result.name,
            result.message,
            result.duration.as_millis()
        );
    }

    println!();
    println!(
        "  {} checks, {fail_count} failed, {warn_count} warnings",
        results.len()
    );

    if fail_count > 0 {
        return Err(RollcallError::Internal(format!("{fail_count} check(s) failed")));
    }
    Ok(())
}

/// Runs every check without printing.
pub async fn collect_checks(config: &RollcallConfig) -> Vec<CheckResult> {
    let mut results = vec![
        check_telegram(config),
        check_admins(config),
        check_bot_username(config),
    ];
    results.extend(check_database(config).await);
    results
}

fn check_telegram(config: &RollcallConfig) -> CheckResult {
    let started = Instant::now();
    match config.telegram.bot_token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => {
            CheckResult::new("telegram token", CheckStatus::Pass, "set", started)
        }
        _ => CheckResult::new(
            "telegram token",
            CheckStatus::Fail,
            "telegram.bot_token is not set (ROLLCALL_TELEGRAM_BOT_TOKEN)",
            started,
        ),
    }
}

fn check_admins(config: &RollcallConfig) -> CheckResult {
    let started = Instant::now();
    let count = config.telegram.admin_users.len();
    if count == 0 {
        CheckResult::new(
            "admins",
            CheckStatus::Warn,
            "telegram.admin_users is empty; nobody can publish events",
            started,
        )
    } else {
        CheckResult::new("admins", CheckStatus::Pass, format!("{count} configured"), started)
    }
}

fn check_bot_username(config: &RollcallConfig) -> CheckResult {
    let started = Instant::now();
    match &config.telegram.bot_username {
        Some(name) => CheckResult::new("bot username", CheckStatus::Pass, name.clone(), started),
        None => CheckResult::new(
            "bot username",
            CheckStatus::Warn,
            "telegram.bot_username is not set; /qrcode is unavailable",
            started,
        ),
    }
}

async fn check_database(config: &RollcallConfig) -> Vec<CheckResult> {
    let started = Instant::now();
    let storage = SqliteStorage::new(config.storage.clone());
    if let Err(e) = storage.initialize().await {
        return vec![CheckResult::new(
            "database",
            CheckStatus::Fail,
            format!("{}: {e}", config.storage.database_path),
            started,
        )];
    }
    let mut results = vec![CheckResult::new(
        "database",
        CheckStatus::Pass,
        format!("{} (schema up to date)", config.storage.database_path),
        started,
    )];

    let started = Instant::now();
    let event_check = match storage.latest_active_event().await {
        Ok(None) => CheckResult::new(
            "active event",
            CheckStatus::Warn,
            "none; registration is closed",
            started,
        ),
        Ok(Some(event)) => match storage.count_registered(event.id).await {
            Ok(rows) if rows == event.registration_count => CheckResult::new(
                "active event",
                CheckStatus::Pass,
                format!(
                    "{} on {}: {}/{} seats taken",
                    event.name, event.date, event.registration_count, event.capacity
                ),
                started,
            ),
            Ok(rows) => CheckResult::new(
                "active event",
                CheckStatus::Warn,
                format!(
                    "count {} differs from {rows} registered rows; repaired on next serve",
                    event.registration_count
                ),
                started,
            ),
            Err(e) => CheckResult::new("active event", CheckStatus::Fail, e.to_string(), started),
        },
        Err(e) => CheckResult::new("active event", CheckStatus::Fail, e.to_string(), started),
    };
    results.push(event_check);

    if let Err(e) = storage.close().await {
        results.push(CheckResult::new(
            "database close",
            CheckStatus::Fail,
            e.to_string(),
            Instant::now(),
        ));
    }
    results
}
