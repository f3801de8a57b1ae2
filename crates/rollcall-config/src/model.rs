// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Rollcall registration bot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Rollcall configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RollcallConfig {
    /// Bot identity and logging.
    #[serde(default)]
    pub bot: BotConfig,

    /// Telegram integration and the admin allow-list.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// SQLite storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Registration dialog settings.
    #[serde(default)]
    pub registration: RegistrationConfig,
}

/// Bot identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Name used in log lines and the welcome message.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_bot_name() -> String {
    "rollcall".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. Required by `rollcall serve`.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Public bot username, used to build the check-in deep link.
    #[serde(default)]
    pub bot_username: Option<String>,

    /// Telegram usernames (with or without `@`) or numeric user IDs
    /// allowed to run admin commands. Empty means nobody is an admin.
    #[serde(default, deserialize_with = "string_or_list")]
    pub admin_users: Vec<String>,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("rollcall").join("rollcall.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("rollcall.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Registration dialog configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrationConfig {
    /// Profile fields a user must provide before being admitted.
    /// Allowed values: `name`, `email` (case-insensitive).
    #[serde(default, deserialize_with = "string_or_list")]
    pub mandatory_fields: Vec<String>,
}

impl RegistrationConfig {
    /// Whether `field` is listed as mandatory, ignoring case.
    pub fn is_mandatory(&self, field: &str) -> bool {
        self.mandatory_fields
            .iter()
            .any(|f| f.trim().eq_ignore_ascii_case(field))
    }
}

/// Accepts either a TOML array or a comma-separated string.
///
/// Environment overrides arrive as plain strings, so
/// `ROLLCALL_TELEGRAM_ADMIN_USERS=alice,bob` must work as well as
/// `admin_users = ["alice", "bob"]`.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        One(String),
        Id(i64),
        Many(Vec<String>),
    }

    let items = match StringOrList::deserialize(deserializer)? {
        StringOrList::One(s) => s.split(',').map(str::to_string).collect(),
        StringOrList::Id(id) => vec![id.to_string()],
        StringOrList::Many(v) => v,
    };
    Ok(items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect())
}
