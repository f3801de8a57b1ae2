// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./rollcall.toml` > `~/.config/rollcall/rollcall.toml`
//! > `/etc/rollcall/rollcall.toml`, with environment variable overrides via
//! the `ROLLCALL_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::RollcallConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/rollcall/rollcall.toml";

/// Config file in the working directory.
pub const LOCAL_CONFIG_PATH: &str = "rollcall.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/rollcall/rollcall.toml`
/// 3. `~/.config/rollcall/rollcall.toml`
/// 4. `./rollcall.toml`
/// 5. `ROLLCALL_*` environment variables
pub fn load_config() -> Result<RollcallConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<RollcallConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RollcallConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file, still honouring env overrides.
pub fn load_config_from_path(path: &Path) -> Result<RollcallConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RollcallConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment behind [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(RollcallConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// `~/.config/rollcall/rollcall.toml`, if the platform has a config dir.
pub fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("rollcall").join("rollcall.toml"))
}

/// Top-level sections that environment keys may address.
const SECTIONS: &[&str] = &["bot", "telegram", "storage", "registration"];

/// Environment provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `ROLLCALL_TELEGRAM_BOT_TOKEN` must map to
/// `telegram.bot_token`, not `telegram.bot.token`. Only the leading section
/// name is rewritten.
fn env_provider() -> Env {
    Env::prefixed("ROLLCALL_")
        .map(|key| env_key_to_path(&key.as_str().to_ascii_lowercase()).into())
}

/// `telegram_admin_users` -> `telegram.admin_users`. Unknown sections pass through.
pub(crate) fn env_key_to_path(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_leading_section_is_split() {
        assert_eq!(env_key_to_path("telegram_bot_token"), "telegram.bot_token");
        assert_eq!(env_key_to_path("bot_log_level"), "bot.log_level");
        assert_eq!(
            env_key_to_path("registration_mandatory_fields"),
            "registration.mandatory_fields"
        );
        assert_eq!(env_key_to_path("storage_wal_mode"), "storage.wal_mode");
    }

    #[test]
    fn unknown_sections_pass_through() {
        assert_eq!(env_key_to_path("metrics_port"), "metrics_port");
    }

    #[test]
    fn inline_toml_overrides_defaults() {
        let config = load_config_from_str("[bot]\nname = \"meetup-bot\"\n").unwrap();
        assert_eq!(config.bot.name, "meetup-bot");
        assert_eq!(config.bot.log_level, "info");
    }

    #[test]
    fn env_overrides_explicit_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "custom.toml",
                "[telegram]\nbot_token = \"from-file\"\nbot_username = \"meetup_bot\"\n",
            )?;
            jail.set_env("ROLLCALL_TELEGRAM_BOT_TOKEN", "123:from-env");
            jail.set_env("ROLLCALL_REGISTRATION_MANDATORY_FIELDS", "[name, email]");

            let config = load_config_from_path(Path::new("custom.toml"))?;
            assert_eq!(config.telegram.bot_token.as_deref(), Some("123:from-env"));
            assert_eq!(config.telegram.bot_username.as_deref(), Some("meetup_bot"));
            assert_eq!(config.registration.mandatory_fields, vec!["name", "email"]);
            Ok(())
        });
    }
}
