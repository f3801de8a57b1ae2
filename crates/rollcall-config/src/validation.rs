// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::RollcallConfig;

/// Profile fields the registration dialog knows how to collect.
pub const KNOWN_PROFILE_FIELDS: &[&str] = &["name", "email"];

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Collects every problem instead of stopping at the first.
pub fn validate_config(config: &RollcallConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.bot.log_level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "bot.log_level `{}` is not one of {}",
            config.bot.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    if config.bot.name.trim().is_empty() {
        errors.push(ConfigError::validation("bot.name must not be empty"));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    for field in &config.registration.mandatory_fields {
        if !KNOWN_PROFILE_FIELDS
            .iter()
            .any(|known| field.eq_ignore_ascii_case(known))
        {
            errors.push(ConfigError::validation(format!(
                "registration.mandatory_fields contains `{field}`; allowed values are {}",
                KNOWN_PROFILE_FIELDS.join(", ")
            )));
        }
    }

    if let Some(username) = &config.telegram.bot_username
        && username.trim_start_matches('@').trim().is_empty()
    {
        errors.push(ConfigError::validation(
            "telegram.bot_username must not be empty when set",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
