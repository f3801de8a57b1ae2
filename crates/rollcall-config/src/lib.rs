// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Rollcall registration bot.
//!
//! TOML files in the XDG hierarchy, `ROLLCALL_*` environment overrides,
//! strict unknown-key rejection and miette diagnostics with typo suggestions.
//!
//! ```no_run
//! use rollcall_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("database: {}", config.storage.database_path);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::RollcallConfig;

/// Load from the XDG hierarchy plus env, then validate.
pub fn load_and_validate() -> Result<RollcallConfig, Vec<ConfigError>> {
    finish(loader::load_config(), collect_toml_sources)
}

/// Load a single explicit file plus env, then validate.
pub fn load_and_validate_path(path: &Path) -> Result<RollcallConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        read_source(path).into_iter().collect()
    })
}

/// Load from an inline TOML string, then validate. Used by tests.
pub fn load_and_validate_str(toml_content: &str) -> Result<RollcallConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

fn finish(
    loaded: Result<RollcallConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<RollcallConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        // Files are only read back for span resolution when something failed.
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

fn read_source(path: &Path) -> Option<(String, String)> {
    let content = std::fs::read_to_string(path).ok()?;
    Some((path.display().to_string(), content))
}

/// `(path, content)` for every config file in the hierarchy that exists.
fn collect_toml_sources() -> Vec<(String, String)> {
    let local = std::env::current_dir()
        .map(|d| d.join(loader::LOCAL_CONFIG_PATH))
        .unwrap_or_else(|_| loader::LOCAL_CONFIG_PATH.into());

    [
        Some(local),
        loader::user_config_path(),
        Some(loader::SYSTEM_CONFIG_PATH.into()),
    ]
    .into_iter()
    .flatten()
    .filter_map(|path| read_source(&path))
    .collect()
}
