// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-to-miette error bridge.
//!
//! Turns extraction failures into diagnostics that point at the offending
//! line of `rollcall.toml` and suggest the closest valid key.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score a valid key must beat to be offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration problem, renderable by miette.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(rollcall::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        /// Comma-separated keys accepted in the same section.
        valid_keys: String,
        #[label("not a recognized key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(rollcall::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(rollcall::config::missing_key),
        help("add `{key} = <value>` to rollcall.toml or set it through ROLLCALL_*")
    )]
    MissingKey { key: String },

    /// A value that parsed but makes no sense.
    #[error("validation error: {message}")]
    #[diagnostic(code(rollcall::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(rollcall::config::other))]
    Other(String),
}

impl ConfigError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Convert every error inside a `figment::Error` into a [`ConfigError`].
///
/// `toml_sources` holds `(path, content)` pairs used to attach source spans
/// to unknown-key errors.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| match &error.kind {
            Kind::UnknownField(field, expected) => {
                let (span, src) = locate(&error, field, toml_sources);
                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion: suggest_key(field, expected),
                    valid_keys: expected.join(", "),
                    span,
                    src,
                }
            }
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: field.to_string(),
            },
            Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                key: error.path.join("."),
                detail: format!("found {actual}, expected {expected}"),
                expected: expected.clone(),
            },
            _ => ConfigError::Other(error.to_string()),
        })
        .collect()
}

/// Span and source text for `field`, if the error came from a file we read.
fn locate(
    error: &figment::error::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let from_file = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|source| match source {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    // Inline sources carry no file metadata; fall back to a single source.
    let candidate = match from_file {
        Some(path) => toml_sources.iter().find(|(p, _)| *p == path),
        None if toml_sources.len() == 1 => toml_sources.first(),
        None => None,
    };

    let Some((path, content)) = candidate else {
        return (None, None);
    };
    match find_key_offset(content, &error.path, field) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), field.len())),
            Some(NamedSource::new(path, content.clone())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `field` inside the `[section]` named by `path[0]`,
/// or from the top of the file when `path` is empty.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let start = match path.first() {
        Some(section) => {
            let header = format!("[{section}]");
            content.find(&header)? + header.len()
        }
        None => 0,
    };

    let mut offset = start;
    for line in content[start..].split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') && offset != start {
            // Next section: the key is not in this one.
            return None;
        }
        if let Some(after) = trimmed.strip_prefix(field)
            && after.trim_start().starts_with('=')
        {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }
    None
}

/// Closest valid key by Jaro-Winkler similarity, if any is close enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Render diagnostics to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        match handler.render_report(&mut buf, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{buf}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}
