// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Rollcall registration bot.

use thiserror::Error;

/// The primary error type used across all Rollcall adapters and core operations.
///
/// Admission outcomes (`RegistrationClosed`, `AlreadyRegistered`, ...) are
/// expected results of user actions, not faults. Only `Storage`, `Channel`,
/// and `Internal` indicate that something went wrong underneath.
#[derive(Debug, Error)]
pub enum RollcallError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Persistence failure in the event/registration store.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Messaging gateway errors (connection failure, rejected request).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// No active event, or the active event is full.
    #[error("registration is closed")]
    RegistrationClosed,

    /// An action that needs an active event was attempted without one.
    #[error("no active event")]
    NoActiveEvent,

    /// The user already holds a registration for the active event.
    #[error("user {user_id} is already registered for event {event_id}")]
    AlreadyRegistered { user_id: i64, event_id: i64 },

    /// The user tried to cancel a registration they do not hold.
    #[error("user {user_id} is not registered for event {event_id}")]
    NotRegistered { user_id: i64, event_id: i64 },

    /// The store already has a row with `registered = 1` for this pair.
    #[error("duplicate registration for user {user_id} and event {event_id}")]
    DuplicateRegistration { user_id: i64, event_id: i64 },

    /// An admin-only action was attempted by a non-admin.
    #[error("unauthorized: {action} requires admin rights")]
    Unauthorized { action: String },

    /// User-supplied input failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RollcallError {
    /// Wraps any store error as a persistence failure.
    pub fn storage(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage {
            source: Box::new(source),
        }
    }

    /// Returns `true` for outcomes caused by the user's request rather than a fault.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::RegistrationClosed
                | Self::NoActiveEvent
                | Self::AlreadyRegistered { .. }
                | Self::NotRegistered { .. }
                | Self::DuplicateRegistration { .. }
                | Self::Unauthorized { .. }
                | Self::InvalidInput(_)
        )
    }

    /// The single reply shown to the user for this error.
    ///
    /// Fault variants collapse to a generic message; their details only go to the log.
    pub fn user_message(&self) -> String {
        match self {
            Self::RegistrationClosed => "Registration is closed.".to_string(),
            Self::NoActiveEvent => "There is no active event right now.".to_string(),
            Self::AlreadyRegistered { .. } | Self::DuplicateRegistration { .. } => {
                "You are already registered.".to_string()
            }
            Self::NotRegistered { .. } => "You are not registered.".to_string(),
            Self::Unauthorized { .. } => {
                "Sorry, only administrators can do that.".to_string()
            }
            Self::InvalidInput(reason) => reason.clone(),
            Self::Config(_) | Self::Storage { .. } | Self::Channel { .. } | Self::Internal(_) => {
                "Something went wrong on our side. Please try again later.".to_string()
            }
        }
    }
}
