// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain and wire types shared across the Rollcall workspace.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Messaging-platform user identifier.
pub type UserId = i64;

/// Event row identifier. `0` means "no event".
pub type EventId = i64;

/// Callback token carried by the "register" inline button.
pub const REGISTER_TOKEN: &str = "register";

/// Callback token carried by the "cancel my registration" inline button.
pub const REMOVE_TOKEN: &str = "remove";

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
}

// --- Events and registrations ---

/// Lifecycle state of an event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventState {
    /// Open for registration. At most one event is active at a time.
    Active,
    /// Superseded by a newer event.
    Past,
}

/// A published event with a fixed capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub date: NaiveDate,
    /// Maximum number of pre-registered attendees.
    pub capacity: i64,
    /// Current number of rows with `registered = 1`.
    pub registration_count: i64,
    pub state: EventState,
}

impl Event {
    /// Seats still available, never negative.
    pub fn remaining_seats(&self) -> i64 {
        (self.capacity - self.registration_count).max(0)
    }

    /// Whether the capacity gate is closed.
    pub fn is_full(&self) -> bool {
        self.registration_count >= self.capacity
    }
}

/// One row per (user, event) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub user_id: UserId,
    pub event_id: EventId,
    /// Contact handle (platform username), empty if the user has none.
    pub username: String,
    /// Display name as entered or taken from the platform profile.
    pub name: String,
    pub email: Option<String>,
    pub registered_at: DateTime<Utc>,
    /// Pre-registered and counted against capacity.
    pub registered: bool,
    /// Physically attended.
    pub visited: bool,
}

/// What a successful `register` call did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationWrite {
    /// A new row was inserted.
    Inserted,
    /// A cancelled or walk-in row was flipped back to registered.
    Reactivated,
}

/// What an attendance update did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitUpdate {
    /// An existing row had its `visited` flag set.
    Updated,
    /// No row existed, so a walk-in row (`registered = 0`) was created.
    WalkInCreated,
}

/// A registration joined with its event, as used by the export report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationReport {
    pub registration: Registration,
    pub event_name: String,
    pub event_date: NaiveDate,
}

/// Name and email remembered from an earlier registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
}

// --- Dialog state ---

/// Where a user currently is in the multi-turn registration dialog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display)]
pub enum DialogState {
    #[default]
    #[strum(serialize = "no-dialog")]
    NoDialog,
    #[strum(serialize = "awaiting-name")]
    AwaitingName,
    #[strum(serialize = "awaiting-email")]
    AwaitingEmail,
}

// --- Gateway types ---

/// The sender of an inbound action, as reported by the messaging platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: UserId,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
}

impl UserIdentity {
    /// "First Last", or just the first name.
    pub fn display_name(&self) -> String {
        match self.last_name.as_deref().map(str::trim) {
            Some(last) if !last.is_empty() => format!("{} {last}", self.first_name.trim()),
            _ => self.first_name.trim().to_string(),
        }
    }

    /// The username without a leading `@`, or an empty string.
    pub fn handle(&self) -> String {
        self.username
            .as_deref()
            .map(|u| u.trim_start_matches('@').to_string())
            .unwrap_or_default()
    }
}

/// What the user did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    /// A slash command, e.g. `/start imhere` is `{ name: "start", args: "imhere" }`.
    Command { name: String, args: String },
    /// An inline button press.
    Button { token: String, callback_id: String },
    /// Free text, meaningful only while a dialog is open.
    Text(String),
}

/// A user action received from the messaging gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundAction {
    pub user: UserIdentity,
    /// Chat to reply into.
    pub chat_id: i64,
    pub kind: ActionKind,
}

/// An inline button rendered under a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub token: String,
}

impl Button {
    pub fn new(label: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            token: token.into(),
        }
    }
}

/// Payload of an outbound reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyBody {
    /// Plain text message.
    Text(String),
    /// Text with a row of inline buttons.
    Prompt { text: String, buttons: Vec<Button> },
    /// Short notice attached to a button press.
    CallbackNotice { callback_id: String, text: String },
    /// A file upload.
    Document {
        file_name: String,
        bytes: Vec<u8>,
        caption: Option<String>,
    },
}

/// A reply to be delivered by the messaging gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundReply {
    pub chat_id: i64,
    pub body: ReplyBody,
}

impl OutboundReply {
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            body: ReplyBody::Text(text.into()),
        }
    }

    pub fn prompt(chat_id: i64, text: impl Into<String>, buttons: Vec<Button>) -> Self {
        Self {
            chat_id,
            body: ReplyBody::Prompt {
                text: text.into(),
                buttons,
            },
        }
    }

    pub fn notice(chat_id: i64, callback_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            body: ReplyBody::CallbackNotice {
                callback_id: callback_id.into(),
                text: text.into(),
            },
        }
    }

    /// The visible text of this reply, if it has any.
    pub fn text_content(&self) -> Option<&str> {
        match &self.body {
            ReplyBody::Text(text)
            | ReplyBody::Prompt { text, .. }
            | ReplyBody::CallbackNotice { text, .. } => Some(text),
            ReplyBody::Document { caption, .. } => caption.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn event(capacity: i64, count: i64) -> Event {
        Event {
            id: 1,
            name: "Rust meetup".into(),
            date: NaiveDate::from_ymd_opt(2026, 11, 5).unwrap(),
            capacity,
            registration_count: count,
            state: EventState::Active,
        }
    }

    #[test]
    fn event_state_uses_lowercase_names() {
        assert_eq!(EventState::Active.to_string(), "active");
        assert_eq!(EventState::from_str("past").unwrap(), EventState::Past);
        assert!(EventState::from_str("archived").is_err());
    }

    #[test]
    fn full_event_reports_zero_seats() {
        let ev = event(2, 2);
        assert!(ev.is_full());
        assert_eq!(ev.remaining_seats(), 0);
    }

    proptest! {
        #[test]
        fn remaining_seats_never_negative(capacity in 1i64..500, count in 0i64..1000) {
            let ev = event(capacity, count);
            prop_assert!(ev.remaining_seats() >= 0);
            prop_assert_eq!(ev.is_full(), ev.remaining_seats() == 0);
        }
    }

    #[test]
    fn display_name_joins_first_and_last() {
        let user = UserIdentity {
            id: 7,
            username: Some("@ada".into()),
            first_name: "Ada".into(),
            last_name: Some("Lovelace".into()),
        };
        assert_eq!(user.display_name(), "Ada Lovelace");
        assert_eq!(user.handle(), "ada");
    }

    #[test]
    fn display_name_without_last_name() {
        let user = UserIdentity {
            id: 7,
            username: None,
            first_name: "Ada".into(),
            last_name: Some("  ".into()),
        };
        assert_eq!(user.display_name(), "Ada");
        assert_eq!(user.handle(), "");
    }

    #[test]
    fn dialog_state_defaults_to_no_dialog() {
        assert_eq!(DialogState::default(), DialogState::NoDialog);
        assert_eq!(DialogState::AwaitingEmail.to_string(), "awaiting-email");
    }
}
