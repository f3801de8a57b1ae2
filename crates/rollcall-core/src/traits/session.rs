// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user dialog state container.

use crate::types::{DialogState, EventId, UserId};

/// Holds each user's dialog state and in-progress form answers.
///
/// Implementations are pure containers: no validation and no I/O. All
/// methods must be callable from many threads at once and must never fail.
pub trait SessionStore: Send + Sync {
    /// Upserts the state tag and the event the dialog belongs to.
    fn set_state(&self, user_id: UserId, state: DialogState, event_id: EventId);

    /// The user's state, or `(NoDialog, 0)` for an unknown user.
    fn get_state(&self, user_id: UserId) -> (DialogState, EventId);

    /// Stores one form answer, creating the record if needed.
    fn set_data(&self, user_id: UserId, key: &str, value: &str);

    /// One form answer, or an empty string if missing.
    fn get_data(&self, user_id: UserId, key: &str) -> String;

    /// Forgets everything about the user.
    fn clear_state(&self, user_id: UserId);

    /// Number of users with a record.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
