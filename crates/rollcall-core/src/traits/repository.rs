// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event and registration repository contract.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::RollcallError;
use crate::types::{
    Event, EventId, Registration, RegistrationReport, RegistrationWrite, UserId, UserIdentity,
    UserProfile, VisitUpdate,
};

/// Durable records for events and registrations.
///
/// Every method is atomic on its own. "Not found" is always `None` or
/// `false`, never an error; `Err` means the store itself failed. Callers
/// that need several calls to act as one unit (capacity check, insert,
/// count) must serialize them; see `AdmissionController`.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// The single active event, if any.
    async fn latest_active_event(&self) -> Result<Option<Event>, RollcallError>;

    /// Whether `user_id` holds `registered = 1` for `event_id`, plus the row if one exists.
    async fn is_registered(
        &self,
        user_id: UserId,
        event_id: EventId,
    ) -> Result<(bool, Option<Registration>), RollcallError>;

    /// Inserts a registered row, or flips an existing unregistered row back.
    ///
    /// The `visited` flag of an existing row is preserved. Fails with
    /// [`RollcallError::DuplicateRegistration`] if the row is already registered.
    async fn register(&self, registration: &Registration)
    -> Result<RegistrationWrite, RollcallError>;

    /// Flips `registered` to 0. Returns `false` if there was nothing to flip.
    async fn unregister(&self, user_id: UserId, event_id: EventId) -> Result<bool, RollcallError>;

    /// Adds one to `registration_count`. Returns `false` if the event is
    /// missing or already at capacity.
    async fn increment_count(&self, event_id: EventId) -> Result<bool, RollcallError>;

    /// Subtracts one from `registration_count`. A no-op (returning `false`) at zero.
    async fn decrement_count(&self, event_id: EventId) -> Result<bool, RollcallError>;

    /// Sets the attendance flag, creating a walk-in row (`registered = 0`)
    /// for `user` if none exists. Never touches `registration_count`.
    async fn update_visited(
        &self,
        user: &UserIdentity,
        event_id: EventId,
        visited: bool,
    ) -> Result<VisitUpdate, RollcallError>;

    /// Moves every active event to the past state. Returns how many moved.
    async fn mark_all_active_as_past(&self) -> Result<usize, RollcallError>;

    /// Inserts a new active event. Call [`mark_all_active_as_past`] first.
    ///
    /// [`mark_all_active_as_past`]: EventRepository::mark_all_active_as_past
    async fn create_event(
        &self,
        name: &str,
        date: NaiveDate,
        capacity: i64,
    ) -> Result<Event, RollcallError>;

    /// Every registration joined with its event: newest event first, then by name.
    async fn list_registrations_with_event(&self)
    -> Result<Vec<RegistrationReport>, RollcallError>;

    /// Name and email from any earlier registration that has both set.
    async fn find_user_profile(&self, user_id: UserId)
    -> Result<Option<UserProfile>, RollcallError>;

    /// Sets the email on every row belonging to `user_id`. Returns rows changed.
    async fn update_user_email(&self, user_id: UserId, email: &str)
    -> Result<usize, RollcallError>;

    /// Number of rows with `registered = 1` for the event.
    async fn count_registered(&self, event_id: EventId) -> Result<i64, RollcallError>;

    /// Rewrites `registration_count` from the true row count (clamped to
    /// capacity). Returns `(before, after)`.
    async fn reconcile_count(&self, event_id: EventId) -> Result<(i64, i64), RollcallError>;
}
