// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory event repository for fast unit tests.
//!
//! `InMemoryRepository` mirrors the SQLite adapter's semantics (capacity
//! guard on increment, one active event, walk-in rows) and can be told to
//! fail the next write to exercise error paths.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use rollcall_core::types::{
    Event, EventId, EventState, Registration, RegistrationReport, RegistrationWrite, UserId,
    UserIdentity, UserProfile, VisitUpdate,
};
use rollcall_core::{EventRepository, RollcallError};

#[derive(Default)]
struct State {
    events: BTreeMap<EventId, Event>,
    rows: HashMap<(UserId, EventId), Registration>,
    next_id: EventId,
    fail_increment: bool,
    fail_decrement: bool,
    fail_create: bool,
}

fn injected(what: &str) -> RollcallError {
    RollcallError::storage(std::io::Error::other(format!("injected {what} failure")))
}

/// A mock event store backed by maps.
#[derive(Default)]
pub struct InMemoryRepository {
    state: Mutex<State>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `increment_count` call fails with a storage error.
    pub fn fail_next_increment(&self) {
        self.lock().fail_increment = true;
    }

    /// The next `decrement_count` call fails with a storage error.
    pub fn fail_next_decrement(&self) {
        self.lock().fail_decrement = true;
    }

    /// The next `create_event` call fails with a storage error.
    pub fn fail_next_create(&self) {
        self.lock().fail_create = true;
    }

    /// Any event by id, active or past.
    pub fn event(&self, id: EventId) -> Option<Event> {
        self.lock().events.get(&id).cloned()
    }

    /// The row for one user and event, registered or not.
    pub fn registration(&self, user_id: UserId, event_id: EventId) -> Option<Registration> {
        self.lock().rows.get(&(user_id, event_id)).cloned()
    }

    /// Overwrite an event's count, bypassing the capacity guard.
    pub fn force_count(&self, event_id: EventId, count: i64) {
        if let Some(event) = self.lock().events.get_mut(&event_id) {
            event.registration_count = count;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl EventRepository for InMemoryRepository {
    async fn latest_active_event(&self) -> Result<Option<Event>, RollcallError> {
        Ok(self
            .lock()
            .events
            .values()
            .filter(|e| e.state == EventState::Active)
            .max_by_key(|e| (e.date, e.id))
            .cloned())
    }

    async fn is_registered(
        &self,
        user_id: UserId,
        event_id: EventId,
    ) -> Result<(bool, Option<Registration>), RollcallError> {
        let row = self.lock().rows.get(&(user_id, event_id)).cloned();
        Ok((row.as_ref().is_some_and(|r| r.registered), row))
    }

    async fn register(
        &self,
        registration: &Registration,
    ) -> Result<RegistrationWrite, RollcallError> {
        let mut state = self.lock();
        let key = (registration.user_id, registration.event_id);
        match state.rows.get_mut(&key) {
            Some(row) if row.registered => Err(RollcallError::DuplicateRegistration {
                user_id: key.0,
                event_id: key.1,
            }),
            Some(row) => {
                let visited = row.visited;
                *row = Registration {
                    registered: true,
                    visited,
                    ..registration.clone()
                };
                Ok(RegistrationWrite::Reactivated)
            }
            None => {
                state.rows.insert(
                    key,
                    Registration {
                        registered: true,
                        ..registration.clone()
                    },
                );
                Ok(RegistrationWrite::Inserted)
            }
        }
    }

    async fn unregister(&self, user_id: UserId, event_id: EventId) -> Result<bool, RollcallError> {
        Ok(match self.lock().rows.get_mut(&(user_id, event_id)) {
            Some(row) if row.registered => {
                row.registered = false;
                true
            }
            _ => false,
        })
    }

    async fn increment_count(&self, event_id: EventId) -> Result<bool, RollcallError> {
        let mut state = self.lock();
        if std::mem::take(&mut state.fail_increment) {
            return Err(injected("increment"));
        }
        Ok(match state.events.get_mut(&event_id) {
            Some(event) if event.registration_count < event.capacity => {
                event.registration_count += 1;
                true
            }
            _ => false,
        })
    }

    async fn decrement_count(&self, event_id: EventId) -> Result<bool, RollcallError> {
        let mut state = self.lock();
        if std::mem::take(&mut state.fail_decrement) {
            return Err(injected("decrement"));
        }
        Ok(match state.events.get_mut(&event_id) {
            Some(event) if event.registration_count > 0 => {
                event.registration_count -= 1;
                true
            }
            _ => false,
        })
    }

    async fn update_visited(
        &self,
        user: &UserIdentity,
        event_id: EventId,
        visited: bool,
    ) -> Result<VisitUpdate, RollcallError> {
        let mut state = self.lock();
        if let Some(row) = state.rows.get_mut(&(user.id, event_id)) {
            row.visited = visited;
            return Ok(VisitUpdate::Updated);
        }
        state.rows.insert(
            (user.id, event_id),
            Registration {
                user_id: user.id,
                event_id,
                username: user.handle(),
                name: user.display_name(),
                email: None,
                registered_at: Utc::now(),
                registered: false,
                visited,
            },
        );
        Ok(VisitUpdate::WalkInCreated)
    }

    async fn mark_all_active_as_past(&self) -> Result<usize, RollcallError> {
        let mut moved = 0;
        for event in self.lock().events.values_mut() {
            if event.state == EventState::Active {
                event.state = EventState::Past;
                moved += 1;
            }
        }
        Ok(moved)
    }

    async fn create_event(
        &self,
        name: &str,
        date: NaiveDate,
        capacity: i64,
    ) -> Result<Event, RollcallError> {
        let mut state = self.lock();
        if std::mem::take(&mut state.fail_create) {
            return Err(injected("create"));
        }
        if capacity <= 0 {
            return Err(RollcallError::InvalidInput(format!(
                "capacity must be positive, got {capacity}"
            )));
        }
        if state.events.values().any(|e| e.state == EventState::Active) {
            return Err(RollcallError::storage(std::io::Error::other(
                "UNIQUE constraint failed: another event is active",
            )));
        }
        state.next_id += 1;
        let event = Event {
            id: state.next_id,
            name: name.to_string(),
            date,
            capacity,
            registration_count: 0,
            state: EventState::Active,
        };
        state.events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn list_registrations_with_event(
        &self,
    ) -> Result<Vec<RegistrationReport>, RollcallError> {
        let state = self.lock();
        let mut reports: Vec<(EventId, RegistrationReport)> = state
            .rows
            .values()
            .filter_map(|r| {
                let event = state.events.get(&r.event_id)?;
                Some((
                    event.id,
                    RegistrationReport {
                        registration: r.clone(),
                        event_name: event.name.clone(),
                        event_date: event.date,
                    },
                ))
            })
            .collect();
        reports.sort_by(|(a_id, a), (b_id, b)| {
            b.event_date
                .cmp(&a.event_date)
                .then(b_id.cmp(a_id))
                .then_with(|| a.registration.name.cmp(&b.registration.name))
                .then(a.registration.user_id.cmp(&b.registration.user_id))
        });
        Ok(reports.into_iter().map(|(_, r)| r).collect())
    }

    async fn find_user_profile(
        &self,
        user_id: UserId,
    ) -> Result<Option<UserProfile>, RollcallError> {
        let state = self.lock();
        let mut rows: Vec<&Registration> = state
            .rows
            .values()
            .filter(|r| r.user_id == user_id && !r.name.is_empty())
            .filter(|r| r.email.as_deref().is_some_and(|e| !e.is_empty()))
            .collect();
        rows.sort_by_key(|r| std::cmp::Reverse(r.registered_at));
        Ok(rows.first().map(|r| UserProfile {
            name: r.name.clone(),
            email: r.email.clone().unwrap_or_default(),
        }))
    }

    async fn update_user_email(
        &self,
        user_id: UserId,
        email: &str,
    ) -> Result<usize, RollcallError> {
        let mut changed = 0;
        for row in self.lock().rows.values_mut().filter(|r| r.user_id == user_id) {
            row.email = Some(email.to_string());
            changed += 1;
        }
        Ok(changed)
    }

    async fn count_registered(&self, event_id: EventId) -> Result<i64, RollcallError> {
        Ok(self
            .lock()
            .rows
            .values()
            .filter(|r| r.event_id == event_id && r.registered)
            .count() as i64)
    }

    async fn reconcile_count(&self, event_id: EventId) -> Result<(i64, i64), RollcallError> {
        let actual = self.count_registered(event_id).await?;
        let mut state = self.lock();
        let event = state.events.get_mut(&event_id).ok_or_else(|| {
            RollcallError::Internal(format!("event {event_id} not found"))
        })?;
        let before = event.registration_count;
        event.registration_count = actual.min(event.capacity);
        Ok((before, event.registration_count))
    }
}
