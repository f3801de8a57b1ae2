// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory dialog state per user.
//!
//! Records are created lazily by the first write and removed when a dialog
//! completes or is cancelled. Nothing here survives a restart.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use rollcall_core::SessionStore;
use rollcall_core::types::{DialogState, EventId, UserId};

#[derive(Debug, Default)]
struct UserSession {
    state: DialogState,
    event_id: EventId,
    data: HashMap<String, String>,
}

/// [`SessionStore`] backed by one `RwLock<HashMap>`.
///
/// The lock guards only the map access and is never held across an await.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<UserId, UserSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave a half-written entry
    // behind, so poisoned guards are safe to reuse.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<UserId, UserSession>> {
        self.sessions.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<UserId, UserSession>> {
        self.sessions.write().unwrap_or_else(|p| p.into_inner())
    }
}

impl SessionStore for InMemorySessionStore {
    fn set_state(&self, user_id: UserId, state: DialogState, event_id: EventId) {
        let mut sessions = self.write();
        let session = sessions.entry(user_id).or_default();
        session.state = state;
        session.event_id = event_id;
    }

    fn get_state(&self, user_id: UserId) -> (DialogState, EventId) {
        self.read()
            .get(&user_id)
            .map(|s| (s.state, s.event_id))
            .unwrap_or_default()
    }

    fn set_data(&self, user_id: UserId, key: &str, value: &str) {
        self.write()
            .entry(user_id)
            .or_default()
            .data
            .insert(key.to_string(), value.to_string());
    }

    fn get_data(&self, user_id: UserId, key: &str) -> String {
        self.read()
            .get(&user_id)
            .and_then(|s| s.data.get(key).cloned())
            .unwrap_or_default()
    }

    fn clear_state(&self, user_id: UserId) {
        self.write().remove(&user_id);
    }

    fn len(&self) -> usize {
        self.read().len()
    }
}
