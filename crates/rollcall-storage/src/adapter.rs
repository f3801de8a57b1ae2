// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the storage and repository traits.

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::OnceCell;
use tracing::debug;

use rollcall_config::model::StorageConfig;
use rollcall_core::types::{
    Event, EventId, Registration, RegistrationReport, RegistrationWrite, UserId, UserIdentity,
    UserProfile, VisitUpdate,
};
use rollcall_core::{
    AdapterType, EventRepository, HealthStatus, PluginAdapter, RollcallError, StorageAdapter,
};

use crate::database::{Database, map_tr_err};
use crate::queries::{events, registrations};

/// SQLite-backed storage adapter.
///
/// The database is opened by [`StorageAdapter::initialize`]; every
/// repository call before that fails with a storage error.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Wraps an already-open database, e.g. [`Database::open_in_memory`].
    pub fn with_database(config: StorageConfig, db: Database) -> Self {
        Self {
            config,
            db: OnceCell::new_with(Some(db)),
        }
    }

    fn db(&self) -> Result<&Database, RollcallError> {
        self.db.get().ok_or_else(|| RollcallError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    /// Event by id, active or past.
    pub async fn get_event(&self, event_id: EventId) -> Result<Option<Event>, RollcallError> {
        events::get_event(self.db()?, event_id).await
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, RollcallError> {
        self.db()?
            .connection()
            .call(|conn| conn.execute_batch("SELECT 1;"))
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RollcallError> {
        if self.db.get().is_some() {
            self.close().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), RollcallError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| RollcallError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), RollcallError> {
        self.db()?.clone().close().await
    }
}

#[async_trait]
impl EventRepository for SqliteStorage {
    async fn latest_active_event(&self) -> Result<Option<Event>, RollcallError> {
        events::latest_active_event(self.db()?).await
    }

    async fn is_registered(
        &self,
        user_id: UserId,
        event_id: EventId,
    ) -> Result<(bool, Option<Registration>), RollcallError> {
        registrations::is_registered(self.db()?, user_id, event_id).await
    }

    async fn register(
        &self,
        registration: &Registration,
    ) -> Result<RegistrationWrite, RollcallError> {
        registrations::register(self.db()?, registration).await
    }

    async fn unregister(&self, user_id: UserId, event_id: EventId) -> Result<bool, RollcallError> {
        registrations::unregister(self.db()?, user_id, event_id).await
    }

    async fn increment_count(&self, event_id: EventId) -> Result<bool, RollcallError> {
        events::increment_count(self.db()?, event_id).await
    }

    async fn decrement_count(&self, event_id: EventId) -> Result<bool, RollcallError> {
        events::decrement_count(self.db()?, event_id).await
    }

    async fn update_visited(
        &self,
        user: &UserIdentity,
        event_id: EventId,
        visited: bool,
    ) -> Result<VisitUpdate, RollcallError> {
        registrations::update_visited(self.db()?, user, event_id, visited).await
    }

    async fn mark_all_active_as_past(&self) -> Result<usize, RollcallError> {
        events::mark_all_active_as_past(self.db()?).await
    }

    async fn create_event(
        &self,
        name: &str,
        date: NaiveDate,
        capacity: i64,
    ) -> Result<Event, RollcallError> {
        events::create_event(self.db()?, name, date, capacity).await
    }

    async fn list_registrations_with_event(
        &self,
    ) -> Result<Vec<RegistrationReport>, RollcallError> {
        registrations::list_registrations_with_event(self.db()?).await
    }

    async fn find_user_profile(
        &self,
        user_id: UserId,
    ) -> Result<Option<UserProfile>, RollcallError> {
        registrations::find_user_profile(self.db()?, user_id).await
    }

    async fn update_user_email(
        &self,
        user_id: UserId,
        email: &str,
    ) -> Result<usize, RollcallError> {
        registrations::update_user_email(self.db()?, user_id, email).await
    }

    async fn count_registered(&self, event_id: EventId) -> Result<i64, RollcallError> {
        events::count_registered(self.db()?, event_id).await
    }

    async fn reconcile_count(&self, event_id: EventId) -> Result<(i64, i64), RollcallError> {
        events::reconcile_count(self.db()?, event_id).await
    }
}
