// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the full bot stack (SQLite in a temp directory,
//! in-memory dialog sessions, the dispatcher) and offers helpers that play
//! a user's commands, button presses and text through it.

use std::sync::Arc;

use rollcall_agent::{Dispatcher, InMemorySessionStore};
use rollcall_config::model::{RollcallConfig, StorageConfig};
use rollcall_core::types::{
    ActionKind, Event, InboundAction, OutboundReply, UserId, UserIdentity,
};
use rollcall_core::{EventRepository, RollcallError, StorageAdapter};
use rollcall_storage::SqliteStorage;

/// Chat id the harness uses for every user.
pub const HARNESS_CHAT_ID: i64 = 4242;

/// User id the harness grants admin rights to.
pub const ADMIN_ID: UserId = 1;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    mandatory_fields: Vec<String>,
    bot_username: Option<String>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            mandatory_fields: Vec::new(),
            bot_username: Some("rollcall_test_bot".to_string()),
        }
    }

    /// Profile fields the registration dialog must collect.
    pub fn with_mandatory_fields(mut self, fields: &[&str]) -> Self {
        self.mandatory_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn without_bot_username(mut self) -> Self {
        self.bot_username = None;
        self
    }

    /// Build the harness, opening a fresh SQLite database.
    pub async fn build(self) -> Result<TestHarness, RollcallError> {
        let temp_dir = tempfile::TempDir::new().map_err(RollcallError::storage)?;
        let db_path = temp_dir.path().join("rollcall.db");

        let mut config = RollcallConfig::default();
        config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        };
        config.telegram.admin_users = vec![ADMIN_ID.to_string()];
        config.telegram.bot_username = self.bot_username;
        config.registration.mandatory_fields = self.mandatory_fields;

        let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
        storage.initialize().await?;

        let sessions = Arc::new(InMemorySessionStore::new());
        let dispatcher = Arc::new(Dispatcher::new(storage.clone(), sessions.clone(), &config));

        Ok(TestHarness {
            storage,
            sessions,
            dispatcher,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment backed by a temp SQLite database.
pub struct TestHarness {
    /// SQLite storage (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    /// Dialog sessions.
    pub sessions: Arc<InMemorySessionStore>,
    pub dispatcher: Arc<Dispatcher>,
    pub config: RollcallConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A harness with default options.
    pub async fn new() -> Result<Self, RollcallError> {
        Self::builder().build().await
    }

    /// A Telegram-like identity for `id`: `@user<id>`, "First<id> Last".
    pub fn user(id: UserId) -> UserIdentity {
        UserIdentity {
            id,
            username: Some(format!("user{id}")),
            first_name: format!("First{id}"),
            last_name: Some("Last".to_string()),
        }
    }

    /// Send `/name args` as `user_id`.
    pub async fn command(&self, user_id: UserId, name: &str, args: &str) -> Vec<OutboundReply> {
        self.act(
            user_id,
            ActionKind::Command {
                name: name.to_string(),
                args: args.to_string(),
            },
        )
        .await
    }

    /// Press the inline button carrying `token`.
    pub async fn press(&self, user_id: UserId, token: &str) -> Vec<OutboundReply> {
        self.act(
            user_id,
            ActionKind::Button {
                token: token.to_string(),
                callback_id: format!("cb-{user_id}"),
            },
        )
        .await
    }

    /// Send free text as `user_id`.
    pub async fn say(&self, user_id: UserId, text: &str) -> Vec<OutboundReply> {
        self.act(user_id, ActionKind::Text(text.to_string())).await
    }

    /// Publish an event through `/addevent` as the admin.
    pub async fn publish(&self, name: &str, date: &str, capacity: i64) -> Vec<OutboundReply> {
        self.command(ADMIN_ID, "addevent", &format!("{name};{date};{capacity}"))
            .await
    }

    pub async fn active_event(&self) -> Result<Option<Event>, RollcallError> {
        self.storage.latest_active_event().await
    }

    async fn act(&self, user_id: UserId, kind: ActionKind) -> Vec<OutboundReply> {
        self.dispatcher
            .handle(InboundAction {
                user: Self::user(user_id),
                chat_id: HARNESS_CHAT_ID,
                kind,
            })
            .await
    }
}

/// Visible text of each reply, in order.
pub fn reply_texts(replies: &[OutboundReply]) -> Vec<String> {
    replies
        .iter()
        .filter_map(|r| r.text_content().map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn harness_builds_with_empty_database() {
        let harness = TestHarness::new().await.unwrap();
        assert!(harness.active_event().await.unwrap().is_none());
        assert!(harness.config.storage.database_path.ends_with("rollcall.db"));
    }

    #[tokio::test]
    async fn admin_can_publish_through_harness() {
        let harness = TestHarness::new().await.unwrap();
        harness.publish("Meetup", "2026-11-05", 3).await;
        let event = harness.active_event().await.unwrap().unwrap();
        assert_eq!(event.name, "Meetup");
        assert_eq!(event.capacity, 3);
    }
}
