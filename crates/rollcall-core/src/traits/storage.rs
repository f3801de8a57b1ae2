// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage lifecycle trait for persistence backends.

use async_trait::async_trait;

use crate::error::RollcallError;
use crate::traits::adapter::PluginAdapter;

/// Lifecycle of a persistence backend.
///
/// Data access lives on [`EventRepository`](crate::traits::EventRepository);
/// this trait only covers opening and closing the store.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Opens the backend and applies pending migrations.
    async fn initialize(&self) -> Result<(), RollcallError>;

    /// Flushes pending writes and releases the connection.
    async fn close(&self) -> Result<(), RollcallError>;
}
