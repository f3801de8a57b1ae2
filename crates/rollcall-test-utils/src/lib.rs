// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Rollcall integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without a Telegram connection.
//!
//! # Components
//!
//! - [`InMemoryRepository`] - Map-backed event store with failure injection
//! - [`MockChannel`] - Mock messaging channel with action injection and reply capture
//! - [`MockStorage`] - Storage lifecycle mock
//! - [`TestHarness`] - Dispatcher over a temp SQLite database

pub mod harness;
pub mod in_memory_repo;
pub mod mock_channel;
pub mod mock_storage;

pub use harness::{TestHarness, reply_texts};
pub use in_memory_repo::InMemoryRepository;
pub use mock_channel::MockChannel;
pub use mock_storage::MockStorage;
