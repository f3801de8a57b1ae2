// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Rollcall registration bot.
//!
//! WAL-mode SQLite with embedded migrations, a single-writer concurrency
//! model via `tokio-rusqlite`, and typed queries for events and
//! registrations.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
