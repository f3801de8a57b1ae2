// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL files under `migrations/` are compiled into the binary and applied
//! when the database is opened.

use rollcall_core::RollcallError;
use tracing::info;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
///
/// Refinery tracks applied versions in `refinery_schema_history`.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), RollcallError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(RollcallError::storage)?;
    for migration in report.applied_migrations() {
        info!(version = migration.version(), name = migration.name(), "migration applied");
    }
    Ok(())
}
