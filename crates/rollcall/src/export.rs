// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `rollcall export` command implementation.

use std::io::Write;
use std::path::Path;

use rollcall_agent::report;
use rollcall_config::RollcallConfig;
use rollcall_core::error::RollcallError;
use rollcall_core::StorageAdapter;
use rollcall_storage::SqliteStorage;

/// Writes every registration as CSV to `output`, or stdout when `None`.
pub async fn run_export(config: &RollcallConfig, output: Option<&Path>) -> Result<(), RollcallError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let csv = report::export_csv(&storage).await;
    storage.close().await?;
    let csv = csv?;

    match output {
        Some(path) => {
            std::fs::write(path, &csv).map_err(|e| {
                RollcallError::Internal(format!("failed to write {}: {e}", path.display()))
            })?;
            eprintln!("rollcall: exported registrations to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(&csv)
                .and_then(|()| stdout.flush())
                .map_err(|e| RollcallError::Internal(format!("failed to write to stdout: {e}")))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rollcall_core::EventRepository;
    use rollcall_core::types::UserIdentity;

    #[tokio::test]
    async fn export_writes_header_and_rows_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = RollcallConfig::default();
        config.storage.database_path = dir.path().join("export.db").to_string_lossy().to_string();

        {
            let storage = SqliteStorage::new(config.storage.clone());
            storage.initialize().await.unwrap();
            let event = storage
                .create_event("Meetup", NaiveDate::from_ymd_opt(2026, 11, 5).unwrap(), 10)
                .await
                .unwrap();
            let visitor = UserIdentity {
                id: 5,
                username: Some("grace".into()),
                first_name: "Grace".into(),
                last_name: Some("Hopper".into()),
            };
            storage.update_visited(&visitor, event.id, true).await.unwrap();
            storage.close().await.unwrap();
        }

        let out = dir.path().join("out.csv");
        run_export(&config, Some(&out)).await.unwrap();

        let text = std::fs::read_to_string(&out).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().contains("user_id"));
        let row = lines.next().unwrap();
        assert!(row.contains("Grace Hopper"));
        assert!(row.contains("Meetup"));
        assert!(lines.next().is_none());
    }
}
