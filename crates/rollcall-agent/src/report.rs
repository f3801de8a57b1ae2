// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CSV export of every registration.

use std::io::Write;

use rollcall_core::types::RegistrationReport;
use rollcall_core::{EventRepository, RollcallError};
use tracing::info;

pub const EXPORT_FILE_NAME: &str = "registrations.csv";

const HEADER: [&str; 9] = [
    "event",
    "event_date",
    "user_id",
    "username",
    "name",
    "email",
    "registered_at",
    "registered",
    "visited",
];

fn csv_err(e: impl std::fmt::Display) -> RollcallError {
    RollcallError::Internal(format!("CSV export failed: {e}"))
}

/// Write `rows` as CSV with a header line.
pub fn write_csv<W: Write>(writer: W, rows: &[RegistrationReport]) -> Result<(), RollcallError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HEADER).map_err(csv_err)?;
    for row in rows {
        let r = &row.registration;
        csv.write_record([
            row.event_name.clone(),
            row.event_date.to_string(),
            r.user_id.to_string(),
            r.username.clone(),
            r.name.clone(),
            r.email.clone().unwrap_or_default(),
            r.registered_at.to_rfc3339(),
            u8::from(r.registered).to_string(),
            u8::from(r.visited).to_string(),
        ])
        .map_err(csv_err)?;
    }
    csv.flush().map_err(csv_err)
}

/// Load every registration and render it as CSV bytes.
pub async fn export_csv(repo: &dyn EventRepository) -> Result<Vec<u8>, RollcallError> {
    let rows = repo.list_registrations_with_event().await?;
    let mut buf = Vec::new();
    write_csv(&mut buf, &rows)?;
    info!(rows = rows.len(), bytes = buf.len(), "registrations exported");
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rollcall_core::types::Registration;

    fn report(name: &str, email: Option<&str>, visited: bool) -> RegistrationReport {
        RegistrationReport {
            registration: Registration {
                user_id: 7,
                event_id: 1,
                username: "ada".into(),
                name: name.into(),
                email: email.map(str::to_string),
                registered_at: Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap(),
                registered: true,
                visited,
            },
            event_name: "Rust, Tokio & you".into(),
            event_date: NaiveDate::from_ymd_opt(2026, 11, 5).unwrap(),
        }
    }

    #[test]
    fn header_only_for_empty_export() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &[]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "event,event_date,user_id,username,name,email,registered_at,registered,visited\n"
        );
    }

    #[test]
    fn rows_are_quoted_and_flags_numeric() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &[report("Ada Lovelace", None, true)]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let line = text.lines().nth(1).unwrap();
        assert_eq!(
            line,
            "\"Rust, Tokio & you\",2026-11-05,7,ada,Ada Lovelace,,2026-10-01T12:00:00+00:00,1,1"
        );
    }
}
