// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registration rows: admission writes, attendance, profile lookups and the
//! export join.

use chrono::Utc;
use rollcall_core::RollcallError;
use rollcall_core::types::{
    EventId, Registration, RegistrationReport, RegistrationWrite, UserId, UserIdentity,
    UserProfile, VisitUpdate,
};
use rusqlite::{OptionalExtension, params};
use tracing::debug;

use super::{parse_date, parse_timestamp};
use crate::database::{Database, map_tr_err};

const REGISTRATION_COLUMNS: &str =
    "r.user_id, r.event_id, r.username, r.name, r.email, r.registered_at, r.registered, r.visited";

/// Decodes the eight [`REGISTRATION_COLUMNS`] starting at `offset`.
fn registration_from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Registration> {
    let registered_at: String = row.get(offset + 5)?;
    Ok(Registration {
        user_id: row.get(offset)?,
        event_id: row.get(offset + 1)?,
        username: row.get(offset + 2)?,
        name: row.get(offset + 3)?,
        email: row.get(offset + 4)?,
        registered_at: parse_timestamp(offset + 5, &registered_at)?,
        registered: row.get(offset + 6)?,
        visited: row.get(offset + 7)?,
    })
}

/// The user's row for the event, if any.
pub async fn find_registration(
    db: &Database,
    user_id: UserId,
    event_id: EventId,
) -> Result<Option<Registration>, RollcallError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {REGISTRATION_COLUMNS} FROM registrations r \
                     WHERE r.user_id = ?1 AND r.event_id = ?2"
                ),
                params![user_id, event_id],
                |row| registration_from_row(row, 0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn is_registered(
    db: &Database,
    user_id: UserId,
    event_id: EventId,
) -> Result<(bool, Option<Registration>), RollcallError> {
    let row = find_registration(db, user_id, event_id).await?;
    Ok((row.as_ref().is_some_and(|r| r.registered), row))
}

enum RegisterOutcome {
    Written(RegistrationWrite),
    AlreadyRegistered,
}

/// Insert a registered row, or flip an unregistered one back.
///
/// A reactivated row gets the new name, username, email and timestamp; its
/// `visited` flag is kept.
pub async fn register(
    db: &Database,
    registration: &Registration,
) -> Result<RegistrationWrite, RollcallError> {
    let reg = registration.clone();
    let (user_id, event_id) = (reg.user_id, reg.event_id);
    let outcome = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let existing: Option<bool> = tx
                .query_row(
                    "SELECT registered FROM registrations WHERE user_id = ?1 AND event_id = ?2",
                    params![reg.user_id, reg.event_id],
                    |row| row.get(0),
                )
                .optional()?;
            let registered_at = reg.registered_at.to_rfc3339();
            let outcome = match existing {
                Some(true) => RegisterOutcome::AlreadyRegistered,
                Some(false) => {
                    tx.execute(
                        "UPDATE registrations \
                         SET registered = 1, username = ?3, name = ?4, email = ?5, registered_at = ?6 \
                         WHERE user_id = ?1 AND event_id = ?2",
                        params![
                            reg.user_id,
                            reg.event_id,
                            reg.username,
                            reg.name,
                            reg.email,
                            registered_at
                        ],
                    )?;
                    RegisterOutcome::Written(RegistrationWrite::Reactivated)
                }
                None => {
                    tx.execute(
                        "INSERT INTO registrations \
                         (user_id, event_id, username, name, email, registered_at, registered, visited) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)",
                        params![
                            reg.user_id,
                            reg.event_id,
                            reg.username,
                            reg.name,
                            reg.email,
                            registered_at,
                            reg.visited
                        ],
                    )?;
                    RegisterOutcome::Written(RegistrationWrite::Inserted)
                }
            };
            tx.commit()?;
            Ok(outcome)
        })
        .await
        .map_err(map_tr_err)?;

    match outcome {
        RegisterOutcome::Written(write) => {
            debug!(user_id, event_id, ?write, "registration row written");
            Ok(write)
        }
        RegisterOutcome::AlreadyRegistered => {
            Err(RollcallError::DuplicateRegistration { user_id, event_id })
        }
    }
}

/// Flip `registered` to 0. The row is kept for attendance history.
pub async fn unregister(
    db: &Database,
    user_id: UserId,
    event_id: EventId,
) -> Result<bool, RollcallError> {
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE registrations SET registered = 0 \
                 WHERE user_id = ?1 AND event_id = ?2 AND registered = 1",
                params![user_id, event_id],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(changed == 1)
}

/// Set the attendance flag, creating a walk-in row when the user never registered.
pub async fn update_visited(
    db: &Database,
    user: &UserIdentity,
    event_id: EventId,
    visited: bool,
) -> Result<VisitUpdate, RollcallError> {
    let user_id = user.id;
    let username = user.handle();
    let name = user.display_name();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let updated = tx.execute(
                "UPDATE registrations SET visited = ?3 WHERE user_id = ?1 AND event_id = ?2",
                params![user_id, event_id, visited],
            )?;
            let result = if updated > 0 {
                VisitUpdate::Updated
            } else {
                tx.execute(
                    "INSERT INTO registrations \
                     (user_id, event_id, username, name, email, registered_at, registered, visited) \
                     VALUES (?1, ?2, ?3, ?4, NULL, ?5, 0, ?6)",
                    params![
                        user_id,
                        event_id,
                        username,
                        name,
                        Utc::now().to_rfc3339(),
                        visited
                    ],
                )?;
                VisitUpdate::WalkInCreated
            };
            tx.commit()?;
            Ok(result)
        })
        .await
        .map_err(map_tr_err)
}

/// All registrations joined with their events, newest event first, then by name.
pub async fn list_registrations_with_event(
    db: &Database,
) -> Result<Vec<RegistrationReport>, RollcallError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {REGISTRATION_COLUMNS}, e.name, e.date \
                 FROM registrations r JOIN events e ON e.id = r.event_id \
                 ORDER BY e.date DESC, e.id DESC, r.name ASC, r.user_id ASC"
            ))?;
            let rows = stmt.query_map([], |row| {
                let event_date: String = row.get(9)?;
                Ok(RegistrationReport {
                    registration: registration_from_row(row, 0)?,
                    event_name: row.get(8)?,
                    event_date: parse_date(9, &event_date)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Most recent name and email the user gave, if both were non-empty.
pub async fn find_user_profile(
    db: &Database,
    user_id: UserId,
) -> Result<Option<UserProfile>, RollcallError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT name, email FROM registrations \
                 WHERE user_id = ?1 AND name <> '' AND email IS NOT NULL AND email <> '' \
                 ORDER BY registered_at DESC LIMIT 1",
                params![user_id],
                |row| {
                    Ok(UserProfile {
                        name: row.get(0)?,
                        email: row.get(1)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Replace the email on every row of the user.
pub async fn update_user_email(
    db: &Database,
    user_id: UserId,
    email: &str,
) -> Result<usize, RollcallError> {
    let email = email.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE registrations SET email = ?2 WHERE user_id = ?1",
                params![user_id, email],
            )
        })
        .await
        .map_err(map_tr_err)
}
