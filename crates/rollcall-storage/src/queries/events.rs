// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event CRUD and capacity counter operations.

use std::str::FromStr;

use chrono::NaiveDate;
use rollcall_core::types::{Event, EventId, EventState};
use rollcall_core::RollcallError;
use rusqlite::{OptionalExtension, params, types::Type};
use tracing::{info, warn};

use super::{format_date, parse_date};
use crate::database::{Database, map_tr_err};

const EVENT_COLUMNS: &str = "id, name, date, capacity, registration_count, state";

fn event_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Event> {
    let date: String = row.get(2)?;
    let state: String = row.get(5)?;
    Ok(Event {
        id: row.get(0)?,
        name: row.get(1)?,
        date: parse_date(2, &date)?,
        capacity: row.get(3)?,
        registration_count: row.get(4)?,
        state: EventState::from_str(&state)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?,
    })
}

/// The active event with the latest date (ties broken by newest id).
pub async fn latest_active_event(db: &Database) -> Result<Option<Event>, RollcallError> {
    db.connection()
        .call(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {EVENT_COLUMNS} FROM events WHERE state = 'active' \
                     ORDER BY date DESC, id DESC LIMIT 1"
                ),
                [],
                event_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Look up one event by id, whatever its state.
pub async fn get_event(db: &Database, event_id: EventId) -> Result<Option<Event>, RollcallError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1"),
                params![event_id],
                event_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Add one seat to the count, unless the event is missing or full.
pub async fn increment_count(db: &Database, event_id: EventId) -> Result<bool, RollcallError> {
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE events SET registration_count = registration_count + 1 \
                 WHERE id = ?1 AND registration_count < capacity",
                params![event_id],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(changed == 1)
}

/// Release one seat. A no-op at zero.
pub async fn decrement_count(db: &Database, event_id: EventId) -> Result<bool, RollcallError> {
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE events SET registration_count = registration_count - 1 \
                 WHERE id = ?1 AND registration_count > 0",
                params![event_id],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if changed == 0 {
        warn!(event_id, "decrement skipped: count already zero or event missing");
    }
    Ok(changed == 1)
}

pub async fn mark_all_active_as_past(db: &Database) -> Result<usize, RollcallError> {
    db.connection()
        .call(|conn| conn.execute("UPDATE events SET state = 'past' WHERE state = 'active'", []))
        .await
        .map_err(map_tr_err)
}

/// Insert a new active event with a zero count.
///
/// Fails if another event is still active; the partial unique index on
/// `state` rejects the insert.
pub async fn create_event(
    db: &Database,
    name: &str,
    date: NaiveDate,
    capacity: i64,
) -> Result<Event, RollcallError> {
    let name = name.to_string();
    let stored_date = format_date(date);
    let event = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO events (name, date, capacity, registration_count, state) \
                 VALUES (?1, ?2, ?3, 0, 'active')",
                params![name, stored_date, capacity],
            )?;
            Ok(Event {
                id: conn.last_insert_rowid(),
                name,
                date,
                capacity,
                registration_count: 0,
                state: EventState::Active,
            })
        })
        .await
        .map_err(map_tr_err)?;
    info!(event_id = event.id, name = %event.name, %date, capacity, "event created");
    Ok(event)
}

/// Number of rows holding `registered = 1` for the event.
pub async fn count_registered(db: &Database, event_id: EventId) -> Result<i64, RollcallError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM registrations WHERE event_id = ?1 AND registered = 1",
                params![event_id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Rewrite `registration_count` from the registered rows, clamped to capacity.
///
/// Returns `(before, after)`. Runs in one transaction.
pub async fn reconcile_count(
    db: &Database,
    event_id: EventId,
) -> Result<(i64, i64), RollcallError> {
    let (before, after) = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let (before, capacity): (i64, i64) = tx.query_row(
                "SELECT registration_count, capacity FROM events WHERE id = ?1",
                params![event_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            let actual: i64 = tx.query_row(
                "SELECT COUNT(*) FROM registrations WHERE event_id = ?1 AND registered = 1",
                params![event_id],
                |row| row.get(0),
            )?;
            let after = actual.clamp(0, capacity);
            if after != before {
                tx.execute(
                    "UPDATE events SET registration_count = ?2 WHERE id = ?1",
                    params![event_id, after],
                )?;
            }
            tx.commit()?;
            Ok((before, after))
        })
        .await
        .map_err(map_tr_err)?;

    if before != after {
        warn!(event_id, before, after, "registration count reconciled");
    }
    Ok((before, after))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 11, d).unwrap()
    }

    #[tokio::test]
    async fn no_active_event_on_empty_database() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(latest_active_event(&db).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_then_read_back() {
        let db = Database::open_in_memory().await.unwrap();
        let created = create_event(&db, "Rust meetup", day(5), 30).await.unwrap();
        let active = latest_active_event(&db).await.unwrap().unwrap();
        assert_eq!(active, created);
        assert_eq!(active.date, day(5));
        assert_eq!(active.state, EventState::Active);
    }

    #[tokio::test]
    async fn second_active_event_is_rejected_by_index() {
        let db = Database::open_in_memory().await.unwrap();
        create_event(&db, "first", day(1), 10).await.unwrap();
        let err = create_event(&db, "second", day(2), 10).await.unwrap_err();
        assert!(matches!(err, RollcallError::Storage { .. }));
    }

    #[tokio::test]
    async fn publish_sequence_leaves_only_new_event_active() {
        let db = Database::open_in_memory().await.unwrap();
        let old = create_event(&db, "old", day(20), 10).await.unwrap();
        assert_eq!(mark_all_active_as_past(&db).await.unwrap(), 1);
        let new = create_event(&db, "new", day(1), 5).await.unwrap();

        assert_eq!(latest_active_event(&db).await.unwrap().unwrap().id, new.id);
        let old = get_event(&db, old.id).await.unwrap().unwrap();
        assert_eq!(old.state, EventState::Past);
    }

    #[tokio::test]
    async fn increment_stops_at_capacity() {
        let db = Database::open_in_memory().await.unwrap();
        let ev = create_event(&db, "tiny", day(5), 2).await.unwrap();
        assert!(increment_count(&db, ev.id).await.unwrap());
        assert!(increment_count(&db, ev.id).await.unwrap());
        assert!(!increment_count(&db, ev.id).await.unwrap());
        let ev = get_event(&db, ev.id).await.unwrap().unwrap();
        assert_eq!(ev.registration_count, 2);
    }

    #[tokio::test]
    async fn decrement_is_noop_at_zero() {
        let db = Database::open_in_memory().await.unwrap();
        let ev = create_event(&db, "empty", day(5), 2).await.unwrap();
        assert!(!decrement_count(&db, ev.id).await.unwrap());
        let ev = get_event(&db, ev.id).await.unwrap().unwrap();
        assert_eq!(ev.registration_count, 0);
    }

    #[tokio::test]
    async fn counters_on_missing_event_report_false() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(!increment_count(&db, 99).await.unwrap());
        assert!(!decrement_count(&db, 99).await.unwrap());
    }

    #[tokio::test]
    async fn reconcile_repairs_drift() {
        let db = Database::open_in_memory().await.unwrap();
        let ev = create_event(&db, "drift", day(5), 10).await.unwrap();
        increment_count(&db, ev.id).await.unwrap();
        increment_count(&db, ev.id).await.unwrap();

        // No registration rows exist, so the true count is zero.
        assert_eq!(reconcile_count(&db, ev.id).await.unwrap(), (2, 0));
        assert_eq!(reconcile_count(&db, ev.id).await.unwrap(), (0, 0));
    }
}
