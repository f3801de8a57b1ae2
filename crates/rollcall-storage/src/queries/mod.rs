// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules and the row decoding they share.

pub mod events;
pub mod registrations;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;

/// Event dates are stored as `YYYY-MM-DD`.
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn parse_date(idx: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
