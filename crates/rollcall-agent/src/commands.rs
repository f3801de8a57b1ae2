// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slash-command parsing.

use chrono::NaiveDate;
use rollcall_core::RollcallError;
use strum::EnumString;

/// Deep-link payload of the check-in QR code: `/start imhere`.
pub const CHECK_IN_PAYLOAD: &str = "imhere";

pub const ADD_EVENT_USAGE: &str = "Usage: /addevent Name;YYYY-MM-DD;Capacity";
pub const ADD_EMAIL_USAGE: &str = "Please provide your email. Usage: /addemail you@example.com";

/// A recognized bot command.
#[derive(Debug, Clone, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Command {
    Start,
    /// `/start imhere`, reached through the QR code.
    #[strum(disabled)]
    CheckIn,
    Register,
    State,
    #[strum(disabled)]
    AddEmail(String),
    Cancel,
    #[strum(disabled)]
    AddEvent(String),
    #[strum(serialize = "qrcode")]
    QrCode,
    Export,
    #[strum(disabled)]
    Unknown(String),
}

impl Command {
    /// `name` without the leading slash or `@botname` suffix.
    pub fn parse(name: &str, args: &str) -> Self {
        let name = name
            .trim_start_matches('/')
            .split('@')
            .next()
            .unwrap_or_default()
            .to_lowercase();
        let args = args.trim();
        match name.as_str() {
            "start" if args.eq_ignore_ascii_case(CHECK_IN_PAYLOAD) => Self::CheckIn,
            "addemail" => Self::AddEmail(args.to_string()),
            "addevent" => Self::AddEvent(args.to_string()),
            other => other
                .parse::<Self>()
                .unwrap_or_else(|_| Self::Unknown(other.to_string())),
        }
    }

    /// Commands that only admins may run.
    pub fn requires_admin(&self) -> bool {
        matches!(self, Self::AddEvent(_) | Self::QrCode | Self::Export)
    }
}

/// Arguments of `/addevent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub name: String,
    pub date: NaiveDate,
    pub capacity: i64,
}

/// Parse `Name;YYYY-MM-DD;Capacity`.
pub fn parse_add_event(args: &str) -> Result<NewEvent, RollcallError> {
    let parts: Vec<&str> = args.split(';').map(str::trim).collect();
    let [name, date, capacity] = parts.as_slice() else {
        return Err(RollcallError::InvalidInput(ADD_EVENT_USAGE.into()));
    };
    if name.is_empty() {
        return Err(RollcallError::InvalidInput(ADD_EVENT_USAGE.into()));
    }
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
        RollcallError::InvalidInput("Invalid date format. Use YYYY-MM-DD.".into())
    })?;
    let capacity = capacity
        .parse::<i64>()
        .ok()
        .filter(|c| *c > 0)
        .ok_or_else(|| RollcallError::InvalidInput("Capacity must be a positive number.".into()))?;
    Ok(NewEvent {
        name: name.to_string(),
        date,
        capacity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_commands() {
        assert_eq!(Command::parse("start", ""), Command::Start);
        assert_eq!(Command::parse("/Register", ""), Command::Register);
        assert_eq!(Command::parse("state@rollcall_bot", ""), Command::State);
        assert_eq!(Command::parse("qrcode", ""), Command::QrCode);
        assert_eq!(Command::parse("export", ""), Command::Export);
        assert_eq!(Command::parse("cancel", ""), Command::Cancel);
    }

    #[test]
    fn start_with_payload_is_check_in() {
        assert_eq!(Command::parse("start", "imhere"), Command::CheckIn);
        assert_eq!(Command::parse("start", " IMHERE "), Command::CheckIn);
        assert_eq!(Command::parse("start", "other"), Command::Start);
    }

    #[test]
    fn argument_commands_keep_args() {
        assert_eq!(
            Command::parse("addemail", " ada@example.org "),
            Command::AddEmail("ada@example.org".into())
        );
        assert_eq!(
            Command::parse("addevent", "Meetup;2026-11-05;30"),
            Command::AddEvent("Meetup;2026-11-05;30".into())
        );
    }

    #[test]
    fn unknown_and_disabled_names() {
        assert_eq!(Command::parse("help", ""), Command::Unknown("help".into()));
        // Variants without a plain spelling cannot be reached by name.
        assert_eq!(Command::parse("checkin", ""), Command::Unknown("checkin".into()));
        assert_eq!(Command::parse("unknown", ""), Command::Unknown("unknown".into()));
    }

    #[test]
    fn admin_commands() {
        assert!(Command::QrCode.requires_admin());
        assert!(Command::AddEvent(String::new()).requires_admin());
        assert!(!Command::Register.requires_admin());
    }

    #[test]
    fn add_event_happy_path() {
        let ev = parse_add_event(" Rust meetup ; 2026-11-05 ; 30 ").unwrap();
        assert_eq!(ev.name, "Rust meetup");
        assert_eq!(ev.date, NaiveDate::from_ymd_opt(2026, 11, 5).unwrap());
        assert_eq!(ev.capacity, 30);
    }

    #[test]
    fn add_event_errors() {
        let usage = parse_add_event("Meetup;2026-11-05").unwrap_err();
        assert_eq!(usage.user_message(), ADD_EVENT_USAGE);

        let date = parse_add_event("Meetup;05.11.2026;30").unwrap_err();
        assert!(date.user_message().contains("YYYY-MM-DD"));

        for bad in ["0", "-3", "many"] {
            let err = parse_add_event(&format!("Meetup;2026-11-05;{bad}")).unwrap_err();
            assert!(err.user_message().contains("positive"), "{bad}");
        }
    }
}
