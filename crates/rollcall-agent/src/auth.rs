// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admin allow-list.

use std::collections::HashSet;

use rollcall_config::model::TelegramConfig;
use rollcall_core::types::{UserId, UserIdentity};
use tracing::warn;

/// Decides who may run admin commands.
///
/// Entries are usernames (with or without `@`, case-insensitive) or numeric
/// user ids. An empty list means nobody is an admin.
#[derive(Debug, Clone, Default)]
pub struct AdminPolicy {
    usernames: HashSet<String>,
    ids: HashSet<UserId>,
}

impl AdminPolicy {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut policy = Self::default();
        for entry in entries {
            let entry = entry.as_ref().trim().trim_start_matches('@');
            if entry.is_empty() {
                continue;
            }
            match entry.parse::<UserId>() {
                Ok(id) => {
                    policy.ids.insert(id);
                }
                Err(_) => {
                    policy.usernames.insert(entry.to_lowercase());
                }
            }
        }
        policy
    }

    pub fn from_config(config: &TelegramConfig) -> Self {
        let policy = Self::new(&config.admin_users);
        if policy.is_empty() {
            warn!("telegram.admin_users is empty; admin commands are disabled");
        }
        policy
    }

    pub fn is_admin(&self, user: &UserIdentity) -> bool {
        if self.ids.contains(&user.id) {
            return true;
        }
        let handle = user.handle();
        !handle.is_empty() && self.usernames.contains(&handle.to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.usernames.is_empty() && self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: UserId, username: Option<&str>) -> UserIdentity {
        UserIdentity {
            id,
            username: username.map(str::to_string),
            first_name: "Test".into(),
            last_name: None,
        }
    }

    #[test]
    fn matches_username_ignoring_at_and_case() {
        let policy = AdminPolicy::new(["@Alice", "bob"]);
        assert!(policy.is_admin(&user(1, Some("alice"))));
        assert!(policy.is_admin(&user(2, Some("@BOB"))));
        assert!(!policy.is_admin(&user(3, Some("carol"))));
    }

    #[test]
    fn matches_numeric_id() {
        let policy = AdminPolicy::new(["1001"]);
        assert!(policy.is_admin(&user(1001, None)));
        assert!(!policy.is_admin(&user(1002, None)));
    }

    #[test]
    fn user_without_username_is_not_matched_by_empty_entry() {
        let policy = AdminPolicy::new(["", "  ", "@"]);
        assert!(policy.is_empty());
        assert!(!policy.is_admin(&user(1, None)));
    }
}
