// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Update routing and conversion.
//!
//! Decides whether an incoming Telegram update should be processed, then
//! converts it into a channel-agnostic [`InboundAction`].

use rollcall_core::types::{ActionKind, InboundAction, UserIdentity};
use teloxide::prelude::*;
use teloxide::types::{ChatKind, User};
use tracing::debug;

/// Checks whether the message is from a private (DM) chat.
///
/// Group, supergroup, and channel messages return `false`.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

pub fn to_identity(user: &User) -> UserIdentity {
    UserIdentity {
        id: user.id.0 as i64,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
    }
}

/// Splits `/name@bot args` into `("name", "args")`.
///
/// Returns `None` for anything that is not a command.
pub fn parse_command(text: &str) -> Option<(String, String)> {
    let rest = text.trim_start().strip_prefix('/')?;
    let (head, args) = match rest.split_once(char::is_whitespace) {
        Some((head, args)) => (head, args.trim()),
        None => (rest, ""),
    };
    let name = head.split('@').next().unwrap_or_default();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), args.to_string()))
}

/// Converts a text message into an action.
///
/// Messages without a sender or without text yield `None`.
pub fn message_to_action(msg: &Message) -> Option<InboundAction> {
    let user = msg.from.as_ref()?;
    let Some(text) = msg.text() else {
        debug!(msg_id = msg.id.0, "ignoring non-text message");
        return None;
    };

    let kind = match parse_command(text) {
        Some((name, args)) => ActionKind::Command { name, args },
        None => ActionKind::Text(text.to_string()),
    };

    Some(InboundAction {
        user: to_identity(user),
        chat_id: msg.chat.id.0,
        kind,
    })
}

/// Converts an inline button press into an action.
///
/// Presses without callback data yield `None`.
pub fn callback_to_action(query: &CallbackQuery) -> Option<InboundAction> {
    let token = query.data.clone()?;
    Some(InboundAction {
        user: to_identity(&query.from),
        // Buttons are only sent into private chats, whose id is the user's id.
        chat_id: query.from.id.0 as i64,
        kind: ActionKind::Button {
            token,
            callback_id: query.id.0.clone(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a mock private chat message from JSON, matching Telegram Bot API structure.
    fn make_private_message(user_id: u64, username: Option<&str>, text: &str) -> Message {
        let mut from = serde_json::json!({
            "id": user_id,
            "is_bot": false,
            "first_name": "Ada",
            "last_name": "Lovelace",
        });
        if let Some(uname) = username {
            from["username"] = serde_json::json!(uname);
        }

        let json = serde_json::json!({
            "message_id": 1,
            "date": 1700000000i64,
            "chat": {
                "id": user_id as i64,
                "type": "private",
                "first_name": "Ada",
            },
            "from": from,
            "text": text,
        });

        serde_json::from_value(json).expect("failed to deserialize mock message")
    }

    fn make_group_message(user_id: u64, text: &str) -> Message {
        let json = serde_json::json!({
            "message_id": 1,
            "date": 1700000000i64,
            "chat": {
                "id": -100123i64,
                "type": "supergroup",
                "title": "Test Group",
            },
            "from": {
                "id": user_id,
                "is_bot": false,
                "first_name": "Test",
            },
            "text": text,
        });

        serde_json::from_value(json).expect("failed to deserialize mock group message")
    }

    fn make_callback(user_id: u64, data: Option<&str>) -> CallbackQuery {
        let mut json = serde_json::json!({
            "id": "cbq-1",
            "from": {
                "id": user_id,
                "is_bot": false,
                "first_name": "Ada",
                "username": "ada",
            },
            "chat_instance": "42",
        });
        if let Some(data) = data {
            json["data"] = serde_json::json!(data);
        }
        serde_json::from_value(json).expect("failed to deserialize mock callback")
    }

    #[test]
    fn parses_commands() {
        assert_eq!(
            parse_command("/start imhere"),
            Some(("start".into(), "imhere".into()))
        );
        assert_eq!(
            parse_command("/addevent@rollcall_bot Meetup; 2026-11-05; 40"),
            Some(("addevent".into(), "Meetup; 2026-11-05; 40".into()))
        );
        assert_eq!(parse_command("/state"), Some(("state".into(), String::new())));
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command("/"), None);
    }

    #[test]
    fn is_dm_private_chat() {
        assert!(is_dm(&make_private_message(12345, None, "hello")));
        assert!(!is_dm(&make_group_message(12345, "hello")));
    }

    #[test]
    fn command_message_becomes_command_action() {
        let msg = make_private_message(12345, Some("ada"), "/start imhere");
        let action = message_to_action(&msg).unwrap();
        assert_eq!(action.chat_id, 12345);
        assert_eq!(action.user.id, 12345);
        assert_eq!(action.user.username.as_deref(), Some("ada"));
        assert_eq!(action.user.display_name(), "Ada Lovelace");
        assert_eq!(
            action.kind,
            ActionKind::Command {
                name: "start".into(),
                args: "imhere".into()
            }
        );
    }

    #[test]
    fn plain_message_becomes_text_action() {
        let msg = make_private_message(12345, None, "Ada Lovelace");
        let action = message_to_action(&msg).unwrap();
        assert_eq!(action.kind, ActionKind::Text("Ada Lovelace".into()));
        assert!(action.user.username.is_none());
    }

    #[test]
    fn callback_becomes_button_action() {
        let action = callback_to_action(&make_callback(777, Some("register"))).unwrap();
        assert_eq!(action.chat_id, 777);
        assert_eq!(
            action.kind,
            ActionKind::Button {
                token: "register".into(),
                callback_id: "cbq-1".into()
            }
        );
    }

    #[test]
    fn callback_without_data_is_ignored() {
        assert!(callback_to_action(&make_callback(777, None)).is_none());
    }
}
