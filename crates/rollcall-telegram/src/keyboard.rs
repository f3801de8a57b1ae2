// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inline keyboards.

use rollcall_core::types::Button;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// One row per button; the token travels as callback data.
pub fn inline_keyboard(buttons: &[Button]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        buttons
            .iter()
            .map(|b| vec![InlineKeyboardButton::callback(b.label.clone(), b.token.clone())]),
    )
}
