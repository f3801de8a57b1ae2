// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Check-in QR code.

use qrcode::QrCode;
use qrcode::render::svg;
use rollcall_core::RollcallError;

use crate::commands::CHECK_IN_PAYLOAD;

/// `https://t.me/<bot>?start=imhere`, which opens the bot with `/start imhere`.
pub fn check_in_link(bot_username: &str) -> String {
    format!(
        "https://t.me/{}?start={CHECK_IN_PAYLOAD}",
        bot_username.trim().trim_start_matches('@')
    )
}

/// Render `data` as an SVG document.
pub fn render_svg(data: &str) -> Result<String, RollcallError> {
    let code = QrCode::new(data.as_bytes())
        .map_err(|e| RollcallError::Internal(format!("QR encoding failed: {e}")))?;
    Ok(code
        .render::<svg::Color<'_>>()
        .min_dimensions(256, 256)
        .quiet_zone(true)
        .build())
}
