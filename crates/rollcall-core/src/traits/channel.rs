// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging gateway trait (Telegram, test mocks).

use async_trait::async_trait;

use crate::error::RollcallError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{InboundAction, OutboundReply};

/// Bidirectional connection to a messaging platform.
///
/// The gateway owns rendering: it turns [`OutboundReply`] bodies into
/// platform messages, buttons, callback answers, and uploads.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Starts receiving updates from the platform.
    async fn connect(&mut self) -> Result<(), RollcallError>;

    /// Delivers one reply.
    async fn send(&self, reply: OutboundReply) -> Result<(), RollcallError>;

    /// Waits for the next inbound user action.
    async fn receive(&self) -> Result<InboundAction, RollcallError>;
}
