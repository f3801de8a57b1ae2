// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram channel adapter for the Rollcall registration bot.
//!
//! Implements [`ChannelAdapter`] for the Telegram Bot API via teloxide,
//! providing long polling, command and button routing, inline keyboards,
//! callback answers, and document uploads.

pub mod handler;
pub mod keyboard;

use async_trait::async_trait;
use rollcall_config::model::TelegramConfig;
use rollcall_core::error::RollcallError;
use rollcall_core::traits::{ChannelAdapter, PluginAdapter};
use rollcall_core::types::{
    AdapterType, HealthStatus, InboundAction, OutboundReply, ReplyBody,
};
use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, ChatId, InputFile};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Inbound actions buffered between the poller and the bot loop.
const INBOUND_BUFFER: usize = 100;

fn channel_error(what: &str, e: teloxide::RequestError) -> RollcallError {
    RollcallError::Channel {
        message: format!("failed to {what}: {e}"),
        source: Some(Box::new(e)),
    }
}

/// Telegram channel adapter implementing [`ChannelAdapter`].
///
/// Connects to Telegram via long polling, ignores everything outside
/// private chats, and renders replies as messages, inline keyboards,
/// callback answers, or documents.
pub struct TelegramChannel {
    bot: Bot,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundAction>>,
    inbound_tx: mpsc::Sender<InboundAction>,
    polling_handle: Option<tokio::task::JoinHandle<()>>,
}

impl TelegramChannel {
    /// Creates a new Telegram channel adapter.
    ///
    /// Requires `config.bot_token` to be set.
    pub fn new(config: &TelegramConfig) -> Result<Self, RollcallError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            RollcallError::Config("telegram.bot_token is required for Telegram adapter".into())
        })?;

        if token.trim().is_empty() {
            return Err(RollcallError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let bot = Bot::new(token.trim());
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_BUFFER);

        Ok(Self {
            bot,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx,
            polling_handle: None,
        })
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

#[async_trait]
impl PluginAdapter for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, RollcallError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), RollcallError> {
        debug!("Telegram channel shutting down");
        if let Some(handle) = &self.polling_handle {
            handle.abort();
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for TelegramChannel {
    async fn connect(&mut self) -> Result<(), RollcallError> {
        if self.polling_handle.is_some() {
            return Ok(());
        }

        let bot = self.bot.clone();
        let message_tx = self.inbound_tx.clone();
        let callback_tx = self.inbound_tx.clone();

        info!("starting Telegram long polling");

        let handle = tokio::spawn(async move {
            let handler = dptree::entry()
                .branch(Update::filter_message().endpoint(move |msg: Message| {
                    let tx = message_tx.clone();
                    async move {
                        if !handler::is_dm(&msg) {
                            debug!(chat_id = msg.chat.id.0, "ignoring non-DM message");
                            return respond(());
                        }
                        if let Some(action) = handler::message_to_action(&msg)
                            && tx.send(action).await.is_err()
                        {
                            warn!("inbound channel closed, dropping message");
                        }
                        respond(())
                    }
                }))
                .branch(Update::filter_callback_query().endpoint(
                    move |query: CallbackQuery| {
                        let tx = callback_tx.clone();
                        async move {
                            match handler::callback_to_action(&query) {
                                Some(action) => {
                                    if tx.send(action).await.is_err() {
                                        warn!("inbound channel closed, dropping button press");
                                    }
                                }
                                None => debug!("ignoring callback without data"),
                            }
                            respond(())
                        }
                    },
                ));

            Dispatcher::builder(bot, handler)
                .default_handler(|_| async {})
                .build()
                .dispatch()
                .await;
        });

        self.polling_handle = Some(handle);
        Ok(())
    }

    async fn send(&self, reply: OutboundReply) -> Result<(), RollcallError> {
        let chat_id = ChatId(reply.chat_id);
        match reply.body {
            ReplyBody::Text(text) => {
                self.bot
                    .send_message(chat_id, text)
                    .await
                    .map_err(|e| channel_error("send message", e))?;
            }
            ReplyBody::Prompt { text, buttons } => {
                self.bot
                    .send_message(chat_id, text)
                    .reply_markup(keyboard::inline_keyboard(&buttons))
                    .await
                    .map_err(|e| channel_error("send prompt", e))?;
            }
            ReplyBody::CallbackNotice { callback_id, text } => {
                self.bot
                    .answer_callback_query(CallbackQueryId(callback_id))
                    .text(text)
                    .await
                    .map_err(|e| channel_error("answer callback", e))?;
            }
            ReplyBody::Document {
                file_name,
                bytes,
                caption,
            } => {
                let mut request = self
                    .bot
                    .send_document(chat_id, InputFile::memory(bytes).file_name(file_name));
                if let Some(caption) = caption {
                    request = request.caption(caption);
                }
                request
                    .await
                    .map_err(|e| channel_error("send document", e))?;
            }
        }
        Ok(())
    }

    async fn receive(&self) -> Result<InboundAction, RollcallError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| RollcallError::Channel {
            message: "Telegram inbound channel closed".into(),
            source: None,
        })
    }
}
