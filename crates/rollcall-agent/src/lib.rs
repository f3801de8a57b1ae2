// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bot loop, admission control and the registration dialog.
//!
//! The [`BotLoop`] is the central coordinator that:
//! - Receives user actions from a channel adapter
//! - Hands each one to the [`Dispatcher`] on its own task
//! - Sends the resulting replies back through the channel
//! - Waits for in-flight actions and closes storage on shutdown

pub mod admission;
pub mod auth;
pub mod commands;
pub mod dialog;
pub mod dispatch;
pub mod lifecycle;
pub mod qr;
pub mod report;
pub mod session;
pub mod shutdown;

use std::sync::Arc;
use std::time::Duration;

use rollcall_core::{ChannelAdapter, RollcallError, StorageAdapter};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

pub use admission::{Admission, AdmissionController, Applicant, CheckIn, EventStatus};
pub use auth::AdminPolicy;
pub use dialog::{DialogHandler, DialogPolicy, DialogStep};
pub use dispatch::Dispatcher;
pub use lifecycle::EventLifecycle;
pub use session::InMemorySessionStore;

/// How long shutdown waits for in-flight actions.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Moves actions from the channel to the dispatcher and replies back.
pub struct BotLoop {
    channel: Arc<dyn ChannelAdapter>,
    dispatcher: Arc<Dispatcher>,
    storage: Arc<dyn StorageAdapter>,
    tracker: TaskTracker,
}

impl BotLoop {
    pub fn new(
        channel: Arc<dyn ChannelAdapter>,
        dispatcher: Arc<Dispatcher>,
        storage: Arc<dyn StorageAdapter>,
    ) -> Self {
        info!(channel = channel.name(), storage = storage.name(), "bot loop initialized");
        Self {
            channel,
            dispatcher,
            storage,
            tracker: TaskTracker::new(),
        }
    }

    /// Runs until `cancel` fires or the channel closes.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), RollcallError> {
        info!("bot loop running");

        loop {
            tokio::select! {
                action = self.channel.receive() => {
                    match action {
                        Ok(action) => self.spawn_action(action),
                        Err(e) => {
                            if e.to_string().contains("closed") {
                                info!("channel closed, stopping bot loop");
                                break;
                            }
                            error!(error = %e, "channel receive error");
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping bot loop");
                    break;
                }
            }
        }

        shutdown::drain(&self.tracker, DRAIN_TIMEOUT).await;
        self.storage.close().await?;

        info!("bot loop stopped");
        Ok(())
    }

    fn spawn_action(&self, action: rollcall_core::types::InboundAction) {
        let channel = self.channel.clone();
        let dispatcher = self.dispatcher.clone();
        self.tracker.spawn(async move {
            let user_id = action.user.id;
            debug!(user_id, kind = ?action.kind, "handling action");
            for reply in dispatcher.handle(action).await {
                if let Err(e) = channel.send(reply).await {
                    warn!(user_id, error = %e, "failed to deliver reply");
                }
            }
        });
    }
}
