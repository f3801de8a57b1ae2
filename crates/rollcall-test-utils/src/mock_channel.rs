// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` with injectable inbound actions
//! and captured outbound replies for assertion in tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use rollcall_core::traits::adapter::PluginAdapter;
use rollcall_core::traits::channel::ChannelAdapter;
use rollcall_core::types::{AdapterType, HealthStatus, InboundAction, OutboundReply};
use rollcall_core::RollcallError;

/// A mock messaging channel for testing.
///
/// Provides two queues:
/// - **inbound**: Actions injected via `inject()` are returned by `receive()`
/// - **sent**: Replies passed to `send()` are captured and retrievable via `sent_replies()`
///
/// Once closed and drained, `receive()` fails with a "channel closed" error,
/// which ends the bot loop.
pub struct MockChannel {
    inbound: Arc<Mutex<VecDeque<InboundAction>>>,
    sent: Arc<Mutex<Vec<OutboundReply>>>,
    notify: Arc<Notify>,
    closed: AtomicBool,
}

impl MockChannel {
    /// An open channel with empty queues. `receive()` waits for injections.
    pub fn new() -> Self {
        Self {
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// A channel that replays `actions` and then reports itself closed.
    pub fn scripted(actions: Vec<InboundAction>) -> Self {
        Self {
            inbound: Arc::new(Mutex::new(actions.into())),
            closed: AtomicBool::new(true),
            ..Self::new()
        }
    }

    /// Inject an inbound action into the receive queue.
    pub async fn inject(&self, action: InboundAction) {
        self.inbound.lock().await.push_back(action);
        self.notify.notify_one();
    }

    /// After the queue drains, `receive()` reports the channel closed.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// All replies that were sent through `send()`.
    pub async fn sent_replies(&self) -> Vec<OutboundReply> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, RollcallError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RollcallError> {
        self.close();
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    async fn connect(&mut self) -> Result<(), RollcallError> {
        Ok(())
    }

    async fn send(&self, reply: OutboundReply) -> Result<(), RollcallError> {
        self.sent.lock().await.push(reply);
        Ok(())
    }

    async fn receive(&self) -> Result<InboundAction, RollcallError> {
        loop {
            let notified = self.notify.notified();
            {
                let mut queue = self.inbound.lock().await;
                if let Some(action) = queue.pop_front() {
                    return Ok(action);
                }
            }
            if self.closed.load(Ordering::SeqCst) {
                return Err(RollcallError::Channel {
                    message: "mock channel closed".to_string(),
                    source: None,
                });
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_core::types::{ActionKind, UserIdentity};

    fn text(body: &str) -> InboundAction {
        InboundAction {
            user: UserIdentity {
                id: 7,
                username: Some("tester".into()),
                first_name: "Test".into(),
                last_name: None,
            },
            chat_id: 7,
            kind: ActionKind::Text(body.into()),
        }
    }

    #[tokio::test]
    async fn scripted_actions_then_closed() {
        let channel = MockChannel::scripted(vec![text("first"), text("second")]);
        assert_eq!(channel.receive().await.unwrap().kind, ActionKind::Text("first".into()));
        assert_eq!(channel.receive().await.unwrap().kind, ActionKind::Text("second".into()));
        let err = channel.receive().await.unwrap_err();
        assert!(err.to_string().contains("closed"));
    }

    #[tokio::test]
    async fn send_captures_replies() {
        let channel = MockChannel::new();
        channel.send(OutboundReply::text(1, "hi")).await.unwrap();
        channel.send(OutboundReply::text(1, "again")).await.unwrap();
        assert_eq!(channel.sent_count().await, 2);
        assert_eq!(channel.sent_replies().await[0].text_content(), Some("hi"));

        channel.clear_sent().await;
        assert_eq!(channel.sent_count().await, 0);
    }

    #[tokio::test]
    async fn receive_waits_for_injection() {
        let channel = Arc::new(MockChannel::new());
        let channel_clone = channel.clone();

        tokio::spawn(async move {
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
            channel_clone.inject(text("delayed")).await;
        });

        let received = tokio::time::timeout(
            tokio::time::Duration::from_secs(2),
            channel.receive(),
        )
        .await
        .expect("receive timed out")
        .unwrap();
        assert_eq!(received.kind, ActionKind::Text("delayed".into()));
    }

    #[tokio::test]
    async fn close_wakes_a_waiting_receiver() {
        let channel = Arc::new(MockChannel::new());
        let waiter = {
            let channel = channel.clone();
            tokio::spawn(async move { channel.receive().await })
        };
        tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
        channel.close();
        let result = tokio::time::timeout(tokio::time::Duration::from_secs(2), waiter)
            .await
            .expect("receiver never woke")
            .unwrap();
        assert!(result.is_err());
    }
}
