// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown coordination with signal handling.
//!
//! Installs handlers for SIGTERM and SIGINT (Ctrl+C), triggering a
//! [`CancellationToken`] that the bot loop monitors. In-flight actions
//! are drained before the process exits.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is received.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => {
                            info!("received SIGINT (Ctrl+C), initiating shutdown");
                        }
                        _ = sigterm.recv() => {
                            info!("received SIGTERM, initiating shutdown");
                        }
                    }
                }
                Err(e) => {
                    error!(error = %e, "failed to install SIGTERM handler, listening for Ctrl+C only");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Closes `tracker` and waits up to `timeout` for its tasks to finish.
pub async fn drain(tracker: &TaskTracker, timeout: Duration) {
    tracker.close();
    if tracker.is_empty() {
        info!("no in-flight actions to drain");
        return;
    }

    info!(count = tracker.len(), "waiting for in-flight actions to complete");
    match tokio::time::timeout(timeout, tracker.wait()).await {
        Ok(()) => info!("all actions drained"),
        Err(_) => warn!(
            remaining = tracker.len(),
            "timeout reached, some actions interrupted"
        ),
    }
}
