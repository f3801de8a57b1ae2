// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage lifecycle mock that records `initialize` and `close` calls.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use rollcall_core::types::{AdapterType, HealthStatus};
use rollcall_core::{PluginAdapter, RollcallError, StorageAdapter};

#[derive(Default)]
pub struct MockStorage {
    initialized: AtomicBool,
    closed: AtomicBool,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PluginAdapter for MockStorage {
    fn name(&self) -> &str {
        "mock-storage"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, RollcallError> {
        Ok(if self.is_closed() {
            HealthStatus::Unhealthy("closed".into())
        } else {
            HealthStatus::Healthy
        })
    }

    async fn shutdown(&self) -> Result<(), RollcallError> {
        self.close().await
    }
}

#[async_trait]
impl StorageAdapter for MockStorage {
    async fn initialize(&self) -> Result<(), RollcallError> {
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<(), RollcallError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
