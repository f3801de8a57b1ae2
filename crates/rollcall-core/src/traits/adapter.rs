// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait shared by the gateway and storage adapters.

use async_trait::async_trait;

use crate::error::RollcallError;
use crate::types::{AdapterType, HealthStatus};

/// Identity, health, and shutdown for an adapter instance.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Short adapter name used in logs ("telegram", "sqlite").
    fn name(&self) -> &str;

    /// Semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Which seam this adapter plugs into.
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, RollcallError>;

    /// Gracefully shuts down the adapter, releasing any held resources.
    async fn shutdown(&self) -> Result<(), RollcallError>;
}
