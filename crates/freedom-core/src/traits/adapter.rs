// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait that all source and destination adapters implement.

use async_trait::async_trait;

use crate::error::FreedomError;
use crate::types::{AdapterType, HealthStatus};

/// The base trait for all Freedom adapters.
///
/// Provides identity, lifecycle, and health check capabilities shared by
/// source and destination adapters.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Returns whether this is a source or destination adapter.
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, FreedomError>;

    /// Gracefully shuts down the adapter, releasing any held resources.
    async fn shutdown(&self) -> Result<(), FreedomError>;
}
