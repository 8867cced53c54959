// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter registry keyed by provider kind.
//!
//! The scanner resolves a [`SourceAdapter`] by the migration's source kind and
//! the propagator resolves a [`DestinationAdapter`] by its destination kind.

use std::collections::HashMap;
use std::sync::Arc;

use freedom_core::{
    AdapterType, DestinationAdapter, DestinationKind, FreedomError, HealthStatus, SourceAdapter,
    SourceKind,
};
use tracing::{debug, warn};

/// Registry of source and destination adapters.
#[derive(Default, Clone)]
pub struct AdapterRegistry {
    sources: HashMap<SourceKind, Arc<dyn SourceAdapter>>,
    destinations: HashMap<DestinationKind, Arc<dyn DestinationAdapter>>,
}

impl AdapterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source adapter under its own kind, replacing any previous one.
    pub fn register_source(&mut self, adapter: Arc<dyn SourceAdapter>) {
        let kind = adapter.kind();
        debug!(%kind, name = adapter.name(), "registered source adapter");
        self.sources.insert(kind, adapter);
    }

    /// Register a destination adapter under its own kind, replacing any previous one.
    pub fn register_destination(&mut self, adapter: Arc<dyn DestinationAdapter>) {
        let kind = adapter.kind();
        debug!(%kind, name = adapter.name(), "registered destination adapter");
        self.destinations.insert(kind, adapter);
    }

    /// Builder-style [`register_source`](Self::register_source).
    pub fn with_source(mut self, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.register_source(adapter);
        self
    }

    /// Builder-style [`register_destination`](Self::register_destination).
    pub fn with_destination(mut self, adapter: Arc<dyn DestinationAdapter>) -> Self {
        self.register_destination(adapter);
        self
    }

    pub fn source(&self, kind: SourceKind) -> Result<Arc<dyn SourceAdapter>, FreedomError> {
        self.sources
            .get(&kind)
            .cloned()
            .ok_or_else(|| FreedomError::AdapterNotFound {
                adapter_type: AdapterType::Source.to_string(),
                name: kind.to_string(),
            })
    }

    pub fn destination(
        &self,
        kind: DestinationKind,
    ) -> Result<Arc<dyn DestinationAdapter>, FreedomError> {
        self.destinations
            .get(&kind)
            .cloned()
            .ok_or_else(|| FreedomError::AdapterNotFound {
                adapter_type: AdapterType::Destination.to_string(),
                name: kind.to_string(),
            })
    }

    /// Registered source kinds, sorted.
    pub fn source_kinds(&self) -> Vec<SourceKind> {
        let mut kinds: Vec<_> = self.sources.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Registered destination kinds, sorted.
    pub fn destination_kinds(&self) -> Vec<DestinationKind> {
        let mut kinds: Vec<_> = self.destinations.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Health of every registered adapter, as `(name, status)` pairs.
    pub async fn health(&self) -> Vec<(String, HealthStatus)> {
        let mut report = Vec::new();
        for adapter in self.sources.values() {
            report.push((adapter.name().to_string(), check(adapter.health_check().await)));
        }
        for adapter in self.destinations.values() {
            report.push((adapter.name().to_string(), check(adapter.health_check().await)));
        }
        report.sort_by(|a, b| a.0.cmp(&b.0));
        report
    }

    /// Shut down every registered adapter, logging failures.
    pub async fn shutdown(&self) {
        for adapter in self.sources.values() {
            if let Err(e) = adapter.shutdown().await {
                warn!(name = adapter.name(), error = %e, "source adapter shutdown failed");
            }
        }
        for adapter in self.destinations.values() {
            if let Err(e) = adapter.shutdown().await {
                warn!(name = adapter.name(), error = %e, "destination adapter shutdown failed");
            }
        }
    }
}

fn check(result: Result<HealthStatus, FreedomError>) -> HealthStatus {
    result.unwrap_or_else(|e| HealthStatus::Unhealthy(e.to_string()))
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("sources", &self.source_kinds())
            .field("destinations", &self.destination_kinds())
            .finish()
    }
}
