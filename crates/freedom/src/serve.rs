// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `freedom serve` command implementation.
//!
//! Opens the SQLite store, registers an archive source for every source kind
//! and an export destination for every destination kind, then runs the scan
//! and propagate workers next to the HTTP gateway until a shutdown signal.

use std::sync::Arc;

use freedom_adapters::{ArchiveSource, ExportDestination};
use freedom_config::FreedomConfig;
use freedom_config::model::AdaptersConfig;
use freedom_core::{DestinationKind, FreedomError, PluginAdapter, SourceKind, SystemClock};
use freedom_gateway::{GatewayState, ServerConfig};
use freedom_pipeline::{AdapterRegistry, Pipeline};
use freedom_storage::SqliteStore;
use strum::IntoEnumIterator;
use tracing::{error, info};

use crate::shutdown;

/// Registry with the offline adapters for every kind.
pub fn build_registry(config: &AdaptersConfig) -> AdapterRegistry {
    let mut registry = AdapterRegistry::new();
    for kind in SourceKind::iter() {
        registry.register_source(Arc::new(ArchiveSource::from_config(kind, config)));
    }
    for kind in DestinationKind::iter() {
        registry.register_destination(Arc::new(ExportDestination::from_config(kind, config)));
    }
    info!(
        archive_dir = %config.archive_dir,
        export_dir = %config.export_dir,
        "adapter registry initialized"
    );
    registry
}

/// Open the configured store and assemble the pipeline over it.
pub async fn open_pipeline(
    config: &FreedomConfig,
) -> Result<(Arc<SqliteStore>, Pipeline), FreedomError> {
    let store = Arc::new(SqliteStore::open(&config.storage, &config.queue).await?);
    let registry = Arc::new(build_registry(&config.adapters));
    let pipeline = Pipeline::new(
        store.clone(),
        registry,
        Arc::new(SystemClock),
        &config.pipeline,
    );
    Ok((store, pipeline))
}

/// Runs the `freedom serve` command.
pub async fn run_serve(config: FreedomConfig) -> Result<(), FreedomError> {
    info!("starting freedom serve");

    let (store, pipeline) = open_pipeline(&config).await?;
    let cancel = shutdown::install_signal_handler();

    let workers = {
        let pipeline = pipeline.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { pipeline.run(cancel).await })
    };

    let server_config = ServerConfig::from_config(&config.server);
    let served = freedom_gateway::serve(
        &server_config,
        GatewayState::new(pipeline.clone()),
        cancel.clone(),
    )
    .await;
    if let Err(e) = &served {
        error!(error = %e, "gateway failed, stopping workers");
        cancel.cancel();
    }

    let worked = workers
        .await
        .map_err(|e| FreedomError::Internal(format!("pipeline task panicked: {e}")))?;

    pipeline.registry.shutdown().await;
    if let Err(e) = store.shutdown().await {
        error!(error = %e, "store shutdown failed");
    }

    served?;
    worked?;
    info!("freedom serve shutdown complete");
    Ok(())
}
