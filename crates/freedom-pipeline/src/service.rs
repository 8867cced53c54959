// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring of scanner, propagator, control and workers over one store.

use std::sync::Arc;

use freedom_config::model::PipelineConfig;
use freedom_core::{Clock, EntityStore, FreedomError, TaskQueue};
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::control::MigrationControl;
use crate::handler::{PropagateHandler, ScanHandler};
use crate::propagator::Propagator;
use crate::registry::AdapterRegistry;
use crate::scanner::{ScanSettings, Scanner};
use crate::worker::{TaskWorker, WorkerSettings};

/// The assembled migration pipeline.
#[derive(Clone)]
pub struct Pipeline {
    pub scanner: Arc<Scanner>,
    pub propagator: Arc<Propagator>,
    pub control: Arc<MigrationControl>,
    pub registry: Arc<AdapterRegistry>,
    queue: Arc<dyn TaskQueue>,
    clock: Arc<dyn Clock>,
    workers: WorkerSettings,
}

impl Pipeline {
    /// Build the pipeline over a store that is both entity store and task queue.
    pub fn new<S>(
        store: Arc<S>,
        registry: Arc<AdapterRegistry>,
        clock: Arc<dyn Clock>,
        config: &PipelineConfig,
    ) -> Self
    where
        S: EntityStore + TaskQueue + 'static,
    {
        let entities: Arc<dyn EntityStore> = store.clone();
        let queue: Arc<dyn TaskQueue> = store;

        let scanner = Arc::new(Scanner::new(
            entities.clone(),
            queue.clone(),
            registry.clone(),
            clock.clone(),
            ScanSettings::from_config(config),
        ));
        let propagator = Arc::new(
            Propagator::new(
                entities.clone(),
                registry.clone(),
                clock.clone(),
                config.lease_duration(),
            )
            .with_comment_spacing(config.propagate_spacing())
            .with_attempt_timeout(config.attempt_timeout()),
        );
        let control = Arc::new(MigrationControl::new(entities, queue.clone()));

        Self {
            scanner,
            propagator,
            control,
            registry,
            queue,
            clock,
            workers: WorkerSettings::from_config(config),
        }
    }

    /// Worker consuming the scan queue.
    pub fn scan_worker(&self) -> TaskWorker {
        TaskWorker::new(
            self.queue.clone(),
            Arc::new(ScanHandler::new(self.scanner.clone())),
            self.clock.clone(),
            self.workers,
        )
    }

    /// Worker consuming the propagate queue.
    pub fn propagate_worker(&self) -> TaskWorker {
        TaskWorker::new(
            self.queue.clone(),
            Arc::new(PropagateHandler::new(self.propagator.clone())),
            self.clock.clone(),
            self.workers,
        )
    }

    /// Run both workers until `cancel` fires and they have drained.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), FreedomError> {
        let scan = tokio::spawn(self.scan_worker().run(cancel.clone()));
        let propagate = tokio::spawn(self.propagate_worker().run(cancel));

        let mut result = Ok(());
        for handle in [scan, propagate] {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(error = %e, "task worker failed");
                    result = Err(e);
                }
                Err(e) => {
                    error!(error = %e, "task worker panicked");
                    result = Err(FreedomError::Internal(format!("task worker panicked: {e}")));
                }
            }
        }
        result
    }
}
