// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discovery of new content, one source page per scan task.
//!
//! Each page's items are persisted with create-if-absent semantics, so a
//! redelivered scan task re-inserts nothing and enqueues no duplicate
//! propagate tasks. A page with a next cursor chains one follow-up scan.

use std::sync::Arc;
use std::time::Duration;

use freedom_config::model::PipelineConfig;
use freedom_core::{Clock, EntityStore, FreedomError, Migratable, TaskQueue};
use tracing::{debug, info};

use crate::registry::AdapterRegistry;
use crate::tasks::{PropagateTask, ScanTask, spaced};

/// Timing knobs for the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSettings {
    /// Delay before the follow-up scan, per item on the current page.
    pub delay_per_item: Duration,
    /// Gap between consecutive propagate tasks from one page.
    pub propagate_spacing: Duration,
}

impl ScanSettings {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            delay_per_item: config.scan_delay_per_item(),
            propagate_spacing: config.propagate_spacing(),
        }
    }
}

/// What one scan task did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The migration is gone or stopped. The task is finished without work.
    Skipped { reason: &'static str },
    Scanned {
        /// Items on the fetched page.
        fetched: usize,
        /// Items that were new and got a propagate task.
        created: usize,
        /// Cursor the follow-up scan was enqueued with, if any.
        next_cursor: Option<String>,
    },
}

/// Runs scan tasks.
pub struct Scanner {
    store: Arc<dyn EntityStore>,
    queue: Arc<dyn TaskQueue>,
    registry: Arc<AdapterRegistry>,
    clock: Arc<dyn Clock>,
    settings: ScanSettings,
}

impl Scanner {
    pub fn new(
        store: Arc<dyn EntityStore>,
        queue: Arc<dyn TaskQueue>,
        registry: Arc<AdapterRegistry>,
        clock: Arc<dyn Clock>,
        settings: ScanSettings,
    ) -> Self {
        Self {
            store,
            queue,
            registry,
            clock,
            settings,
        }
    }

    /// Fetch one page and persist its items.
    ///
    /// Adapter errors propagate. Items inserted before the failure stay, and
    /// redelivery skips them.
    pub async fn scan(&self, task: &ScanTask) -> Result<ScanOutcome, FreedomError> {
        let Some(migration) = self.store.get_migration(&task.migration).await? else {
            debug!(migration = %task.migration, "migration not found, dropping scan");
            return Ok(ScanOutcome::Skipped {
                reason: "migration not found",
            });
        };
        if migration.stopped {
            info!(migration = %migration.key, "migration stopped, dropping scan");
            return Ok(ScanOutcome::Skipped {
                reason: "migration stopped",
            });
        }

        let source = self.registry.source(migration.key.source_kind)?;
        let page = source
            .get_posts(&migration, task.scan_url.as_deref())
            .await?;

        let mut created = 0;
        for (index, item) in page.items.iter().enumerate() {
            let migratable = Migratable::from_raw(item, &migration.key, self.clock.now())?;
            let propagate = PropagateTask::new(migratable.key.clone())
                .to_request(spaced(self.settings.propagate_spacing, index))?;
            let (stored, was_created) = self
                .store
                .insert_migratable(migratable, Some(propagate))
                .await?;
            if was_created {
                created += 1;
            } else {
                debug!(key = %stored.key, status = %stored.status, "already seen, skipping");
            }
        }

        if let Some(cursor) = &page.next_cursor {
            let countdown = spaced(self.settings.delay_per_item, page.items.len());
            self.queue
                .enqueue(ScanTask::new(migration.key.clone(), Some(cursor.clone())).to_request(countdown)?)
                .await?;
        }

        info!(
            migration = %migration.key,
            fetched = page.items.len(),
            created,
            more = page.next_cursor.is_some(),
            "scanned page"
        );
        Ok(ScanOutcome::Scanned {
            fetched: page.items.len(),
            created,
            next_cursor: page.next_cursor,
        })
    }
}
