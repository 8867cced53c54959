// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Starting, stopping, resuming and inspecting migrations.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use freedom_core::{
    EntityStore, FreedomError, MigratableKind, MigratableQuery, Migration, MigrationKey, Status,
    TaskQueue,
};

use crate::tasks::ScanTask;

/// Number of Migratables listed per status on the status page.
pub const STATUS_PAGE_LIMIT: usize = 20;

/// User-facing result of a stop or resume request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ControlMessage {
    Stopped,
    AlreadyStopped,
    Resumed,
    AlreadyRunning,
}

impl ControlMessage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlMessage::Stopped => "Stopped migration.",
            ControlMessage::AlreadyStopped => "Migration is already stopped.",
            ControlMessage::Resumed => "Resumed migration.",
            ControlMessage::AlreadyRunning => "Migration is already running.",
        }
    }
}

impl fmt::Display for ControlMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the status page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigratableSummary {
    pub item_id: String,
    pub kind: MigratableKind,
    pub status: Status,
    /// Title, or an excerpt of the content.
    pub title: String,
    pub url: Option<String>,
    pub dest_id: Option<String>,
    pub last_updated: DateTime<Utc>,
}

/// A migration and its most recently updated Migratables, grouped by status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationStatus {
    pub migration: Migration,
    pub new: Vec<MigratableSummary>,
    pub processing: Vec<MigratableSummary>,
    pub complete: Vec<MigratableSummary>,
}

/// Migration lifecycle operations.
pub struct MigrationControl {
    store: Arc<dyn EntityStore>,
    queue: Arc<dyn TaskQueue>,
}

impl MigrationControl {
    pub fn new(store: Arc<dyn EntityStore>, queue: Arc<dyn TaskQueue>) -> Self {
        Self { store, queue }
    }

    /// Get or create the migration for `key`. A newly created migration gets
    /// its first scan task.
    pub async fn start(&self, key: &MigrationKey) -> Result<Migration, FreedomError> {
        let (migration, created) = self.store.get_or_insert_migration(key).await?;
        if created {
            self.enqueue_first_scan(&migration).await?;
            info!(migration = %migration.key, id = migration.id, "started migration");
        } else {
            info!(migration = %migration.key, id = migration.id, "migration already exists");
        }
        Ok(migration)
    }

    /// Pause discovery. Propagate tasks already queued still run.
    pub async fn stop(&self, id: i64) -> Result<ControlMessage, FreedomError> {
        let mut migration = self.load(id).await?;
        if migration.stopped {
            return Ok(ControlMessage::AlreadyStopped);
        }
        migration.stopped = true;
        self.store.save_migration(&migration).await?;
        info!(migration = %migration.key, "stopped migration");
        Ok(ControlMessage::Stopped)
    }

    /// Unpause discovery and rescan from the newest page.
    pub async fn resume(&self, id: i64) -> Result<ControlMessage, FreedomError> {
        let mut migration = self.load(id).await?;
        if !migration.stopped {
            return Ok(ControlMessage::AlreadyRunning);
        }
        migration.stopped = false;
        self.store.save_migration(&migration).await?;
        self.enqueue_first_scan(&migration).await?;
        info!(migration = %migration.key, "resumed migration");
        Ok(ControlMessage::Resumed)
    }

    /// The migration and up to [`STATUS_PAGE_LIMIT`] Migratables per status,
    /// newest first.
    pub async fn status(&self, id: i64) -> Result<MigrationStatus, FreedomError> {
        let migration = self.load(id).await?;
        let new = self.summaries(&migration.key, Status::New).await?;
        let processing = self.summaries(&migration.key, Status::Processing).await?;
        let complete = self.summaries(&migration.key, Status::Complete).await?;
        Ok(MigrationStatus {
            migration,
            new,
            processing,
            complete,
        })
    }

    async fn load(&self, id: i64) -> Result<Migration, FreedomError> {
        self.store
            .get_migration_by_id(id)
            .await?
            .ok_or_else(|| FreedomError::not_found("migration", id.to_string()))
    }

    async fn enqueue_first_scan(&self, migration: &Migration) -> Result<(), FreedomError> {
        self.queue
            .enqueue(ScanTask::new(migration.key.clone(), None).to_request(Duration::ZERO)?)
            .await?;
        Ok(())
    }

    async fn summaries(
        &self,
        key: &MigrationKey,
        status: Status,
    ) -> Result<Vec<MigratableSummary>, FreedomError> {
        let query = MigratableQuery::new(key.clone())
            .status(status)
            .limit(STATUS_PAGE_LIMIT);
        Ok(self
            .store
            .query_migratables(&query)
            .await?
            .into_iter()
            .map(|m| {
                let activity = m.to_activity().ok();
                MigratableSummary {
                    item_id: m.item_id().to_string(),
                    kind: m.kind,
                    status: m.status,
                    title: activity
                        .as_ref()
                        .map(|a| a.title_or_excerpt())
                        .unwrap_or_else(|| m.item_id().to_string()),
                    url: activity.and_then(|a| a.url),
                    dest_id: m.dest_id.clone(),
                    last_updated: m.last_updated,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_the_status_page() {
        assert_eq!(ControlMessage::Stopped.to_string(), "Stopped migration.");
        assert_eq!(ControlMessage::AlreadyStopped.to_string(), "Migration is already stopped.");
        assert_eq!(ControlMessage::Resumed.to_string(), "Resumed migration.");
        assert_eq!(ControlMessage::AlreadyRunning.to_string(), "Migration is already running.");
    }
}
