// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end pipeline testing.
//!
//! `TestHarness` assembles a temp SQLite store, a manual clock and mock
//! adapters. Pipeline tests wire scanners, propagators and workers on top.

use std::sync::Arc;

use freedom_config::model::{FreedomConfig, PipelineConfig, StorageConfig};
use freedom_core::{
    DestinationKind, EntityStore, FreedomError, Migration, MigrationKey, SourceKind,
};
use freedom_storage::{Database, RetryPolicy, SqliteStore};

use crate::clock::ManualClock;
use crate::mock_destination::MockDestination;
use crate::mock_source::MockSource;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    source_kind: SourceKind,
    dest_kind: DestinationKind,
    pipeline: PipelineConfig,
    max_attempts: Option<u32>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            source_kind: SourceKind::Facebook,
            dest_kind: DestinationKind::WordPress,
            pipeline: PipelineConfig {
                scan_delay_per_item_secs: 2,
                ..PipelineConfig::default()
            },
            max_attempts: None,
        }
    }

    /// Kind of the mock source and of the default migration key.
    pub fn with_source_kind(mut self, kind: SourceKind) -> Self {
        self.source_kind = kind;
        self
    }

    /// Kind of the mock destination and of the default migration key.
    pub fn with_dest_kind(mut self, kind: DestinationKind) -> Self {
        self.dest_kind = kind;
        self
    }

    /// Override pipeline timing.
    pub fn with_pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Cap task attempts.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, FreedomError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| FreedomError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");
        let db_path_str = db_path.to_string_lossy().to_string();

        let mut config = FreedomConfig {
            storage: StorageConfig {
                database_path: db_path_str.clone(),
                wal_mode: true,
            },
            pipeline: self.pipeline,
            ..FreedomConfig::default()
        };
        if let Some(max_attempts) = self.max_attempts {
            config.queue.max_attempts = max_attempts;
        }

        let clock = Arc::new(ManualClock::default());
        let db = Database::open(&db_path_str).await?;
        let store = Arc::new(SqliteStore::new(
            db,
            clock.clone(),
            RetryPolicy::from_config(&config.queue),
        ));

        Ok(TestHarness {
            store,
            clock,
            source: Arc::new(MockSource::new(self.source_kind)),
            destination: Arc::new(MockDestination::new(self.dest_kind)),
            migration_key: MigrationKey::new(self.source_kind, "212038", self.dest_kind, "snarfed.org"),
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock adapters and temp storage.
pub struct TestHarness {
    /// SQLite store and task queue (temp DB, cleaned up on drop).
    pub store: Arc<SqliteStore>,
    /// The clock the store and pipeline read.
    pub clock: Arc<ManualClock>,
    pub source: Arc<MockSource>,
    pub destination: Arc<MockDestination>,
    /// Key pairing the mock source and destination.
    pub migration_key: MigrationKey,
    pub config: FreedomConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Get or create the harness migration.
    pub async fn migration(&self) -> Result<Migration, FreedomError> {
        let (migration, _) = self.store.get_or_insert_migration(&self.migration_key).await?;
        Ok(migration)
    }
}

#[cfg(test)]
mod tests {
    use freedom_core::{Clock, TaskQueue};

    use super::*;

    #[tokio::test]
    async fn harness_builds_with_defaults() {
        let harness = TestHarness::builder().build().await.unwrap();
        assert_eq!(harness.migration_key.source_kind, SourceKind::Facebook);
        assert_eq!(harness.config.pipeline.lease_duration_secs, 720);
        assert!(std::path::Path::new(&harness.config.storage.database_path).exists());
    }

    #[tokio::test]
    async fn migration_is_created_once() {
        let harness = TestHarness::builder().build().await.unwrap();
        let first = harness.migration().await.unwrap();
        let second = harness.migration().await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.created_at, harness.clock.now());
        assert_eq!(harness.store.outstanding("scan").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn max_attempts_override_reaches_the_store() {
        let harness = TestHarness::builder().with_max_attempts(2).build().await.unwrap();
        assert_eq!(harness.store.retry_policy().max_attempts, 2);
    }
}
