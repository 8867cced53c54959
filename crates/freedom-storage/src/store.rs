// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`EntityStore`] and [`TaskQueue`] traits.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use freedom_config::model::{QueueConfig, StorageConfig};
use freedom_core::{
    AdapterType, Clock, DestinationAccount, DestinationKind, EntityStore, FailOutcome,
    FreedomError, HealthStatus, Migratable, MigratableKey, MigratableQuery, MigratableUpdate,
    Migration, MigrationKey, PluginAdapter, SourceAccount, SourceKind, SystemClock, Task,
    TaskQueue, TaskRequest,
};

use crate::database::{Database, map_tr_err};
use crate::queries;
use crate::queries::tasks::RetryPolicy;

/// SQLite-backed entity store and task queue sharing one writer connection.
///
/// Sharing the connection is what lets entity writes and task enqueues
/// commit in one transaction.
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

impl SqliteStore {
    /// Wrap an open database.
    pub fn new(db: Database, clock: Arc<dyn Clock>, retry: RetryPolicy) -> Self {
        Self { db, clock, retry }
    }

    /// Open the configured database with the system clock.
    pub async fn open(storage: &StorageConfig, queue: &QueueConfig) -> Result<Self, FreedomError> {
        let db = Database::open_with(&storage.database_path, storage.wal_mode).await?;
        debug!(path = %storage.database_path, "SQLite store opened");
        Ok(Self::new(
            db,
            Arc::new(SystemClock),
            RetryPolicy::from_config(queue),
        ))
    }

    /// The underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// All tasks on `queue`, oldest first.
    pub async fn list_tasks(&self, queue: &str) -> Result<Vec<Task>, FreedomError> {
        queries::tasks::list_tasks(&self.db, queue).await
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, FreedomError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), FreedomError> {
        self.db.checkpoint().await?;
        debug!("shutdown: WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl EntityStore for SqliteStore {
    async fn get_migration(&self, key: &MigrationKey) -> Result<Option<Migration>, FreedomError> {
        queries::migrations::get_migration(&self.db, key).await
    }

    async fn get_migration_by_id(&self, id: i64) -> Result<Option<Migration>, FreedomError> {
        queries::migrations::get_migration_by_id(&self.db, id).await
    }

    async fn get_or_insert_migration(
        &self,
        key: &MigrationKey,
    ) -> Result<(Migration, bool), FreedomError> {
        queries::migrations::get_or_insert_migration(&self.db, key, self.now()).await
    }

    async fn save_migration(&self, migration: &Migration) -> Result<(), FreedomError> {
        queries::migrations::save_migration(&self.db, migration, self.now()).await
    }

    async fn get_migratable(
        &self,
        key: &MigratableKey,
    ) -> Result<Option<Migratable>, FreedomError> {
        queries::migratables::get_migratable(&self.db, key).await
    }

    async fn save_migratable(&self, migratable: &Migratable) -> Result<(), FreedomError> {
        queries::migratables::save_migratable(&self.db, migratable, self.now()).await
    }

    async fn insert_migratable(
        &self,
        migratable: Migratable,
        task: Option<TaskRequest>,
    ) -> Result<(Migratable, bool), FreedomError> {
        queries::migratables::insert_migratable(
            &self.db,
            migratable,
            task,
            self.now(),
            self.retry.max_attempts,
        )
        .await
    }

    async fn update_migratable(
        &self,
        key: &MigratableKey,
        update: MigratableUpdate,
    ) -> Result<Option<Migratable>, FreedomError> {
        queries::migratables::update_migratable(
            &self.db,
            key,
            update,
            self.now(),
            self.retry.max_attempts,
        )
        .await
    }

    async fn query_migratables(
        &self,
        query: &MigratableQuery,
    ) -> Result<Vec<Migratable>, FreedomError> {
        queries::migratables::query_migratables(&self.db, query).await
    }

    async fn save_source_account(&self, account: &SourceAccount) -> Result<(), FreedomError> {
        queries::accounts::save_source_account(&self.db, account, self.now()).await
    }

    async fn get_source_account(
        &self,
        kind: SourceKind,
        id: &str,
    ) -> Result<Option<SourceAccount>, FreedomError> {
        queries::accounts::get_source_account(&self.db, kind, id).await
    }

    async fn save_destination_account(
        &self,
        account: &DestinationAccount,
    ) -> Result<(), FreedomError> {
        queries::accounts::save_destination_account(&self.db, account, self.now()).await
    }

    async fn get_destination_account(
        &self,
        kind: DestinationKind,
        id: &str,
    ) -> Result<Option<DestinationAccount>, FreedomError> {
        queries::accounts::get_destination_account(&self.db, kind, id).await
    }
}

#[async_trait]
impl TaskQueue for SqliteStore {
    async fn enqueue(&self, request: TaskRequest) -> Result<i64, FreedomError> {
        queries::tasks::enqueue(&self.db, request, self.now(), self.retry).await
    }

    async fn claim(
        &self,
        queue: &str,
        now: DateTime<Utc>,
        visibility: Duration,
    ) -> Result<Option<Task>, FreedomError> {
        queries::tasks::claim(&self.db, queue, now, visibility).await
    }

    async fn ack(&self, id: i64) -> Result<(), FreedomError> {
        queries::tasks::ack(&self.db, id, self.now()).await
    }

    async fn fail(
        &self,
        id: i64,
        now: DateTime<Utc>,
        error: &str,
    ) -> Result<FailOutcome, FreedomError> {
        queries::tasks::fail(&self.db, id, now, error, self.retry).await
    }

    async fn drop_task(&self, id: i64, reason: &str) -> Result<(), FreedomError> {
        queries::tasks::drop_task(&self.db, id, reason, self.now()).await
    }

    async fn get_task(&self, id: i64) -> Result<Option<Task>, FreedomError> {
        queries::tasks::get_task(&self.db, id).await
    }

    async fn outstanding(&self, queue: &str) -> Result<u64, FreedomError> {
        queries::tasks::outstanding(&self.db, queue).await
    }
}
