// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entity store trait: persistence for Migrations, Migratables, and accounts.
//!
//! Every write that must be paired with follow-up tasks goes through
//! [`EntityStore::insert_migratable`] or [`EntityStore::update_migratable`],
//! which commit the entity change and the task inserts together or not at all.

use async_trait::async_trait;

use crate::error::FreedomError;
use crate::model::{
    DestinationAccount, Migratable, MigratableKey, Migration, MigrationKey, SourceAccount,
};
use crate::traits::queue::TaskRequest;
use crate::types::{DestinationKind, MigratableKind, SourceKind, Status};

/// What to do with the entity read by an update closure.
#[derive(Debug, Clone)]
pub enum Transition {
    /// Leave the stored entity unchanged.
    Keep,
    /// Write this entity back.
    Save(Migratable),
}

/// A Migratable to create if absent, with the task to enqueue if it was created.
#[derive(Debug, Clone)]
pub struct NewMigratable {
    pub migratable: Migratable,
    pub task: Option<TaskRequest>,
}

/// The writes produced by one read-modify-write of a Migratable.
#[derive(Debug, Clone)]
pub struct UnitOfWork {
    pub transition: Transition,
    /// Other Migratables to create if absent, e.g. a post's comments.
    pub inserts: Vec<NewMigratable>,
    /// Tasks enqueued unconditionally.
    pub tasks: Vec<TaskRequest>,
}

impl UnitOfWork {
    /// No entity change and no tasks.
    pub fn keep() -> Self {
        Self {
            transition: Transition::Keep,
            inserts: Vec::new(),
            tasks: Vec::new(),
        }
    }

    /// Save `migratable` with no tasks.
    pub fn save(migratable: Migratable) -> Self {
        Self {
            transition: Transition::Save(migratable),
            ..Self::keep()
        }
    }

    pub fn with_insert(mut self, migratable: Migratable, task: Option<TaskRequest>) -> Self {
        self.inserts.push(NewMigratable { migratable, task });
        self
    }

    pub fn with_task(mut self, task: TaskRequest) -> Self {
        self.tasks.push(task);
        self
    }
}

/// Read-modify-write closure passed to [`EntityStore::update_migratable`].
///
/// Receives the current entity, or `None` if it does not exist. Returning an
/// error aborts the unit with no mutation.
pub type MigratableUpdate =
    Box<dyn FnOnce(Option<Migratable>) -> Result<UnitOfWork, FreedomError> + Send>;

/// Filter for listing Migratables of one Migration.
#[derive(Debug, Clone)]
pub struct MigratableQuery {
    pub migration: MigrationKey,
    pub status: Option<Status>,
    pub kind: Option<MigratableKind>,
    pub limit: usize,
}

impl MigratableQuery {
    pub fn new(migration: MigrationKey) -> Self {
        Self {
            migration,
            status: None,
            kind: None,
            limit: 100,
        }
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn kind(mut self, kind: MigratableKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Durable storage for the migration pipeline's entities.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn get_migration(&self, key: &MigrationKey) -> Result<Option<Migration>, FreedomError>;

    async fn get_migration_by_id(&self, id: i64) -> Result<Option<Migration>, FreedomError>;

    /// Fetch the Migration for `key`, creating it if absent.
    ///
    /// Returns `(migration, created)`.
    async fn get_or_insert_migration(
        &self,
        key: &MigrationKey,
    ) -> Result<(Migration, bool), FreedomError>;

    async fn save_migration(&self, migration: &Migration) -> Result<(), FreedomError>;

    async fn get_migratable(&self, key: &MigratableKey)
    -> Result<Option<Migratable>, FreedomError>;

    async fn save_migratable(&self, migratable: &Migratable) -> Result<(), FreedomError>;

    /// Create `migratable` if absent, enqueueing `task` in the same unit.
    ///
    /// Returns the stored entity and whether it was created. An existing
    /// entity is returned unchanged and no task is enqueued.
    async fn insert_migratable(
        &self,
        migratable: Migratable,
        task: Option<TaskRequest>,
    ) -> Result<(Migratable, bool), FreedomError>;

    /// Atomic read-modify-write of one Migratable.
    ///
    /// Returns the entity as stored after the unit commits, or `None` if it
    /// does not exist and the closure chose [`Transition::Keep`].
    async fn update_migratable(
        &self,
        key: &MigratableKey,
        update: MigratableUpdate,
    ) -> Result<Option<Migratable>, FreedomError>;

    /// List Migratables, newest `last_updated` first.
    async fn query_migratables(
        &self,
        query: &MigratableQuery,
    ) -> Result<Vec<Migratable>, FreedomError>;

    async fn save_source_account(&self, account: &SourceAccount) -> Result<(), FreedomError>;

    async fn get_source_account(
        &self,
        kind: SourceKind,
        id: &str,
    ) -> Result<Option<SourceAccount>, FreedomError>;

    async fn save_destination_account(
        &self,
        account: &DestinationAccount,
    ) -> Result<(), FreedomError>;

    async fn get_destination_account(
        &self,
        kind: DestinationKind,
        id: &str,
    ) -> Result<Option<DestinationAccount>, FreedomError>;
}
