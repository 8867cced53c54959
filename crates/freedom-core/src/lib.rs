// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Freedom migration pipeline.
//!
//! This crate provides the entity model, error types, activity normalization,
//! and the trait seams (sources, destinations, entity store, task queue)
//! used throughout the Freedom workspace.

pub mod activity;
pub mod clock;
pub mod error;
pub mod model;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use activity::Activity;
pub use clock::{Clock, SystemClock};
pub use error::FreedomError;
pub use model::{
    DestinationAccount, Migratable, MigratableKey, Migration, MigrationKey, Payload, RawItem,
    SourceAccount,
};
pub use types::{AdapterType, DestinationKind, HealthStatus, MigratableKind, SourceKind, Status};

pub use traits::{
    DestinationAdapter, EntityStore, FailOutcome, MigratableQuery, MigratableUpdate,
    NewMigratable, PluginAdapter, SourceAdapter, SourcePage, Task, TaskQueue, TaskRequest,
    TaskStatus, Transition, UnitOfWork,
};
