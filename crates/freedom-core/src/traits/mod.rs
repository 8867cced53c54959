// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for Freedom's pluggable seams.
//!
//! Adapters extend the [`PluginAdapter`] base trait and use `#[async_trait]`
//! for dynamic dispatch compatibility.

pub mod adapter;
pub mod destination;
pub mod queue;
pub mod source;
pub mod storage;

pub use adapter::PluginAdapter;
pub use destination::DestinationAdapter;
pub use queue::{FailOutcome, Task, TaskQueue, TaskRequest, TaskStatus};
pub use source::{SourceAdapter, SourcePage};
pub use storage::{
    EntityStore, MigratableQuery, MigratableUpdate, NewMigratable, Transition, UnitOfWork,
};
