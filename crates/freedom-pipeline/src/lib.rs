// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scan and propagate task pipeline for the Freedom migration pipeline.
//!
//! A migration starts with one scan task. Each scan task fetches a page of
//! source posts, stores unseen ones as Migratables with a propagate task each
//! and chains the next page. Each propagate task leases one Migratable,
//! publishes it to the destination and marks it complete, fanning out its
//! comments. Task workers drive both queues.

pub mod control;
pub mod handler;
pub mod propagator;
pub mod registry;
pub mod scanner;
pub mod service;
pub mod tasks;
pub mod worker;

pub use control::{
    ControlMessage, MigratableSummary, MigrationControl, MigrationStatus, STATUS_PAGE_LIMIT,
};
pub use handler::{PropagateHandler, ScanHandler, TaskHandler};
pub use propagator::{PropagateOutcome, Propagator};
pub use registry::AdapterRegistry;
pub use scanner::{ScanOutcome, ScanSettings, Scanner};
pub use service::Pipeline;
pub use tasks::{PROPAGATE_QUEUE, PropagateTask, SCAN_QUEUE, ScanTask};
pub use worker::{Action, Disposition, TaskWorker, WorkerSettings, classify};
