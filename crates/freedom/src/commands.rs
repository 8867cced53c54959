// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `freedom migrate`, `freedom stop` and `freedom resume`.
//!
//! These only touch the store. A running `freedom serve` picks up the tasks
//! they enqueue.

use freedom_core::{FreedomError, MigrationKey};
use freedom_pipeline::Pipeline;

pub async fn run_migrate(pipeline: &Pipeline, key: &MigrationKey) -> Result<(), FreedomError> {
    let migration = pipeline.control.start(key).await?;
    println!("migration {}: {}", migration.id, migration.key);
    if migration.stopped {
        println!("migration is stopped, run `freedom resume {}` to continue", migration.id);
    }
    Ok(())
}

pub async fn run_stop(pipeline: &Pipeline, id: i64) -> Result<(), FreedomError> {
    println!("{}", pipeline.control.stop(id).await?);
    Ok(())
}

pub async fn run_resume(pipeline: &Pipeline, id: i64) -> Result<(), FreedomError> {
    println!("{}", pipeline.control.resume(id).await?);
    Ok(())
}
