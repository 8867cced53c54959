// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Task handlers binding queue payloads to the scanner and propagator.

use std::sync::Arc;

use async_trait::async_trait;
use freedom_core::FreedomError;

use crate::propagator::Propagator;
use crate::scanner::Scanner;
use crate::tasks::{PROPAGATE_QUEUE, PropagateTask, SCAN_QUEUE, ScanTask};

/// Executes the payload of one claimed task.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// The queue this handler consumes.
    fn queue(&self) -> &'static str;

    async fn handle(&self, payload: &str) -> Result<(), FreedomError>;
}

/// Consumes the scan queue.
pub struct ScanHandler {
    scanner: Arc<Scanner>,
}

impl ScanHandler {
    pub fn new(scanner: Arc<Scanner>) -> Self {
        Self { scanner }
    }
}

#[async_trait]
impl TaskHandler for ScanHandler {
    fn queue(&self) -> &'static str {
        SCAN_QUEUE
    }

    async fn handle(&self, payload: &str) -> Result<(), FreedomError> {
        let task = ScanTask::decode(payload)?;
        self.scanner.scan(&task).await?;
        Ok(())
    }
}

/// Consumes the propagate queue.
pub struct PropagateHandler {
    propagator: Arc<Propagator>,
}

impl PropagateHandler {
    pub fn new(propagator: Arc<Propagator>) -> Self {
        Self { propagator }
    }
}

#[async_trait]
impl TaskHandler for PropagateHandler {
    fn queue(&self) -> &'static str {
        PROPAGATE_QUEUE
    }

    async fn handle(&self, payload: &str) -> Result<(), FreedomError> {
        let task = PropagateTask::decode(payload)?;
        self.propagator.propagate(&task.key).await?;
        Ok(())
    }
}
