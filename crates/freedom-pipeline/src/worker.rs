// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Polling task worker.
//!
//! A [`TaskWorker`] claims tasks from one queue, runs them through its
//! [`TaskHandler`] under a per-attempt deadline and settles each task:
//! success acks it, fatal errors drop it, anything else schedules a retry.
//! At most `concurrency` attempts run at once. Cancelling the token stops
//! claiming and waits for in-flight attempts.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use freedom_config::model::PipelineConfig;
use freedom_core::{Clock, FailOutcome, FreedomError, Task, TaskQueue};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::handler::TaskHandler;

/// Headroom past the attempt timeout before the worker abandons a handler.
/// Handlers that enforce the timeout themselves get this long to clean up.
pub const CLEANUP_GRACE: Duration = Duration::from_secs(5);

/// How a handler result settles its task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Ack,
    Drop,
    Retry,
}

/// Classify a handler result.
pub fn classify(result: &Result<(), FreedomError>) -> Action {
    match result {
        Ok(()) => Action::Ack,
        Err(e) if e.is_fatal() => Action::Drop,
        Err(_) => Action::Retry,
    }
}

/// Final state of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Acked,
    Dropped,
    Retrying { run_at: DateTime<Utc> },
    /// The retry budget is spent.
    Dead,
}

/// Worker loop tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSettings {
    pub concurrency: usize,
    pub poll_interval: Duration,
    pub attempt_timeout: Duration,
    /// How long a claimed task stays invisible to other claims.
    pub visibility: Duration,
}

impl WorkerSettings {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            concurrency: config.concurrency.max(1),
            poll_interval: config.poll_interval(),
            attempt_timeout: config.attempt_timeout(),
            visibility: config.lease_duration(),
        }
    }
}

/// Claims and executes tasks from one queue.
#[derive(Clone)]
pub struct TaskWorker {
    queue: Arc<dyn TaskQueue>,
    handler: Arc<dyn TaskHandler>,
    clock: Arc<dyn Clock>,
    settings: WorkerSettings,
}

impl TaskWorker {
    pub fn new(
        queue: Arc<dyn TaskQueue>,
        handler: Arc<dyn TaskHandler>,
        clock: Arc<dyn Clock>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            queue,
            handler,
            clock,
            settings,
        }
    }

    /// Name of the queue this worker consumes.
    pub fn queue_name(&self) -> &'static str {
        self.handler.queue()
    }

    /// Claim and execute at most one task inline.
    ///
    /// Returns `None` when nothing is runnable.
    pub async fn run_once(&self) -> Result<Option<Disposition>, FreedomError> {
        match self.claim().await? {
            Some(task) => Ok(Some(self.execute(task).await?)),
            None => Ok(None),
        }
    }

    /// Run [`run_once`](Self::run_once) until nothing is runnable. Returns
    /// the dispositions in order.
    pub async fn drain(&self) -> Result<Vec<Disposition>, FreedomError> {
        let mut done = Vec::new();
        while let Some(disposition) = self.run_once().await? {
            done.push(disposition);
        }
        Ok(done)
    }

    /// Poll the queue until `cancel` fires, then wait for in-flight attempts.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), FreedomError> {
        let queue = self.queue_name();
        let limit = self.settings.concurrency.max(1);
        let semaphore = Arc::new(Semaphore::new(limit));
        info!(queue, concurrency = limit, "task worker running");

        loop {
            let permit = tokio::select! {
                permit = semaphore.clone().acquire_owned() => permit
                    .map_err(|e| FreedomError::Internal(format!("worker semaphore closed: {e}")))?,
                _ = cancel.cancelled() => break,
            };

            let claimed = match self.claim().await {
                Ok(claimed) => claimed,
                Err(e) => {
                    error!(queue, error = %e, "failed to claim task");
                    None
                }
            };

            match claimed {
                Some(task) => {
                    let worker = self.clone();
                    tokio::spawn(async move {
                        let _permit = permit;
                        let id = task.id;
                        if let Err(e) = worker.execute(task).await {
                            error!(queue = worker.queue_name(), task_id = id, error = %e, "failed to settle task");
                        }
                    });
                }
                None => {
                    drop(permit);
                    tokio::select! {
                        _ = tokio::time::sleep(self.settings.poll_interval) => {}
                        _ = cancel.cancelled() => break,
                    }
                }
            }
        }

        info!(queue, "shutdown signal received, draining in-flight tasks");
        let all = u32::try_from(limit).unwrap_or(u32::MAX);
        let _drained = semaphore
            .acquire_many(all)
            .await
            .map_err(|e| FreedomError::Internal(format!("worker semaphore closed: {e}")))?;
        info!(queue, "task worker stopped");
        Ok(())
    }

    async fn claim(&self) -> Result<Option<Task>, FreedomError> {
        self.queue
            .claim(self.queue_name(), self.clock.now(), self.settings.visibility)
            .await
    }

    async fn execute(&self, task: Task) -> Result<Disposition, FreedomError> {
        let queue = self.queue_name();
        debug!(queue, task_id = task.id, attempt = task.attempts + 1, "running task");

        let deadline = self.settings.attempt_timeout.saturating_add(CLEANUP_GRACE);
        let result = match tokio::time::timeout(deadline, self.handler.handle(&task.payload)).await
        {
            Ok(result) => result,
            Err(_) => Err(FreedomError::Timeout {
                duration: self.settings.attempt_timeout,
            }),
        };

        match (classify(&result), result) {
            (_, Ok(())) => {
                self.queue.ack(task.id).await?;
                debug!(queue, task_id = task.id, "task done");
                Ok(Disposition::Acked)
            }
            (Action::Drop, Err(e)) => {
                error!(queue, task_id = task.id, error = %e, "unrecoverable task, dropping");
                self.queue.drop_task(task.id, &e.to_string()).await?;
                Ok(Disposition::Dropped)
            }
            (_, Err(e)) => match self.queue.fail(task.id, self.clock.now(), &e.to_string()).await? {
                FailOutcome::Retrying { run_at } => {
                    warn!(queue, task_id = task.id, error = %e, %run_at, "task failed, will retry");
                    Ok(Disposition::Retrying { run_at })
                }
                FailOutcome::Dead => {
                    error!(queue, task_id = task.id, error = %e, "task failed, out of attempts");
                    Ok(Disposition::Dead)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_follows_error_kind() {
        assert_eq!(classify(&Ok(())), Action::Ack);
        assert_eq!(
            classify(&Err(FreedomError::not_found("migratable", "x"))),
            Action::Drop
        );
        assert_eq!(
            classify(&Err(FreedomError::InvariantViolation("backwards".into()))),
            Action::Drop
        );
        assert_eq!(
            classify(&Err(FreedomError::Serialization("bad payload".into()))),
            Action::Drop
        );
        assert_eq!(
            classify(&Err(FreedomError::Conflict {
                key: "x".into(),
                leased_until: Utc::now(),
            })),
            Action::Retry
        );
        assert_eq!(classify(&Err(FreedomError::destination("503"))), Action::Retry);
        assert_eq!(
            classify(&Err(FreedomError::Timeout {
                duration: Duration::from_secs(600),
            })),
            Action::Retry
        );
    }

    #[test]
    fn settings_take_visibility_from_lease() {
        let settings = WorkerSettings::from_config(&PipelineConfig::default());
        assert_eq!(settings.visibility, Duration::from_secs(720));
        assert_eq!(settings.attempt_timeout, Duration::from_secs(600));
        assert!(settings.visibility > settings.attempt_timeout);
    }
}
