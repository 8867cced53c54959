// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable task queue operations.
//!
//! Claims, retries and crash recovery are all expressed as updates on the
//! `tasks` table. [`insert_task`] is synchronous so entity writes can enqueue
//! inside their own transaction.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use freedom_config::model::QueueConfig;
use freedom_core::{FailOutcome, FreedomError, Task, TaskRequest, TaskStatus};

use crate::database::{Database, map_tr_err};
use crate::models::{TASK_COLUMNS, task_from_row, ts};

/// Bounded exponential backoff for failed tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &QueueConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff_base: Duration::from_secs(config.backoff_base_secs),
            backoff_max: Duration::from_secs(config.backoff_max_secs),
        }
    }

    /// Delay before the next attempt, given how many attempts already failed.
    pub fn backoff(&self, prior_failures: u32) -> Duration {
        let factor = 2u32.checked_pow(prior_failures).unwrap_or(u32::MAX);
        self.backoff_base
            .checked_mul(factor)
            .map_or(self.backoff_max, |d| d.min(self.backoff_max))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&QueueConfig::default())
    }
}

/// `now + delay`, saturating at the latest representable time.
pub(crate) fn after(now: DateTime<Utc>, delay: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(delay)
        .ok()
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Insert a task on an open connection or transaction. Returns its id.
pub fn insert_task(
    conn: &Connection,
    request: &TaskRequest,
    now: DateTime<Utc>,
    max_attempts: u32,
) -> rusqlite::Result<i64> {
    let run_at = ts(after(now, request.countdown));
    let now = ts(now);
    conn.execute(
        "INSERT INTO tasks (queue_name, payload, max_attempts, run_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![request.queue, request.payload, max_attempts, run_at, now],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Enqueue a task. Returns the auto-generated task id.
pub async fn enqueue(
    db: &Database,
    request: TaskRequest,
    now: DateTime<Utc>,
    policy: RetryPolicy,
) -> Result<i64, FreedomError> {
    db.connection()
        .call(move |conn| insert_task(conn, &request, now, policy.max_attempts))
        .await
        .map_err(map_tr_err)
}

/// Claim the oldest runnable task on `queue`.
///
/// Pending tasks whose `run_at` has passed and processing tasks whose lock
/// expired are both runnable. Reclaiming an expired lock counts as a failed
/// attempt; a task that thereby exhausts its budget is marked failed and the
/// next candidate is tried.
pub async fn claim(
    db: &Database,
    queue: &str,
    now: DateTime<Utc>,
    visibility: Duration,
) -> Result<Option<Task>, FreedomError> {
    let queue = queue.to_string();
    let deadline = after(now, visibility);
    let locked_until = ts(deadline);
    let now = ts(now);
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let claimed = loop {
                let candidate = tx
                    .query_row(
                        &format!(
                            "SELECT {TASK_COLUMNS} FROM tasks
                             WHERE queue_name = ?1
                               AND ((status = 'pending' AND run_at <= ?2)
                                 OR (status = 'processing' AND locked_until <= ?2))
                             ORDER BY run_at ASC, id ASC
                             LIMIT 1"
                        ),
                        params![queue, now],
                        task_from_row,
                    )
                    .optional()?;
                let Some(mut task) = candidate else {
                    break None;
                };

                if task.status == TaskStatus::Processing {
                    task.attempts += 1;
                    task.last_error = Some("lock expired before the attempt finished".into());
                    if task.attempts >= task.max_attempts {
                        tx.execute(
                            "UPDATE tasks SET status = 'failed', attempts = ?2, locked_until = NULL,
                             last_error = ?3, updated_at = ?4 WHERE id = ?1",
                            params![task.id, task.attempts, task.last_error, now],
                        )?;
                        tracing::warn!(task_id = task.id, queue = %task.queue, "task lock expired on its final attempt");
                        continue;
                    }
                }

                tx.execute(
                    "UPDATE tasks SET status = 'processing', attempts = ?2, locked_until = ?3,
                     last_error = ?4, updated_at = ?5 WHERE id = ?1",
                    params![task.id, task.attempts, locked_until, task.last_error, now],
                )?;
                task.status = TaskStatus::Processing;
                task.locked_until = Some(deadline);
                break Some(task);
            };
            tx.commit()?;
            Ok(claimed)
        })
        .await
        .map_err(map_tr_err)
}

/// Mark a task as completed.
pub async fn ack(db: &Database, id: i64, now: DateTime<Utc>) -> Result<(), FreedomError> {
    finish(db, id, TaskStatus::Completed, None, now).await
}

/// Mark a task as dropped. It will never run again.
pub async fn drop_task(
    db: &Database,
    id: i64,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<(), FreedomError> {
    finish(db, id, TaskStatus::Dropped, Some(reason.to_string()), now).await
}

async fn finish(
    db: &Database,
    id: i64,
    status: TaskStatus,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), FreedomError> {
    let status_str = status.to_string();
    let now = ts(now);
    let updated = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE tasks SET status = ?2, locked_until = NULL,
                 last_error = COALESCE(?3, last_error), updated_at = ?4
                 WHERE id = ?1",
                params![id, status_str, reason, now],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if updated == 0 {
        return Err(FreedomError::not_found("task", id.to_string()));
    }
    Ok(())
}

/// Record a failed attempt.
///
/// Reschedules the task with exponential backoff, or marks it failed once
/// `max_attempts` is reached.
pub async fn fail(
    db: &Database,
    id: i64,
    now: DateTime<Utc>,
    error: &str,
    policy: RetryPolicy,
) -> Result<FailOutcome, FreedomError> {
    let error = error.to_string();
    db.connection()
        .call(move |conn| -> Result<Result<FailOutcome, FreedomError>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let current: Option<(u32, u32)> = tx
                .query_row(
                    "SELECT attempts, max_attempts FROM tasks WHERE id = ?1",
                    params![id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let Some((prior_failures, max_attempts)) = current else {
                return Ok(Err(FreedomError::not_found("task", id.to_string())));
            };

            let attempts = prior_failures + 1;
            let outcome = if attempts >= max_attempts {
                tx.execute(
                    "UPDATE tasks SET status = 'failed', attempts = ?2, locked_until = NULL,
                     last_error = ?3, updated_at = ?4 WHERE id = ?1",
                    params![id, attempts, error, ts(now)],
                )?;
                FailOutcome::Dead
            } else {
                let run_at = after(now, policy.backoff(prior_failures));
                tx.execute(
                    "UPDATE tasks SET status = 'pending', attempts = ?2, locked_until = NULL,
                     run_at = ?3, last_error = ?4, updated_at = ?5 WHERE id = ?1",
                    params![id, attempts, ts(run_at), error, ts(now)],
                )?;
                FailOutcome::Retrying { run_at }
            };
            tx.commit()?;
            Ok(Ok(outcome))
        })
        .await
        .map_err(map_tr_err)?
}

/// Get a task by id.
pub async fn get_task(db: &Database, id: i64) -> Result<Option<Task>, FreedomError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                params![id],
                task_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// All tasks on `queue`, oldest first. Used by the status page and tests.
pub async fn list_tasks(db: &Database, queue: &str) -> Result<Vec<Task>, FreedomError> {
    let queue = queue.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks WHERE queue_name = ?1 ORDER BY id ASC"
            ))?;
            let rows = stmt.query_map(params![queue], task_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Number of pending or processing tasks on `queue`.
pub async fn outstanding(db: &Database, queue: &str) -> Result<u64, FreedomError> {
    let queue = queue.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM tasks
                 WHERE queue_name = ?1 AND status IN ('pending', 'processing')",
                params![queue],
                |row| row.get::<_, i64>(0),
            )
        })
        .await
        .map_err(map_tr_err)
        .map(|n| n.max(0) as u64)
}
