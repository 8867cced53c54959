// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable task queue trait.
//!
//! Tasks are delivered at least once. A claimed task that is neither acked
//! nor failed before its lock expires becomes claimable again.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{Display, EnumString};

use crate::error::FreedomError;

/// A task to be enqueued, optionally delayed by `countdown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRequest {
    pub queue: String,
    /// Serialized task parameters, usually JSON.
    pub payload: String,
    pub countdown: Duration,
}

impl TaskRequest {
    pub fn new(queue: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
            payload: payload.into(),
            countdown: Duration::ZERO,
        }
    }

    /// Serialize `payload` as JSON.
    pub fn json<T: Serialize>(queue: impl Into<String>, payload: &T) -> Result<Self, FreedomError> {
        Ok(Self::new(queue, serde_json::to_string(payload)?))
    }

    /// Delay the first delivery by `countdown`.
    pub fn with_countdown(mut self, countdown: Duration) -> Self {
        self.countdown = countdown;
        self
    }
}

/// Lifecycle of a queued task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    /// Retry budget exhausted.
    Failed,
    /// Discarded because redelivery could not succeed.
    Dropped,
}

/// A task as stored in the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub queue: String,
    pub payload: String,
    pub status: TaskStatus,
    /// Number of failed attempts so far.
    pub attempts: u32,
    pub max_attempts: u32,
    pub run_at: DateTime<Utc>,
    pub locked_until: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// What happened to a task after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOutcome {
    /// The task will be redelivered at `run_at`.
    Retrying { run_at: DateTime<Utc> },
    /// The retry budget is exhausted and the task will not run again.
    Dead,
}

/// A durable, at-least-once task queue.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Add a task. Returns its id.
    async fn enqueue(&self, request: TaskRequest) -> Result<i64, FreedomError>;

    /// Claim the oldest runnable task on `queue`, locking it for `visibility`.
    ///
    /// Pending tasks with `run_at <= now` and processing tasks whose lock has
    /// expired are both claimable.
    async fn claim(
        &self,
        queue: &str,
        now: DateTime<Utc>,
        visibility: Duration,
    ) -> Result<Option<Task>, FreedomError>;

    /// Mark a task as successfully completed.
    async fn ack(&self, id: i64) -> Result<(), FreedomError>;

    /// Record a failed attempt and schedule a retry with exponential backoff.
    async fn fail(
        &self,
        id: i64,
        now: DateTime<Utc>,
        error: &str,
    ) -> Result<FailOutcome, FreedomError>;

    /// Discard a task that can never succeed.
    async fn drop_task(&self, id: i64, reason: &str) -> Result<(), FreedomError>;

    /// Fetch a task by id.
    async fn get_task(&self, id: i64) -> Result<Option<Task>, FreedomError>;

    /// Number of pending or processing tasks on `queue`.
    async fn outstanding(&self, queue: &str) -> Result<u64, FreedomError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_request_serializes_payload() {
        #[derive(Serialize)]
        struct Payload {
            key: &'static str,
        }
        let req = TaskRequest::json("propagate", &Payload { key: "abc" })
            .unwrap()
            .with_countdown(Duration::from_secs(5));
        assert_eq!(req.queue, "propagate");
        assert_eq!(req.payload, r#"{"key":"abc"}"#);
        assert_eq!(req.countdown, Duration::from_secs(5));
    }

    #[test]
    fn task_status_round_trips_through_strings() {
        use std::str::FromStr;
        assert_eq!(TaskStatus::Processing.to_string(), "processing");
        assert_eq!(TaskStatus::from_str("dropped").unwrap(), TaskStatus::Dropped);
    }
}
