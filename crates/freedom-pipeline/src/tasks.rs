// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Task queue names and JSON payloads for scan and propagate tasks.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use freedom_core::{FreedomError, MigratableKey, MigrationKey, TaskRequest};

/// Queue that discovers new content, one page per task.
pub const SCAN_QUEUE: &str = "scan";

/// Queue that publishes one Migratable per task.
pub const PROPAGATE_QUEUE: &str = "propagate";

/// Fetch one page of a migration's source history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanTask {
    pub migration: MigrationKey,
    /// Cursor of the page to fetch. Absent for the newest page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_url: Option<String>,
}

impl ScanTask {
    pub fn new(migration: MigrationKey, scan_url: Option<String>) -> Self {
        Self {
            migration,
            scan_url,
        }
    }

    pub fn to_request(&self, countdown: Duration) -> Result<TaskRequest, FreedomError> {
        Ok(TaskRequest::json(SCAN_QUEUE, self)?.with_countdown(countdown))
    }

    pub fn decode(payload: &str) -> Result<Self, FreedomError> {
        Ok(serde_json::from_str(payload)?)
    }
}

/// Publish one Migratable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagateTask {
    pub key: MigratableKey,
}

impl PropagateTask {
    pub fn new(key: MigratableKey) -> Self {
        Self { key }
    }

    pub fn to_request(&self, countdown: Duration) -> Result<TaskRequest, FreedomError> {
        Ok(TaskRequest::json(PROPAGATE_QUEUE, self)?.with_countdown(countdown))
    }

    pub fn decode(payload: &str) -> Result<Self, FreedomError> {
        Ok(serde_json::from_str(payload)?)
    }
}

/// `step * n`, saturating.
pub(crate) fn spaced(step: Duration, n: usize) -> Duration {
    step.saturating_mul(u32::try_from(n).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use freedom_core::{DestinationKind, SourceKind};

    use super::*;

    fn key() -> MigrationKey {
        MigrationKey::new(SourceKind::Facebook, "212038", DestinationKind::WordPress, "snarfed.org")
    }

    #[test]
    fn scan_payload_omits_missing_cursor() {
        let req = ScanTask::new(key(), None).to_request(Duration::ZERO).unwrap();
        assert_eq!(req.queue, SCAN_QUEUE);
        assert!(!req.payload.contains("scan_url"));
        assert_eq!(ScanTask::decode(&req.payload).unwrap(), ScanTask::new(key(), None));
    }

    #[test]
    fn propagate_payload_keeps_ids_with_spaces() {
        let task = PropagateTask::new(MigratableKey::new("id with spaces", key()));
        let req = task.to_request(Duration::from_secs(4)).unwrap();
        assert_eq!(req.queue, PROPAGATE_QUEUE);
        assert_eq!(req.countdown, Duration::from_secs(4));
        assert_eq!(PropagateTask::decode(&req.payload).unwrap(), task);
    }

    #[test]
    fn garbage_payload_is_a_serialization_error() {
        let err = PropagateTask::decode("{not json").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn spacing_multiplies_and_saturates() {
        assert_eq!(spaced(Duration::from_secs(2), 3), Duration::from_secs(6));
        assert_eq!(spaced(Duration::MAX, 2), Duration::MAX);
        assert_eq!(spaced(Duration::from_secs(2), 0), Duration::ZERO);
    }
}
