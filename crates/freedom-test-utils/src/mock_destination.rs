// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock destination adapter for deterministic testing.
//!
//! `MockDestination` implements `DestinationAdapter`, captures every publish
//! call and can inject failures, duplicate-content responses and latency.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use freedom_core::{
    Activity, AdapterType, DestinationAdapter, DestinationKind, FreedomError, HealthStatus,
    Migratable, MigratableKind, PluginAdapter,
};

/// One captured publish call.
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub item_id: String,
    pub kind: MigratableKind,
    /// Parent post id for comments.
    pub dest_post_id: Option<String>,
    /// Id handed back to the caller, if any.
    pub dest_id: Option<String>,
    pub activity: Activity,
}

/// A mock publishing site for testing.
///
/// Successful publishes return ids `dest-1`, `dest-2`, ... in call order.
pub struct MockDestination {
    kind: DestinationKind,
    published: Mutex<Vec<Published>>,
    failures: Mutex<VecDeque<FreedomError>>,
    duplicates: Mutex<HashSet<String>>,
    delay: Mutex<Option<Duration>>,
    next_id: AtomicU64,
}

impl MockDestination {
    pub fn new(kind: DestinationKind) -> Self {
        Self {
            kind,
            published: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
            duplicates: Mutex::new(HashSet::new()),
            delay: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Make the next publish call fail with `error`.
    pub async fn fail_next(&self, error: FreedomError) {
        self.failures.lock().await.push_back(error);
    }

    /// Report `DuplicateContent` whenever `item_id` is published.
    pub async fn reject_as_duplicate(&self, item_id: &str) {
        self.duplicates.lock().await.insert(item_id.to_string());
    }

    /// Sleep for `delay` inside every publish call.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.lock().await = Some(delay);
    }

    /// All publish calls that returned successfully, in call order.
    pub async fn published(&self) -> Vec<Published> {
        self.published.lock().await.clone()
    }

    /// Number of successful publish calls.
    pub async fn publish_count(&self) -> usize {
        self.published.lock().await.len()
    }

    /// Number of successful publish calls for one item.
    pub async fn publish_count_for(&self, item_id: &str) -> usize {
        self.published
            .lock()
            .await
            .iter()
            .filter(|p| p.item_id == item_id)
            .count()
    }

    async fn before_publish(&self, item: &Migratable) -> Result<(), FreedomError> {
        let delay = *self.delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.failures.lock().await.pop_front() {
            return Err(err);
        }
        if self.duplicates.lock().await.contains(item.item_id()) {
            return Err(FreedomError::DuplicateContent {
                message: format!("{} already published", item.item_id()),
                dest_id: None,
            });
        }
        Ok(())
    }

    fn allocate_id(&self) -> String {
        format!("dest-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn record(&self, item: &Migratable, activity: &Activity, dest_id: Option<String>) {
        self.published.lock().await.push(Published {
            item_id: item.item_id().to_string(),
            kind: item.kind,
            dest_post_id: item.dest_post_id.clone(),
            dest_id,
            activity: activity.clone(),
        });
    }
}

impl Default for MockDestination {
    fn default() -> Self {
        Self::new(DestinationKind::WordPress)
    }
}

#[async_trait]
impl PluginAdapter for MockDestination {
    fn name(&self) -> &str {
        "mock-destination"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Destination
    }

    async fn health_check(&self) -> Result<HealthStatus, FreedomError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), FreedomError> {
        Ok(())
    }
}

#[async_trait]
impl DestinationAdapter for MockDestination {
    fn kind(&self) -> DestinationKind {
        self.kind
    }

    async fn publish_post(
        &self,
        post: &Migratable,
        activity: &Activity,
    ) -> Result<String, FreedomError> {
        self.before_publish(post).await?;
        let id = self.allocate_id();
        self.record(post, activity, Some(id.clone())).await;
        Ok(id)
    }

    async fn publish_comment(
        &self,
        comment: &Migratable,
        activity: &Activity,
    ) -> Result<Option<String>, FreedomError> {
        self.before_publish(comment).await?;
        if activity.is_empty() {
            self.record(comment, activity, None).await;
            return Ok(None);
        }
        let id = self.allocate_id();
        self.record(comment, activity, Some(id.clone())).await;
        Ok(Some(id))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use freedom_core::{MigratableKey, MigrationKey, SourceKind};

    use super::*;

    fn post(id: &str) -> Migratable {
        Migratable::new(
            MigratableKey::new(
                id,
                MigrationKey::new(SourceKind::Twitter, "t", DestinationKind::WordPress, "w"),
            ),
            MigratableKind::Post,
            format!(r#"{{"id_str":"{id}","text":"hello"}}"#),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn publish_assigns_sequential_ids() {
        let dest = MockDestination::default();
        let p = post("1");
        let activity = p.to_activity().unwrap();
        assert_eq!(dest.publish_post(&p, &activity).await.unwrap(), "dest-1");
        assert_eq!(dest.publish_post(&p, &activity).await.unwrap(), "dest-2");
        assert_eq!(dest.publish_count_for("1").await, 2);
    }

    #[tokio::test]
    async fn duplicate_items_are_rejected() {
        let dest = MockDestination::default();
        dest.reject_as_duplicate("1").await;
        let p = post("1");
        let activity = p.to_activity().unwrap();
        let err = dest.publish_post(&p, &activity).await.unwrap_err();
        assert!(matches!(err, FreedomError::DuplicateContent { .. }));
        assert_eq!(dest.publish_count().await, 0);
    }
}
