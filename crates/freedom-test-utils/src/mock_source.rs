// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock source adapter for deterministic testing.
//!
//! `MockSource` implements `SourceAdapter` with pages keyed by cursor and
//! records every `get_posts` call for assertion in tests.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::Mutex;

use freedom_core::{
    AdapterType, FreedomError, HealthStatus, Migration, PluginAdapter, RawItem, SourceAdapter,
    SourceKind, SourcePage,
};

/// A mock social network for testing.
///
/// Pages are registered per cursor; the first page uses the `None` cursor.
/// Unregistered cursors return an empty terminal page.
pub struct MockSource {
    kind: SourceKind,
    pages: Mutex<HashMap<Option<String>, SourcePage>>,
    calls: Mutex<Vec<Option<String>>>,
    failures: Mutex<VecDeque<FreedomError>>,
}

impl MockSource {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            pages: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
        }
    }

    /// Serve `items` for `cursor`, pointing at `next_cursor`.
    pub async fn set_page(
        &self,
        cursor: Option<&str>,
        items: Vec<RawItem>,
        next_cursor: Option<&str>,
    ) {
        self.pages.lock().await.insert(
            cursor.map(str::to_string),
            SourcePage::new(items, next_cursor.map(str::to_string)),
        );
    }

    /// Make the next `get_posts` call fail with `error`.
    pub async fn fail_next(&self, error: FreedomError) {
        self.failures.lock().await.push_back(error);
    }

    /// Cursors passed to `get_posts`, in call order.
    pub async fn calls(&self) -> Vec<Option<String>> {
        self.calls.lock().await.clone()
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new(SourceKind::Facebook)
    }
}

#[async_trait]
impl PluginAdapter for MockSource {
    fn name(&self) -> &str {
        "mock-source"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Source
    }

    async fn health_check(&self) -> Result<HealthStatus, FreedomError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), FreedomError> {
        Ok(())
    }
}

#[async_trait]
impl SourceAdapter for MockSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn get_posts(
        &self,
        _migration: &Migration,
        cursor: Option<&str>,
    ) -> Result<SourcePage, FreedomError> {
        let cursor = cursor.map(str::to_string);
        self.calls.lock().await.push(cursor.clone());
        if let Some(err) = self.failures.lock().await.pop_front() {
            return Err(err);
        }
        Ok(self
            .pages
            .lock()
            .await
            .get(&cursor)
            .cloned()
            .unwrap_or_default())
    }
}
