// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared fixtures for pipeline integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use freedom_core::{MigratableKey, RawItem};
use freedom_pipeline::{AdapterRegistry, Pipeline};
use freedom_test_utils::TestHarness;
use serde_json::json;

pub async fn harness() -> TestHarness {
    TestHarness::builder().build().await.unwrap()
}

/// Pipeline over the harness store, clock and mock adapters.
pub fn pipeline(harness: &TestHarness) -> Pipeline {
    let registry = AdapterRegistry::new()
        .with_source(harness.source.clone())
        .with_destination(harness.destination.clone());
    Pipeline::new(
        harness.store.clone(),
        Arc::new(registry),
        harness.clock.clone(),
        &harness.config.pipeline,
    )
}

/// A Facebook status post.
pub fn fb_post(id: &str, message: &str) -> RawItem {
    RawItem::post(
        id,
        json!({
            "id": id,
            "message": message,
            "created_time": "2012-03-04T18:20:37+0000",
            "from": {"id": "212038", "name": "Ryan Barrett"},
        }),
    )
}

/// A Facebook post with embedded comments `(id, message)`.
pub fn fb_post_with_comments(id: &str, comments: &[(&str, &str)]) -> RawItem {
    let data: Vec<_> = comments
        .iter()
        .map(|(cid, message)| {
            json!({
                "id": cid,
                "message": message,
                "from": {"id": "100", "name": "Commenter"},
            })
        })
        .collect();
    RawItem::post(
        id,
        json!({
            "id": id,
            "message": "post with comments",
            "from": {"id": "212038", "name": "Ryan Barrett"},
            "comments": {"data": data},
        }),
    )
}

pub fn key(harness: &TestHarness, item_id: &str) -> MigratableKey {
    MigratableKey::new(item_id, harness.migration_key.clone())
}
