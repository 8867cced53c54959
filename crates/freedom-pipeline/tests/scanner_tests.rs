// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scanner integration tests against the SQLite store.

mod common;

use chrono::Duration;
use freedom_core::{
    Clock, EntityStore, FreedomError, MigratableKind, MigratableQuery, MigrationKey, DestinationKind,
    SourceKind, Status, TaskQueue,
};
use freedom_pipeline::{PROPAGATE_QUEUE, PropagateTask, SCAN_QUEUE, ScanOutcome, ScanTask};
use freedom_storage::SqliteStore;

use common::{fb_post, harness, key, pipeline};

#[tokio::test]
async fn scan_persists_items_and_enqueues_propagates() {
    let h = harness().await;
    let p = pipeline(&h);
    h.migration().await.unwrap();
    h.source
        .set_page(None, vec![fb_post("1", "first"), fb_post("2", "second")], None)
        .await;

    let outcome = p
        .scanner
        .scan(&ScanTask::new(h.migration_key.clone(), None))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        ScanOutcome::Scanned {
            fetched: 2,
            created: 2,
            next_cursor: None
        }
    );

    let stored = h
        .store
        .query_migratables(&MigratableQuery::new(h.migration_key.clone()))
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|m| m.status == Status::New && m.kind == MigratableKind::Post));

    let tasks = h.store.list_tasks(PROPAGATE_QUEUE).await.unwrap();
    let keys: Vec<_> = tasks
        .iter()
        .map(|t| PropagateTask::decode(&t.payload).unwrap().key)
        .collect();
    assert_eq!(keys, vec![key(&h, "1"), key(&h, "2")]);
    assert_eq!(h.store.outstanding(SCAN_QUEUE).await.unwrap(), 0);
}

#[tokio::test]
async fn rescanning_the_same_page_creates_nothing() {
    let h = harness().await;
    let p = pipeline(&h);
    h.migration().await.unwrap();
    h.source
        .set_page(None, vec![fb_post("1", "first"), fb_post("2", "second")], None)
        .await;
    let task = ScanTask::new(h.migration_key.clone(), None);

    p.scanner.scan(&task).await.unwrap();
    let again = p.scanner.scan(&task).await.unwrap();

    assert_eq!(
        again,
        ScanOutcome::Scanned {
            fetched: 2,
            created: 0,
            next_cursor: None
        }
    );
    assert_eq!(h.store.outstanding(PROPAGATE_QUEUE).await.unwrap(), 2);
}

#[tokio::test]
async fn existing_item_is_untouched_while_new_item_is_added() {
    let h = harness().await;
    let p = pipeline(&h);
    h.migration().await.unwrap();

    h.source.set_page(None, vec![fb_post("A", "old")], None).await;
    p.scanner
        .scan(&ScanTask::new(h.migration_key.clone(), None))
        .await
        .unwrap();
    p.propagate_worker().drain().await.unwrap();
    let before = h.store.get_migratable(&key(&h, "A")).await.unwrap().unwrap();
    assert_eq!(before.status, Status::Complete);

    h.clock.advance(Duration::minutes(5));
    h.source
        .set_page(None, vec![fb_post("B", "new"), fb_post("A", "old")], None)
        .await;
    let outcome = p
        .scanner
        .scan(&ScanTask::new(h.migration_key.clone(), None))
        .await
        .unwrap();
    assert!(matches!(outcome, ScanOutcome::Scanned { created: 1, .. }));

    let after = h.store.get_migratable(&key(&h, "A")).await.unwrap().unwrap();
    assert_eq!(after.status, Status::Complete);
    assert_eq!(after.last_updated, before.last_updated);
    assert_eq!(after.dest_id, before.dest_id);

    let pending: Vec<_> = pending_propagates(&h.store).await;
    assert_eq!(pending, vec![key(&h, "B")]);
}

#[tokio::test]
async fn next_cursor_chains_a_delayed_scan() {
    let h = harness().await;
    let p = pipeline(&h);
    h.migration().await.unwrap();
    h.source
        .set_page(
            None,
            vec![fb_post("1", "a"), fb_post("2", "b"), fb_post("3", "c")],
            Some("page-2"),
        )
        .await;

    p.scanner
        .scan(&ScanTask::new(h.migration_key.clone(), None))
        .await
        .unwrap();

    let scans = h.store.list_tasks(SCAN_QUEUE).await.unwrap();
    assert_eq!(scans.len(), 1);
    let next = ScanTask::decode(&scans[0].payload).unwrap();
    assert_eq!(next.scan_url.as_deref(), Some("page-2"));
    assert_eq!(next.migration, h.migration_key);
    // Three items at the default two seconds per item.
    assert_eq!(scans[0].run_at, h.clock.now() + Duration::seconds(6));
}

#[tokio::test]
async fn follow_up_scan_fetches_the_cursor_page() {
    let h = harness().await;
    let p = pipeline(&h);
    h.migration().await.unwrap();
    h.source.set_page(None, vec![fb_post("1", "a")], Some("p2")).await;
    h.source.set_page(Some("p2"), vec![fb_post("2", "b")], None).await;

    p.scanner
        .scan(&ScanTask::new(h.migration_key.clone(), None))
        .await
        .unwrap();
    h.clock.advance(Duration::seconds(2));
    let scans = p.scan_worker().drain().await.unwrap();
    assert_eq!(scans.len(), 1);

    assert_eq!(h.source.calls().await, vec![None, Some("p2".to_string())]);
    assert_eq!(h.store.outstanding(PROPAGATE_QUEUE).await.unwrap(), 2);
}

#[tokio::test]
async fn stopped_migration_drops_scan_without_fetching() {
    let h = harness().await;
    let p = pipeline(&h);
    let mut migration = h.migration().await.unwrap();
    migration.stopped = true;
    h.store.save_migration(&migration).await.unwrap();
    h.source.set_page(None, vec![fb_post("1", "a")], None).await;

    let outcome = p
        .scanner
        .scan(&ScanTask::new(h.migration_key.clone(), None))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        ScanOutcome::Skipped {
            reason: "migration stopped"
        }
    );
    assert!(h.source.calls().await.is_empty());
}

#[tokio::test]
async fn unknown_migration_drops_scan() {
    let h = harness().await;
    let p = pipeline(&h);
    let other = MigrationKey::new(SourceKind::Twitter, "nobody", DestinationKind::Blogger, "x");

    let outcome = p.scanner.scan(&ScanTask::new(other, None)).await.unwrap();
    assert!(matches!(outcome, ScanOutcome::Skipped { .. }));
}

#[tokio::test]
async fn source_failure_propagates_and_enqueues_nothing() {
    let h = harness().await;
    let p = pipeline(&h);
    h.migration().await.unwrap();
    h.source.fail_next(FreedomError::source("rate limited")).await;

    let err = p
        .scanner
        .scan(&ScanTask::new(h.migration_key.clone(), None))
        .await
        .unwrap_err();
    assert!(matches!(err, FreedomError::Source { .. }));
    assert_eq!(h.store.outstanding(PROPAGATE_QUEUE).await.unwrap(), 0);
}

async fn pending_propagates(store: &SqliteStore) -> Vec<freedom_core::MigratableKey> {
    store
        .list_tasks(PROPAGATE_QUEUE)
        .await
        .unwrap()
        .into_iter()
        .filter(|t| t.status == freedom_core::TaskStatus::Pending)
        .map(|t| PropagateTask::decode(&t.payload).unwrap().key)
        .collect()
}
