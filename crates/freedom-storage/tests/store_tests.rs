// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the SQLite entity store and task queue.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

use freedom_core::{
    Clock, DestinationAccount, DestinationKind, EntityStore, FreedomError, Migratable,
    MigratableKey, MigratableKind, MigratableQuery, MigrationKey, SourceAccount, SourceKind,
    Status, TaskQueue, TaskRequest, TaskStatus, UnitOfWork,
};
use freedom_storage::{Database, RetryPolicy, SqliteStore};

struct StepClock(Mutex<DateTime<Utc>>);

impl StepClock {
    fn advance(&self, secs: i64) {
        let mut now = self.0.lock().unwrap();
        *now += chrono::Duration::seconds(secs);
    }
}

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

async fn setup() -> (SqliteStore, Arc<StepClock>, TempDir) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.db");
    let db = Database::open(path.to_str().unwrap()).await.unwrap();
    let clock = Arc::new(StepClock(Mutex::new(
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
    )));
    let store = SqliteStore::new(db, clock.clone(), RetryPolicy::default());
    (store, clock, dir)
}

fn migration_key() -> MigrationKey {
    MigrationKey::new(
        SourceKind::Facebook,
        "212038",
        DestinationKind::WordPress,
        "snarfed.org",
    )
}

fn post(id: &str, now: DateTime<Utc>) -> Migratable {
    Migratable::new(
        MigratableKey::new(id, migration_key()),
        MigratableKind::Post,
        format!(r#"{{"id":"{id}","message":"hello"}}"#),
        now,
    )
}

#[tokio::test]
async fn get_or_insert_migration_is_idempotent() {
    let (store, _clock, _dir) = setup().await;

    let (first, created) = store.get_or_insert_migration(&migration_key()).await.unwrap();
    assert!(created);
    assert_eq!(first.status, Status::New);
    assert!(!first.stopped);

    let (second, created) = store.get_or_insert_migration(&migration_key()).await.unwrap();
    assert!(!created);
    assert_eq!(second.id, first.id);

    let by_id = store.get_migration_by_id(first.id).await.unwrap().unwrap();
    assert_eq!(by_id.key, migration_key());
}

#[tokio::test]
async fn save_migration_persists_stopped_flag() {
    let (store, _clock, _dir) = setup().await;
    let (mut migration, _) = store.get_or_insert_migration(&migration_key()).await.unwrap();

    migration.stopped = true;
    store.save_migration(&migration).await.unwrap();

    let loaded = store.get_migration(&migration_key()).await.unwrap().unwrap();
    assert!(loaded.stopped);
}

#[tokio::test]
async fn insert_enqueues_task_only_on_create() {
    let (store, clock, _dir) = setup().await;
    store.get_or_insert_migration(&migration_key()).await.unwrap();
    let task = TaskRequest::new("propagate", "p1");

    let (_, created) = store
        .insert_migratable(post("p1", clock.now()), Some(task.clone()))
        .await
        .unwrap();
    assert!(created);

    let (existing, created) = store
        .insert_migratable(post("p1", clock.now()), Some(task))
        .await
        .unwrap();
    assert!(!created);
    assert_eq!(existing.item_id(), "p1");
    assert_eq!(store.outstanding("propagate").await.unwrap(), 1);
}

#[tokio::test]
async fn insert_does_not_overwrite_existing_state() {
    let (store, clock, _dir) = setup().await;
    store.get_or_insert_migration(&migration_key()).await.unwrap();

    let mut done = post("p1", clock.now());
    done.status = Status::Complete;
    done.dest_id = Some("42".into());
    store.save_migratable(&done).await.unwrap();

    let (stored, created) = store.insert_migratable(post("p1", clock.now()), None).await.unwrap();
    assert!(!created);
    assert_eq!(stored.status, Status::Complete);
    assert_eq!(stored.dest_id.as_deref(), Some("42"));
}

#[tokio::test]
async fn failed_update_rolls_back_every_write() {
    let (store, clock, _dir) = setup().await;
    store.get_or_insert_migration(&migration_key()).await.unwrap();
    store.insert_migratable(post("p1", clock.now()), None).await.unwrap();
    let key = MigratableKey::new("p1", migration_key());

    let err = store
        .update_migratable(
            &key,
            Box::new(|current: Option<Migratable>| {
                let _ = current;
                Err(FreedomError::Conflict {
                    key: "p1".into(),
                    leased_until: Utc::now(),
                })
            }),
        )
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    let unchanged = store.get_migratable(&key).await.unwrap().unwrap();
    assert_eq!(unchanged.status, Status::New);
    assert_eq!(store.outstanding("propagate").await.unwrap(), 0);
}

#[tokio::test]
async fn update_saves_entity_and_fans_out_in_one_unit() {
    let (store, clock, _dir) = setup().await;
    store.get_or_insert_migration(&migration_key()).await.unwrap();
    store.insert_migratable(post("p1", clock.now()), None).await.unwrap();
    let key = MigratableKey::new("p1", migration_key());
    let now = clock.now();

    let updated = store
        .update_migratable(
            &key,
            Box::new(move |current: Option<Migratable>| {
                let mut m = current.expect("post exists");
                m.status = Status::Complete;
                m.dest_id = Some("99".into());
                let mut comment = Migratable::new(
                    MigratableKey::new("c1", migration_key()),
                    MigratableKind::Comment,
                    r#"{"id":"c1"}"#,
                    now,
                );
                comment.dest_post_id = Some("99".into());
                Ok(UnitOfWork::save(m).with_insert(
                    comment,
                    Some(TaskRequest::new("propagate", "c1").with_countdown(Duration::from_secs(3))),
                ))
            }),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status, Status::Complete);

    let comment = store
        .get_migratable(&MigratableKey::new("c1", migration_key()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(comment.kind, MigratableKind::Comment);
    assert_eq!(comment.dest_post_id.as_deref(), Some("99"));

    let tasks = store.list_tasks("propagate").await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].run_at, now + chrono::Duration::seconds(3));
}

#[tokio::test]
async fn update_refuses_to_save_a_different_key() {
    let (store, clock, _dir) = setup().await;
    store.get_or_insert_migration(&migration_key()).await.unwrap();
    store.insert_migratable(post("p1", clock.now()), None).await.unwrap();
    let now = clock.now();

    let err = store
        .update_migratable(
            &MigratableKey::new("p1", migration_key()),
            Box::new(move |_: Option<Migratable>| Ok(UnitOfWork::save(post("p2", now)))),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, FreedomError::InvariantViolation(_)));
}

#[tokio::test]
async fn query_orders_by_last_updated_descending() {
    let (store, clock, _dir) = setup().await;
    store.get_or_insert_migration(&migration_key()).await.unwrap();
    for id in ["a", "b", "c"] {
        store.insert_migratable(post(id, clock.now()), None).await.unwrap();
        clock.advance(10);
    }

    let all = store
        .query_migratables(&MigratableQuery::new(migration_key()))
        .await
        .unwrap();
    let ids: Vec<_> = all.iter().map(|m| m.item_id()).collect();
    assert_eq!(ids, ["c", "b", "a"]);

    let limited = store
        .query_migratables(&MigratableQuery::new(migration_key()).limit(1))
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);

    let complete = store
        .query_migratables(&MigratableQuery::new(migration_key()).status(Status::Complete))
        .await
        .unwrap();
    assert!(complete.is_empty());
}

#[tokio::test]
async fn save_stamps_last_updated() {
    let (store, clock, _dir) = setup().await;
    store.get_or_insert_migration(&migration_key()).await.unwrap();
    let original = post("p1", clock.now());
    store.insert_migratable(original.clone(), None).await.unwrap();

    clock.advance(60);
    store.save_migratable(&original).await.unwrap();
    let loaded = store
        .get_migratable(&original.key)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.last_updated, clock.now());
}

#[tokio::test]
async fn claim_ack_round_trip_through_store() {
    let (store, clock, _dir) = setup().await;
    let id = store.enqueue(TaskRequest::new("scan", "{}")).await.unwrap();

    let task = store
        .claim("scan", clock.now(), Duration::from_secs(600))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(task.id, id);
    assert_eq!(task.status, TaskStatus::Processing);

    store.ack(id).await.unwrap();
    assert_eq!(store.get_task(id).await.unwrap().unwrap().status, TaskStatus::Completed);
    assert_eq!(store.outstanding("scan").await.unwrap(), 0);
}

#[tokio::test]
async fn accounts_round_trip() {
    let (store, _clock, _dir) = setup().await;
    let source = SourceAccount {
        kind: SourceKind::Twitter,
        id: "schnarfed".into(),
        name: Some("Ryan".into()),
        picture: None,
        url: Some("https://twitter.com/schnarfed".into()),
        access_token: "token".into(),
    };
    let dest = DestinationAccount {
        kind: DestinationKind::Dropbox,
        id: "dbx".into(),
        name: None,
        picture: None,
        url: None,
        access_token: "secret".into(),
    };
    store.save_source_account(&source).await.unwrap();
    store.save_destination_account(&dest).await.unwrap();

    assert_eq!(
        store.get_source_account(SourceKind::Twitter, "schnarfed").await.unwrap(),
        Some(source)
    );
    assert_eq!(
        store.get_destination_account(DestinationKind::Dropbox, "dbx").await.unwrap(),
        Some(dest)
    );
    assert!(store
        .get_source_account(SourceKind::Facebook, "schnarfed")
        .await
        .unwrap()
        .is_none());
}
