// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Migratable CRUD operations and atomic units of work.
//!
//! Every function that writes a Migratable together with tasks runs inside a
//! single SQLite transaction on the writer thread, so the entity change and
//! the enqueues commit together or not at all.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use freedom_core::{
    FreedomError, Migratable, MigratableKey, MigratableQuery, MigratableUpdate, Transition,
};

use crate::database::{Database, map_tr_err};
use crate::models::{MIGRATABLE_COLUMNS, key_params, migratable_from_row, ts, ts_opt};
use crate::queries::tasks::insert_task;

fn select(conn: &Connection, key: &MigratableKey) -> rusqlite::Result<Option<Migratable>> {
    let (sk, si, dk, di) = key_params(&key.migration);
    conn.query_row(
        &format!(
            "SELECT {MIGRATABLE_COLUMNS} FROM migratables
             WHERE source_kind = ?1 AND source_id = ?2 AND dest_kind = ?3 AND dest_id = ?4
               AND item_id = ?5"
        ),
        params![sk, si, dk, di, key.item_id],
        migratable_from_row,
    )
    .optional()
}

/// Write `m`, stamping `last_updated = now`. Inserts if absent.
fn upsert(conn: &Connection, m: &Migratable, now: DateTime<Utc>) -> rusqlite::Result<()> {
    let (sk, si, dk, di) = key_params(&m.key.migration);
    conn.execute(
        "INSERT INTO migratables (source_kind, source_id, dest_kind, dest_id, item_id, kind,
             status, leased_until, json_data, last_updated, dest_item_id, dest_post_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
         ON CONFLICT (source_kind, source_id, dest_kind, dest_id, item_id) DO UPDATE SET
             status = excluded.status,
             leased_until = excluded.leased_until,
             json_data = excluded.json_data,
             last_updated = excluded.last_updated,
             dest_item_id = excluded.dest_item_id,
             dest_post_id = excluded.dest_post_id",
        params![
            sk,
            si,
            dk,
            di,
            m.key.item_id,
            m.kind.to_string(),
            m.status.to_string(),
            ts_opt(m.leased_until),
            m.json_data,
            ts(now),
            m.dest_id,
            m.dest_post_id,
        ],
    )?;
    Ok(())
}

/// Insert `m` unless an entity with its key exists. Returns whether it was inserted.
fn insert_if_absent(conn: &Connection, m: &Migratable, now: DateTime<Utc>) -> rusqlite::Result<bool> {
    let (sk, si, dk, di) = key_params(&m.key.migration);
    let inserted = conn.execute(
        "INSERT INTO migratables (source_kind, source_id, dest_kind, dest_id, item_id, kind,
             status, leased_until, json_data, last_updated, dest_item_id, dest_post_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
         ON CONFLICT (source_kind, source_id, dest_kind, dest_id, item_id) DO NOTHING",
        params![
            sk,
            si,
            dk,
            di,
            m.key.item_id,
            m.kind.to_string(),
            m.status.to_string(),
            ts_opt(m.leased_until),
            m.json_data,
            ts(now),
            m.dest_id,
            m.dest_post_id,
        ],
    )?;
    Ok(inserted == 1)
}

/// Get a migratable by key.
pub async fn get_migratable(
    db: &Database,
    key: &MigratableKey,
) -> Result<Option<Migratable>, FreedomError> {
    let key = key.clone();
    db.connection()
        .call(move |conn| select(conn, &key))
        .await
        .map_err(map_tr_err)
}

/// Insert or overwrite a migratable.
pub async fn save_migratable(
    db: &Database,
    migratable: &Migratable,
    now: DateTime<Utc>,
) -> Result<(), FreedomError> {
    let migratable = migratable.clone();
    db.connection()
        .call(move |conn| upsert(conn, &migratable, now))
        .await
        .map_err(map_tr_err)
}

/// Create `migratable` if absent; if created, enqueue `task` in the same transaction.
///
/// Returns the stored entity and whether it was created.
pub async fn insert_migratable(
    db: &Database,
    migratable: Migratable,
    task: Option<freedom_core::TaskRequest>,
    now: DateTime<Utc>,
    max_attempts: u32,
) -> Result<(Migratable, bool), FreedomError> {
    db.connection()
        .call(move |conn| -> Result<Result<(Migratable, bool), FreedomError>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let created = insert_if_absent(&tx, &migratable, now)?;
            if created && let Some(task) = &task {
                insert_task(&tx, task, now, max_attempts)?;
            }
            let Some(stored) = select(&tx, &migratable.key)? else {
                return Ok(Err(FreedomError::InvariantViolation(format!(
                    "{} missing right after insert",
                    migratable.key
                ))));
            };
            tx.commit()?;
            if created {
                debug!(key = %stored.key, kind = %stored.kind, "created migratable");
            } else {
                debug!(key = %stored.key, "migratable already exists");
            }
            Ok(Ok((stored, created)))
        })
        .await
        .map_err(map_tr_err)?
}

/// Atomic read-modify-write of one migratable plus its follow-up inserts and tasks.
///
/// An error returned by `update` rolls the transaction back with no writes.
pub async fn update_migratable(
    db: &Database,
    key: &MigratableKey,
    update: MigratableUpdate,
    now: DateTime<Utc>,
    max_attempts: u32,
) -> Result<Option<Migratable>, FreedomError> {
    let key = key.clone();
    db.connection()
        .call(move |conn| -> Result<Result<Option<Migratable>, FreedomError>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let current = select(&tx, &key)?;
            let unit = match update(current.clone()) {
                Ok(unit) => unit,
                Err(e) => return Ok(Err(e)),
            };

            let saved = match &unit.transition {
                Transition::Keep => false,
                Transition::Save(m) if m.key != key => {
                    return Ok(Err(FreedomError::InvariantViolation(format!(
                        "update of {key} tried to save {}",
                        m.key
                    ))));
                }
                Transition::Save(m) => {
                    upsert(&tx, m, now)?;
                    true
                }
            };

            for new in &unit.inserts {
                if insert_if_absent(&tx, &new.migratable, now)? {
                    debug!(key = %new.migratable.key, kind = %new.migratable.kind, "created migratable");
                    if let Some(task) = &new.task {
                        insert_task(&tx, task, now, max_attempts)?;
                    }
                }
            }
            for task in &unit.tasks {
                insert_task(&tx, task, now, max_attempts)?;
            }

            let result = if saved { select(&tx, &key)? } else { current };
            tx.commit()?;
            Ok(Ok(result))
        })
        .await
        .map_err(map_tr_err)?
}

/// List migratables of one migration, newest `last_updated` first.
pub async fn query_migratables(
    db: &Database,
    query: &MigratableQuery,
) -> Result<Vec<Migratable>, FreedomError> {
    let (sk, si, dk, di) = key_params(&query.migration);
    let status = query.status.map(|s| s.to_string());
    let kind = query.kind.map(|k| k.to_string());
    let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MIGRATABLE_COLUMNS} FROM migratables
                 WHERE source_kind = ?1 AND source_id = ?2 AND dest_kind = ?3 AND dest_id = ?4
                   AND (?5 IS NULL OR status = ?5)
                   AND (?6 IS NULL OR kind = ?6)
                 ORDER BY last_updated DESC, item_id ASC
                 LIMIT ?7"
            ))?;
            let rows = stmt.query_map(
                params![sk, si, dk, di, status, kind, limit],
                migratable_from_row,
            )?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
