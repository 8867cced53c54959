// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Migration CRUD operations.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};

use freedom_core::{FreedomError, Migration, MigrationKey};

use crate::database::{Database, map_tr_err};
use crate::models::{MIGRATION_COLUMNS, key_params, migration_from_row, ts};

/// Get a migration by its key.
pub async fn get_migration(
    db: &Database,
    key: &MigrationKey,
) -> Result<Option<Migration>, FreedomError> {
    let (sk, si, dk, di) = key_params(key);
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {MIGRATION_COLUMNS} FROM migrations
                     WHERE source_kind = ?1 AND source_id = ?2 AND dest_kind = ?3 AND dest_id = ?4"
                ),
                params![sk, si, dk, di],
                migration_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Get a migration by its numeric id.
pub async fn get_migration_by_id(db: &Database, id: i64) -> Result<Option<Migration>, FreedomError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {MIGRATION_COLUMNS} FROM migrations WHERE id = ?1"),
                params![id],
                migration_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch the migration for `key`, inserting a new one if absent.
///
/// Returns `(migration, created)`.
pub async fn get_or_insert_migration(
    db: &Database,
    key: &MigrationKey,
    now: DateTime<Utc>,
) -> Result<(Migration, bool), FreedomError> {
    let (sk, si, dk, di) = key_params(key);
    let now = ts(now);
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let inserted = tx.execute(
                "INSERT INTO migrations (source_kind, source_id, dest_kind, dest_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT (source_kind, source_id, dest_kind, dest_id) DO NOTHING",
                params![sk, si, dk, di, now],
            )?;
            let migration = tx.query_row(
                &format!(
                    "SELECT {MIGRATION_COLUMNS} FROM migrations
                     WHERE source_kind = ?1 AND source_id = ?2 AND dest_kind = ?3 AND dest_id = ?4"
                ),
                params![sk, si, dk, di],
                migration_from_row,
            )?;
            tx.commit()?;
            Ok((migration, inserted == 1))
        })
        .await
        .map_err(map_tr_err)
}

/// Update a migration's status and stopped flag.
///
/// Returns `NotFound` if no migration has this key.
pub async fn save_migration(
    db: &Database,
    migration: &Migration,
    now: DateTime<Utc>,
) -> Result<(), FreedomError> {
    let (sk, si, dk, di) = key_params(&migration.key);
    let status = migration.status.to_string();
    let stopped = migration.stopped;
    let now = ts(now);
    let updated = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE migrations SET status = ?5, stopped = ?6, updated_at = ?7
                 WHERE source_kind = ?1 AND source_id = ?2 AND dest_kind = ?3 AND dest_id = ?4",
                params![sk, si, dk, di, status, stopped, now],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if updated == 0 {
        return Err(FreedomError::not_found("migration", migration.key.to_string()));
    }
    Ok(())
}
