// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Column encoding shared by the query modules.
//!
//! Timestamps are stored as fixed-width UTC text (microsecond precision,
//! `Z` suffix), so SQL string comparison orders them chronologically.
//! Enums are stored as their lowercase strum names.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::Row;
use rusqlite::types::Type;

use freedom_core::{
    DestinationKind, Migratable, MigratableKey, MigratableKind, Migration, MigrationKey,
    SourceKind, Status, Task, TaskStatus,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Encode a timestamp for storage.
pub fn ts(t: DateTime<Utc>) -> String {
    t.format(TIMESTAMP_FORMAT).to_string()
}

/// Encode an optional timestamp for storage.
pub fn ts_opt(t: Option<DateTime<Utc>>) -> Option<String> {
    t.map(ts)
}

fn conversion_error(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

/// Read a timestamp column.
pub fn get_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

/// Read a nullable timestamp column.
pub fn get_ts_opt(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(idx)? {
        None => Ok(None),
        Some(raw) => DateTime::parse_from_rfc3339(&raw)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|e| conversion_error(idx, e)),
    }
}

/// Read a column holding a strum-encoded enum.
pub fn get_enum<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_error(idx, e))
}

/// Bind values for the four migration key columns.
pub fn key_params(key: &MigrationKey) -> (String, String, String, String) {
    (
        key.source_kind.to_string(),
        key.source_id.clone(),
        key.dest_kind.to_string(),
        key.dest_id.clone(),
    )
}

fn migration_key_at(row: &Row<'_>, first: usize) -> rusqlite::Result<MigrationKey> {
    Ok(MigrationKey {
        source_kind: get_enum::<SourceKind>(row, first)?,
        source_id: row.get(first + 1)?,
        dest_kind: get_enum::<DestinationKind>(row, first + 2)?,
        dest_id: row.get(first + 3)?,
    })
}

/// Columns selected by [`migration_from_row`].
pub const MIGRATION_COLUMNS: &str =
    "source_kind, source_id, dest_kind, dest_id, id, status, stopped, created_at, updated_at";

pub fn migration_from_row(row: &Row<'_>) -> rusqlite::Result<Migration> {
    Ok(Migration {
        key: migration_key_at(row, 0)?,
        id: row.get(4)?,
        status: get_enum::<Status>(row, 5)?,
        stopped: row.get(6)?,
        created_at: get_ts(row, 7)?,
        updated_at: get_ts(row, 8)?,
    })
}

/// Columns selected by [`migratable_from_row`].
pub const MIGRATABLE_COLUMNS: &str = "source_kind, source_id, dest_kind, dest_id, item_id, kind, \
     status, leased_until, json_data, last_updated, dest_item_id, dest_post_id";

pub fn migratable_from_row(row: &Row<'_>) -> rusqlite::Result<Migratable> {
    let migration = migration_key_at(row, 0)?;
    Ok(Migratable::from_parts(
        MigratableKey::new(row.get::<_, String>(4)?, migration),
        get_enum::<MigratableKind>(row, 5)?,
        get_enum::<Status>(row, 6)?,
        get_ts_opt(row, 7)?,
        row.get(8)?,
        get_ts(row, 9)?,
        row.get(10)?,
        row.get(11)?,
    ))
}

/// Columns selected by [`task_from_row`].
pub const TASK_COLUMNS: &str = "id, queue_name, payload, status, attempts, max_attempts, run_at, \
     locked_until, last_error, created_at";

pub fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        queue: row.get(1)?,
        payload: row.get(2)?,
        status: get_enum::<TaskStatus>(row, 3)?,
        attempts: row.get(4)?,
        max_attempts: row.get(5)?,
        run_at: get_ts(row, 6)?,
        locked_until: get_ts_opt(row, 7)?,
        last_error: row.get(8)?,
        created_at: get_ts(row, 9)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    #[test]
    fn timestamps_sort_lexically() {
        let a = Utc.with_ymd_and_hms(2013, 1, 1, 9, 0, 0).unwrap();
        let b = a + Duration::milliseconds(1);
        let c = a + Duration::hours(20);
        assert!(ts(a) < ts(b));
        assert!(ts(b) < ts(c));
        assert_eq!(ts(a), "2013-01-01T09:00:00.000000Z");
    }

    #[test]
    fn timestamp_round_trips_through_rfc3339() {
        let t = Utc.with_ymd_and_hms(2012, 3, 4, 18, 20, 37).unwrap() + Duration::microseconds(42);
        let parsed = DateTime::parse_from_rfc3339(&ts(t)).unwrap().with_timezone(&Utc);
        assert_eq!(parsed, t);
    }
}
