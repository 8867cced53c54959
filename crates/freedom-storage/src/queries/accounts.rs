// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source and destination account operations.
//!
//! Accounts are written once when connected and read-only afterwards.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};

use freedom_core::{DestinationAccount, DestinationKind, FreedomError, SourceAccount, SourceKind};

use crate::database::{Database, map_tr_err};
use crate::models::{get_enum, ts};

/// Insert or replace a source account.
pub async fn save_source_account(
    db: &Database,
    account: &SourceAccount,
    now: DateTime<Utc>,
) -> Result<(), FreedomError> {
    let a = account.clone();
    let now = ts(now);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO source_accounts (kind, id, name, picture, url, access_token, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT (kind, id) DO UPDATE SET
                     name = excluded.name, picture = excluded.picture, url = excluded.url,
                     access_token = excluded.access_token",
                params![a.kind.to_string(), a.id, a.name, a.picture, a.url, a.access_token, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a source account by kind and external id.
pub async fn get_source_account(
    db: &Database,
    kind: SourceKind,
    id: &str,
) -> Result<Option<SourceAccount>, FreedomError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT kind, id, name, picture, url, access_token
                 FROM source_accounts WHERE kind = ?1 AND id = ?2",
                params![kind.to_string(), id],
                |row| {
                    Ok(SourceAccount {
                        kind: get_enum(row, 0)?,
                        id: row.get(1)?,
                        name: row.get(2)?,
                        picture: row.get(3)?,
                        url: row.get(4)?,
                        access_token: row.get(5)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert or replace a destination account.
pub async fn save_destination_account(
    db: &Database,
    account: &DestinationAccount,
    now: DateTime<Utc>,
) -> Result<(), FreedomError> {
    let a = account.clone();
    let now = ts(now);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO destination_accounts (kind, id, name, picture, url, access_token, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT (kind, id) DO UPDATE SET
                     name = excluded.name, picture = excluded.picture, url = excluded.url,
                     access_token = excluded.access_token",
                params![a.kind.to_string(), a.id, a.name, a.picture, a.url, a.access_token, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a destination account by kind and external id.
pub async fn get_destination_account(
    db: &Database,
    kind: DestinationKind,
    id: &str,
) -> Result<Option<DestinationAccount>, FreedomError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT kind, id, name, picture, url, access_token
                 FROM destination_accounts WHERE kind = ?1 AND id = ?2",
                params![kind.to_string(), id],
                |row| {
                    Ok(DestinationAccount {
                        kind: get_enum(row, 0)?,
                        id: row.get(1)?,
                        name: row.get(2)?,
                        picture: row.get(3)?,
                        url: row.get(4)?,
                        access_token: row.get(5)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
