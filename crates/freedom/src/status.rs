// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `freedom status` command implementation.
//!
//! Prints a migration and its most recently updated posts and comments,
//! grouped by status. `--json` emits the same data for scripting.

use std::fmt::Write as _;

use freedom_core::FreedomError;
use freedom_pipeline::{MigratableSummary, MigrationStatus, Pipeline};

/// Run the `freedom status` command.
pub async fn run_status(pipeline: &Pipeline, id: i64, json: bool) -> Result<(), FreedomError> {
    let status = pipeline.control.status(id).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print!("{}", render(&status));
    }
    Ok(())
}

/// Human-readable status page.
fn render(status: &MigrationStatus) -> String {
    let migration = &status.migration;
    let mut out = String::new();
    let state = if migration.stopped { "stopped" } else { "running" };
    let _ = writeln!(out, "Migration {}: {} ({state})", migration.id, migration.key);
    let _ = writeln!(
        out,
        "  started {}",
        migration.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    section(&mut out, "New", &status.new);
    section(&mut out, "Processing", &status.processing);
    section(&mut out, "Complete", &status.complete);
    out
}

fn section(out: &mut String, heading: &str, items: &[MigratableSummary]) {
    let _ = writeln!(out, "\n{heading} ({})", items.len());
    for item in items {
        let _ = write!(out, "  [{}] {} {}", item.kind, item.item_id, item.title);
        if let Some(dest_id) = &item.dest_id {
            let _ = write!(out, " -> {dest_id}");
        }
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use freedom_core::{
        DestinationKind, MigratableKind, Migration, MigrationKey, SourceKind, Status,
    };

    use super::*;

    fn summary(item_id: &str, title: &str, dest_id: Option<&str>) -> MigratableSummary {
        MigratableSummary {
            item_id: item_id.into(),
            kind: MigratableKind::Post,
            status: Status::Complete,
            title: title.into(),
            url: None,
            dest_id: dest_id.map(str::to_string),
            last_updated: Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn render_groups_by_status() {
        let created = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let status = MigrationStatus {
            migration: Migration {
                key: MigrationKey::new(
                    SourceKind::Facebook,
                    "212038",
                    DestinationKind::WordPress,
                    "snarfed.org",
                ),
                id: 3,
                status: Status::New,
                stopped: true,
                created_at: created,
                updated_at: created,
            },
            new: vec![summary("2", "second", None)],
            processing: vec![],
            complete: vec![summary("1", "first", Some("dest-1"))],
        };

        let text = render(&status);
        assert!(text.starts_with("Migration 3: facebook/212038 -> wordpress/snarfed.org (stopped)"));
        assert!(text.contains("started 2026-01-01 12:00:00 UTC"));
        assert!(text.contains("New (1)\n  [post] 2 second\n"));
        assert!(text.contains("Processing (0)\n"));
        assert!(text.contains("Complete (1)\n  [post] 1 first -> dest-1\n"));
    }
}
