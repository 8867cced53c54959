// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source adapter that pages through downloaded account archives.
//!
//! An archive lives at `<archive_dir>/<source_kind>/<source_id>.json` and
//! holds either a JSON array of posts, newest first, or a Graph-API style
//! object with the posts under `data`. Cursors are offsets into that list.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use freedom_config::model::AdaptersConfig;
use freedom_core::{
    AdapterType, FreedomError, HealthStatus, Migration, PluginAdapter, RawItem, SourceAdapter,
    SourceKind, SourcePage,
};

use crate::filter::skip_reason;

/// Reads posts for one source kind from JSON archives on disk.
#[derive(Debug, Clone)]
pub struct ArchiveSource {
    kind: SourceKind,
    dir: PathBuf,
    page_size: usize,
    name: String,
}

impl ArchiveSource {
    pub fn new(kind: SourceKind, dir: impl Into<PathBuf>, page_size: usize) -> Self {
        Self {
            kind,
            dir: dir.into(),
            page_size: page_size.max(1),
            name: format!("archive-{kind}"),
        }
    }

    pub fn from_config(kind: SourceKind, config: &AdaptersConfig) -> Self {
        Self::new(kind, &config.archive_dir, config.archive_page_size)
    }

    /// Path of the archive for one account.
    pub fn archive_path(&self, source_id: &str) -> PathBuf {
        self.dir
            .join(self.kind.to_string())
            .join(format!("{}.json", sanitize(source_id)))
    }

    async fn load(&self, path: &Path) -> Result<Vec<Value>, FreedomError> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            FreedomError::Source {
                message: format!("cannot read archive {}", path.display()),
                source: Some(Box::new(e)),
            }
        })?;
        let value: Value = serde_json::from_str(&raw).map_err(|e| FreedomError::Source {
            message: format!("archive {} is not valid JSON", path.display()),
            source: Some(Box::new(e)),
        })?;
        match value {
            Value::Array(items) => Ok(items),
            Value::Object(mut obj) => match obj.remove("data") {
                Some(Value::Array(items)) => Ok(items),
                _ => Err(FreedomError::source(format!(
                    "archive {} has no data array",
                    path.display()
                ))),
            },
            _ => Err(FreedomError::source(format!(
                "archive {} is neither an array nor an object",
                path.display()
            ))),
        }
    }

    fn item_id(&self, item: &Value) -> Option<String> {
        let field = |key: &str| match item.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        };
        match self.kind {
            SourceKind::Twitter => field("id_str").or_else(|| field("id")),
            SourceKind::Facebook | SourceKind::GooglePlus => field("id"),
        }
    }
}

/// Keep account ids from escaping the archive directory.
fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect()
}

fn parse_cursor(cursor: Option<&str>) -> Result<usize, FreedomError> {
    match cursor {
        None => Ok(0),
        Some(raw) => raw.parse().map_err(|_| {
            FreedomError::Serialization(format!("invalid archive cursor {raw:?}"))
        }),
    }
}

#[async_trait]
impl PluginAdapter for ArchiveSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Source
    }

    async fn health_check(&self) -> Result<HealthStatus, FreedomError> {
        match tokio::fs::metadata(&self.dir).await {
            Ok(meta) if meta.is_dir() => Ok(HealthStatus::Healthy),
            Ok(_) => Ok(HealthStatus::Unhealthy(format!(
                "{} is not a directory",
                self.dir.display()
            ))),
            Err(e) => Ok(HealthStatus::Degraded(format!(
                "archive directory {}: {e}",
                self.dir.display()
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), FreedomError> {
        Ok(())
    }
}

#[async_trait]
impl SourceAdapter for ArchiveSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn get_posts(
        &self,
        migration: &Migration,
        cursor: Option<&str>,
    ) -> Result<SourcePage, FreedomError> {
        let offset = parse_cursor(cursor)?;
        let path = self.archive_path(&migration.key.source_id);
        let all = self.load(&path).await?;

        let end = offset.saturating_add(self.page_size).min(all.len());
        let window = all.get(offset..end).unwrap_or_default();

        let mut items = Vec::with_capacity(window.len());
        for entry in window {
            let Some(id) = self.item_id(entry) else {
                debug!(archive = %path.display(), "skipping archived post without an id");
                continue;
            };
            if let Some(reason) = skip_reason(self.kind, entry) {
                info!(%id, reason, "skipping post");
                continue;
            }
            items.push(RawItem::post(id, entry.clone()));
        }

        let next_cursor = (end < all.len()).then(|| end.to_string());
        debug!(
            archive = %path.display(),
            offset,
            returned = items.len(),
            more = next_cursor.is_some(),
            "read archive page"
        );
        Ok(SourcePage::new(items, next_cursor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_parses_offsets() {
        assert_eq!(parse_cursor(None).unwrap(), 0);
        assert_eq!(parse_cursor(Some("40")).unwrap(), 40);
        assert!(matches!(
            parse_cursor(Some("https://graph.facebook.com/next")),
            Err(FreedomError::Serialization(_))
        ));
    }

    #[test]
    fn archive_path_is_per_kind_and_sanitized() {
        let source = ArchiveSource::new(SourceKind::Twitter, "/data", 20);
        assert_eq!(
            source.archive_path("schnarfed"),
            PathBuf::from("/data/twitter/schnarfed.json")
        );
        assert_eq!(
            source.archive_path("../etc/passwd"),
            PathBuf::from("/data/twitter/.._etc_passwd.json")
        );
    }

    #[test]
    fn zero_page_size_is_clamped() {
        let source = ArchiveSource::new(SourceKind::Facebook, "/data", 0);
        assert_eq!(source.page_size, 1);
    }
}
