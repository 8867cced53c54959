// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Destination adapter that writes posts and comments as JSON files.
//!
//! Posts land at `<export_dir>/<dest_id>/<Source>/<date>_<id>_<title>.json`
//! and their comments under `comments/<post file stem>/` next to them. The
//! path depends only on the content, so a redelivered publish finds its own
//! earlier file and reports it as duplicate content. Files appear complete or
//! not at all.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use freedom_config::model::AdaptersConfig;
use freedom_core::{
    Activity, AdapterType, DestinationAdapter, DestinationKind, FreedomError, HealthStatus,
    Migratable, PluginAdapter,
};

/// Maximum number of title characters kept in a file name.
const TITLE_MAX_LEN: usize = 40;

/// Writes activities as pretty-printed JSON files.
#[derive(Debug, Clone)]
pub struct ExportDestination {
    kind: DestinationKind,
    dir: PathBuf,
    name: String,
}

impl ExportDestination {
    pub fn new(kind: DestinationKind, dir: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            dir: dir.into(),
            name: format!("export-{kind}"),
        }
    }

    pub fn from_config(kind: DestinationKind, config: &AdaptersConfig) -> Self {
        Self::new(kind, &config.export_dir)
    }

    /// Directory holding one migration's posts.
    fn source_dir(&self, item: &Migratable) -> PathBuf {
        let migration = &item.key.migration;
        self.dir
            .join(path_segment(&migration.dest_id))
            .join(migration.source_kind.display_name())
    }

    /// Write `activity` to `path` unless a file is already there.
    ///
    /// The JSON goes to a `.partial` sibling first and is hard-linked into
    /// place, so an interrupted write never occupies `path`.
    async fn write_new(&self, path: &Path, activity: &Activity) -> Result<(), FreedomError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error("cannot create export directory", parent, e))?;
        }
        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(duplicate(path));
        }

        let json = serde_json::to_string_pretty(activity)?;
        let partial = partial_path(path);
        if let Err(e) = write_file(&partial, json.as_bytes()).await {
            remove_partial(&partial).await;
            return Err(io_error("cannot write export file", &partial, e));
        }
        let linked = tokio::fs::hard_link(&partial, path).await;
        remove_partial(&partial).await;
        match linked {
            Ok(()) => {
                debug!(path = %path.display(), bytes = json.len(), "wrote export file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(duplicate(path)),
            Err(e) => Err(io_error("cannot create export file", path, e)),
        }
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.write_all(b"\n").await?;
    file.sync_all().await
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "cannot remove partial export file"),
    }
}

fn duplicate(path: &Path) -> FreedomError {
    FreedomError::DuplicateContent {
        message: format!("{} already exists", path.display()),
        dest_id: file_stem(path),
    }
}

/// `<date>_<id>_<title>` for an activity.
pub fn file_name(activity: &Activity) -> String {
    let date = activity
        .published
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    let id = activity.id.rsplit(':').next().unwrap_or_default();
    let title: String = activity
        .title_or_excerpt()
        .trim()
        .chars()
        .take(TITLE_MAX_LEN)
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    format!("{date}_{}_{title}", path_segment(id))
}

fn path_segment(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        cleaned
    }
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().into_owned())
}

fn io_error(what: &str, path: &Path, e: std::io::Error) -> FreedomError {
    FreedomError::Destination {
        message: format!("{what} {}", path.display()),
        source: Some(Box::new(e)),
    }
}

#[async_trait]
impl PluginAdapter for ExportDestination {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Destination
    }

    async fn health_check(&self) -> Result<HealthStatus, FreedomError> {
        match tokio::fs::create_dir_all(&self.dir).await {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "export directory {}: {e}",
                self.dir.display()
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), FreedomError> {
        Ok(())
    }
}

#[async_trait]
impl DestinationAdapter for ExportDestination {
    fn kind(&self) -> DestinationKind {
        self.kind
    }

    async fn publish_post(
        &self,
        post: &Migratable,
        activity: &Activity,
    ) -> Result<String, FreedomError> {
        let stem = file_name(activity);
        let path = self.source_dir(post).join(format!("{stem}.json"));
        self.write_new(&path, activity).await?;
        info!(key = %post.key, path = %path.display(), "exported post");
        Ok(stem)
    }

    async fn publish_comment(
        &self,
        comment: &Migratable,
        activity: &Activity,
    ) -> Result<Option<String>, FreedomError> {
        if activity.is_empty() {
            debug!(key = %comment.key, "skipping empty comment");
            return Ok(None);
        }
        let Some(post_id) = comment.dest_post_id.as_deref() else {
            return Err(FreedomError::InvariantViolation(format!(
                "comment {} has no parent post",
                comment.key
            )));
        };

        let stem = file_name(activity);
        let path = self
            .source_dir(comment)
            .join("comments")
            .join(path_segment(post_id))
            .join(format!("{stem}.json"));
        self.write_new(&path, activity).await?;
        info!(key = %comment.key, path = %path.display(), "exported comment");
        Ok(Some(stem))
    }
}
