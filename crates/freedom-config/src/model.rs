// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Freedom migration pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Freedom configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FreedomConfig {
    /// HTTP server and logging settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Scan and propagate timing.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Task queue retry policy.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Offline source and destination adapters.
    #[serde(default)]
    pub adapters: AdaptersConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind the HTTP server to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("freedom").join("freedom.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("freedom.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Timing of scan and propagate tasks.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// How long a propagate attempt holds its lease on a Migratable.
    /// Must exceed `attempt_timeout_secs`.
    #[serde(default = "default_lease_duration_secs")]
    pub lease_duration_secs: u64,

    /// Maximum wall-clock time of one task attempt.
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,

    /// Delay before the next page scan, per item in the current page.
    #[serde(default = "default_scan_delay_per_item_secs")]
    pub scan_delay_per_item_secs: u64,

    /// Spacing between propagate tasks created from one page.
    #[serde(default)]
    pub propagate_spacing_secs: u64,

    /// How often idle workers poll the queue.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum concurrent task attempts per queue.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl PipelineConfig {
    pub fn lease_duration(&self) -> Duration {
        Duration::from_secs(self.lease_duration_secs)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }

    pub fn scan_delay_per_item(&self) -> Duration {
        Duration::from_secs(self.scan_delay_per_item_secs)
    }

    pub fn propagate_spacing(&self) -> Duration {
        Duration::from_secs(self.propagate_spacing_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            lease_duration_secs: default_lease_duration_secs(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
            scan_delay_per_item_secs: default_scan_delay_per_item_secs(),
            propagate_spacing_secs: 0,
            poll_interval_ms: default_poll_interval_ms(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_lease_duration_secs() -> u64 {
    12 * 60
}

fn default_attempt_timeout_secs() -> u64 {
    10 * 60
}

fn default_scan_delay_per_item_secs() -> u64 {
    2
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_concurrency() -> usize {
    4
}

/// Retry policy for failed task attempts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Attempts before a task is marked failed for good.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff after the first failure. Doubles on each further failure.
    #[serde(default = "default_backoff_base_secs")]
    pub backoff_base_secs: u64,

    /// Upper bound on the backoff between attempts.
    #[serde(default = "default_backoff_max_secs")]
    pub backoff_max_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_secs: default_backoff_base_secs(),
            backoff_max_secs: default_backoff_max_secs(),
        }
    }
}

fn default_max_attempts() -> u32 {
    10
}

fn default_backoff_base_secs() -> u64 {
    10
}

fn default_backoff_max_secs() -> u64 {
    60 * 60
}

/// Offline adapters that read exported archives and write JSON files.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AdaptersConfig {
    /// Directory holding `<source_kind>/<source_id>.json` archives.
    #[serde(default = "default_archive_dir")]
    pub archive_dir: String,

    /// Number of archived posts returned per scan page.
    #[serde(default = "default_archive_page_size")]
    pub archive_page_size: usize,

    /// Directory that the export destination writes into.
    #[serde(default = "default_export_dir")]
    pub export_dir: String,
}

impl Default for AdaptersConfig {
    fn default() -> Self {
        Self {
            archive_dir: default_archive_dir(),
            archive_page_size: default_archive_page_size(),
            export_dir: default_export_dir(),
        }
    }
}

fn data_subdir(name: &str) -> String {
    dirs::data_dir()
        .map(|p| p.join("freedom").join(name))
        .unwrap_or_else(|| std::path::PathBuf::from(name))
        .to_string_lossy()
        .into_owned()
}

fn default_archive_dir() -> String {
    data_subdir("archive")
}

fn default_archive_page_size() -> usize {
    20
}

fn default_export_dir() -> String {
    data_subdir("export")
}
