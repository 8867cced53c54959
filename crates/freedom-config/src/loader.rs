// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./freedom.toml` > `~/.config/freedom/freedom.toml` > `/etc/freedom/freedom.toml`
//! with environment variable overrides via `FREEDOM_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::FreedomConfig;

/// File name looked up in every layer of the hierarchy.
pub const CONFIG_FILE_NAME: &str = "freedom.toml";

/// System-wide configuration path.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/freedom/freedom.toml";

/// Top-level sections, used to map `FREEDOM_<SECTION>_<KEY>` env vars.
const SECTIONS: &[&str] = &["server", "storage", "pipeline", "queue", "adapters"];

/// Path of the per-user configuration file, if the platform has a config dir.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("freedom").join(CONFIG_FILE_NAME))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/freedom/freedom.toml` (system-wide)
/// 3. `~/.config/freedom/freedom.toml` (user XDG config)
/// 4. `./freedom.toml` (local directory)
/// 5. `FREEDOM_*` environment variables
pub fn load_config() -> Result<FreedomConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<FreedomConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FreedomConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<FreedomConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FreedomConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(FreedomConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(CONFIG_FILE_NAME))
        .merge(env_provider())
}

/// Create the environment variable provider.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `FREEDOM_PIPELINE_LEASE_DURATION_SECS` maps to `pipeline.lease_duration_secs`.
fn env_provider() -> Env {
    Env::prefixed("FREEDOM_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_only_after_section() {
        assert_eq!(
            map_env_key("pipeline_lease_duration_secs"),
            "pipeline.lease_duration_secs"
        );
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
        assert_eq!(map_env_key("unknown_key"), "unknown_key");
    }

    #[test]
    fn env_overrides_file_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "[server]\nport = 9000\n")?;
            jail.set_env("FREEDOM_SERVER_PORT", "9100");
            jail.set_env("FREEDOM_QUEUE_MAX_ATTEMPTS", "3");
            let config = load_config_from_path(Path::new("custom.toml"))?;
            assert_eq!(config.server.port, 9100);
            assert_eq!(config.queue.max_attempts, 3);
            Ok(())
        });
    }

    #[test]
    fn local_file_is_picked_up() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE_NAME, "[pipeline]\nconcurrency = 2\n")?;
            let config = load_config()?;
            assert_eq!(config.pipeline.concurrency, 2);
            Ok(())
        });
    }
}
