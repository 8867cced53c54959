// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as the lease outliving an attempt and non-empty paths.

use crate::diagnostic::ConfigError;
use crate::model::FreedomConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &FreedomConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut invalid = |message: String| errors.push(ConfigError::Validation { message });

    let host = config.server.host.trim();
    if host.is_empty() {
        invalid("server.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            invalid(format!(
                "server.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    if !LOG_LEVELS.contains(&config.server.log_level.as_str()) {
        invalid(format!(
            "server.log_level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.server.log_level
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        invalid("storage.database_path must not be empty".to_string());
    }

    let pipeline = &config.pipeline;
    if pipeline.attempt_timeout_secs == 0 {
        invalid("pipeline.attempt_timeout_secs must be at least 1".to_string());
    }
    // A lease that can expire mid-attempt lets a duplicate task publish concurrently.
    if pipeline.lease_duration_secs <= pipeline.attempt_timeout_secs {
        invalid(format!(
            "pipeline.lease_duration_secs ({}) must be greater than pipeline.attempt_timeout_secs ({})",
            pipeline.lease_duration_secs, pipeline.attempt_timeout_secs
        ));
    }
    if pipeline.concurrency == 0 {
        invalid("pipeline.concurrency must be at least 1".to_string());
    }
    if pipeline.poll_interval_ms == 0 {
        invalid("pipeline.poll_interval_ms must be at least 1".to_string());
    }

    let queue = &config.queue;
    if queue.max_attempts == 0 {
        invalid("queue.max_attempts must be at least 1".to_string());
    }
    if queue.backoff_base_secs > queue.backoff_max_secs {
        invalid(format!(
            "queue.backoff_base_secs ({}) must not exceed queue.backoff_max_secs ({})",
            queue.backoff_base_secs, queue.backoff_max_secs
        ));
    }

    if config.adapters.archive_page_size == 0 {
        invalid("adapters.archive_page_size must be at least 1".to_string());
    }
    if config.adapters.export_dir.trim().is_empty() {
        invalid("adapters.export_dir must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(config: &FreedomConfig) -> Vec<String> {
        match validate_config(config) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&FreedomConfig::default()).is_ok());
    }

    #[test]
    fn lease_must_outlive_attempt() {
        let mut config = FreedomConfig::default();
        config.pipeline.lease_duration_secs = 600;
        config.pipeline.attempt_timeout_secs = 600;
        let msgs = messages(&config);
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("lease_duration_secs"));
    }

    #[test]
    fn collects_every_error() {
        let mut config = FreedomConfig::default();
        config.server.host = "".into();
        config.server.log_level = "loud".into();
        config.pipeline.concurrency = 0;
        config.queue.max_attempts = 0;
        assert_eq!(messages(&config).len(), 4);
    }

    #[test]
    fn rejects_invalid_host() {
        let mut config = FreedomConfig::default();
        config.server.host = "not a host!".into();
        assert!(messages(&config)[0].contains("server.host"));
    }

    #[test]
    fn backoff_base_cannot_exceed_max() {
        let mut config = FreedomConfig::default();
        config.queue.backoff_base_secs = 100;
        config.queue.backoff_max_secs = 10;
        assert!(messages(&config)[0].contains("backoff_base_secs"));
    }
}
