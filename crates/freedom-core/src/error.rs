// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Freedom migration pipeline.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// The primary error type used across all Freedom adapter traits and pipeline operations.
#[derive(Debug, Error)]
pub enum FreedomError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, migrations).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A referenced Migration or Migratable no longer exists.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Another delivery attempt currently holds the lease on this Migratable.
    #[error("{key} is leased by another attempt until {leased_until}")]
    Conflict {
        key: String,
        leased_until: DateTime<Utc>,
    },

    /// A state transition that should be unreachable was observed.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Source adapter failure (network, auth, malformed page).
    #[error("source error: {message}")]
    Source {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Destination adapter failure (network, auth, rejected publish).
    #[error("destination error: {message}")]
    Destination {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The destination already holds this object. Callers treat it as success.
    #[error("duplicate content: {message}")]
    DuplicateContent {
        message: String,
        dest_id: Option<String>,
    },

    /// A stored JSON blob or task payload could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Requested adapter was not found in the registry.
    #[error("adapter not found: {adapter_type}/{name}")]
    AdapterNotFound { adapter_type: String, name: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FreedomError {
    /// Shorthand for a missing entity.
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        FreedomError::NotFound {
            entity,
            key: key.into(),
        }
    }

    /// Shorthand for a source adapter failure without an underlying cause.
    pub fn source(message: impl Into<String>) -> Self {
        FreedomError::Source {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a destination adapter failure without an underlying cause.
    pub fn destination(message: impl Into<String>) -> Self {
        FreedomError::Destination {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if this error means another attempt holds the lease.
    ///
    /// A conflicting attempt never acquired the lease, so it must not release it.
    pub fn is_conflict(&self) -> bool {
        matches!(self, FreedomError::Conflict { .. })
    }

    /// Returns true if redelivering the task cannot succeed.
    ///
    /// Fatal errors are dropped by the task worker instead of being retried.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FreedomError::NotFound { .. }
                | FreedomError::InvariantViolation(_)
                | FreedomError::Serialization(_)
        )
    }
}

impl From<serde_json::Error> for FreedomError {
    fn from(e: serde_json::Error) -> Self {
        FreedomError::Serialization(e.to_string())
    }
}
