// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Freedom pipeline.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// A social network that posts and comments are read from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Facebook,
    Twitter,
    GooglePlus,
}

impl SourceKind {
    /// Human-readable name of the network, used in export paths.
    pub fn display_name(&self) -> &'static str {
        match self {
            SourceKind::Facebook => "Facebook",
            SourceKind::Twitter => "Twitter",
            SourceKind::GooglePlus => "GooglePlus",
        }
    }
}

/// A publishing site that posts and comments are written to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum DestinationKind {
    WordPress,
    Blogger,
    Tumblr,
    Dropbox,
}

/// Processing status shared by Migrations and Migratables.
///
/// Migratables only move forward (`New -> Processing -> Complete`), except for
/// the `Processing -> New` rollback performed when a lease is released.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    New,
    Processing,
    Complete,
}

/// Whether a Migratable is a top-level post or a comment on one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MigratableKind {
    Post,
    Comment,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter in the registry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Source,
    Destination,
    Storage,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn source_kind_parses_case_insensitively() {
        assert_eq!(SourceKind::from_str("Facebook").unwrap(), SourceKind::Facebook);
        assert_eq!(SourceKind::from_str("GOOGLEPLUS").unwrap(), SourceKind::GooglePlus);
        assert!(SourceKind::from_str("myspace").is_err());
    }

    #[test]
    fn kinds_display_as_storage_names() {
        for kind in SourceKind::iter() {
            assert_eq!(SourceKind::from_str(&kind.to_string()).unwrap(), kind);
        }
        for kind in DestinationKind::iter() {
            assert_eq!(DestinationKind::from_str(&kind.to_string()).unwrap(), kind);
        }
        assert_eq!(DestinationKind::WordPress.to_string(), "wordpress");
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&Status::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
        assert_eq!(Status::default(), Status::New);
        assert_eq!(Status::from_str("complete").unwrap(), Status::Complete);
    }
}
