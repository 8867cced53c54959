// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent entity model: Migrations, Migratables, and connected accounts.
//!
//! Composite identities are explicit structs rather than delimiter-joined
//! strings, so ids containing spaces or slashes are stored verbatim.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::activity::{self, Activity};
use crate::error::FreedomError;
use crate::types::{DestinationKind, MigratableKind, SourceKind, Status};

/// Identity of a Migration: one source account paired with one destination account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MigrationKey {
    pub source_kind: SourceKind,
    pub source_id: String,
    pub dest_kind: DestinationKind,
    pub dest_id: String,
}

impl MigrationKey {
    pub fn new(
        source_kind: SourceKind,
        source_id: impl Into<String>,
        dest_kind: DestinationKind,
        dest_id: impl Into<String>,
    ) -> Self {
        Self {
            source_kind,
            source_id: source_id.into(),
            dest_kind,
            dest_id: dest_id.into(),
        }
    }
}

impl fmt::Display for MigrationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} -> {}/{}",
            self.source_kind, self.source_id, self.dest_kind, self.dest_id
        )
    }
}

/// A configured pairing of one source account and one destination account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Migration {
    pub key: MigrationKey,
    /// Numeric id allocated by the store, used for URL routing.
    pub id: i64,
    pub status: Status,
    /// Pauses discovery of new content. In-flight Propagate tasks are unaffected.
    pub stopped: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identity of a Migratable: the source-native item id within one Migration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MigratableKey {
    pub item_id: String,
    pub migration: MigrationKey,
}

impl MigratableKey {
    pub fn new(item_id: impl Into<String>, migration: MigrationKey) -> Self {
        Self {
            item_id: item_id.into(),
            migration,
        }
    }
}

impl fmt::Display for MigratableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in [{}]", self.item_id, self.migration)
    }
}

/// A raw post or comment as returned by a source API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    /// Source-native id of the item.
    pub id: String,
    pub kind: MigratableKind,
    /// Provider-specific JSON.
    pub data: serde_json::Value,
}

impl RawItem {
    pub fn post(id: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            kind: MigratableKind::Post,
            data,
        }
    }

    pub fn comment(id: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            kind: MigratableKind::Comment,
            data,
        }
    }
}

/// Decoded source JSON, tagged by what shape of object it is.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Post(serde_json::Value),
    Comment(serde_json::Value),
}

impl Payload {
    pub fn data(&self) -> &serde_json::Value {
        match self {
            Payload::Post(v) | Payload::Comment(v) => v,
        }
    }
}

/// A single post or comment tracked for delivery within one Migration.
#[derive(Debug, Clone)]
pub struct Migratable {
    pub key: MigratableKey,
    pub kind: MigratableKind,
    pub status: Status,
    pub leased_until: Option<DateTime<Utc>>,
    /// Raw JSON from the source API, stored verbatim.
    pub json_data: String,
    pub last_updated: DateTime<Utc>,
    /// Destination-assigned id once published.
    pub dest_id: Option<String>,
    /// For comments, the destination id of the parent post.
    pub dest_post_id: Option<String>,
    parsed: OnceLock<Payload>,
}

impl Migratable {
    /// Create a new Migratable in status `New`.
    pub fn new(
        key: MigratableKey,
        kind: MigratableKind,
        json_data: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            kind,
            status: Status::New,
            leased_until: None,
            json_data: json_data.into(),
            last_updated: now,
            dest_id: None,
            dest_post_id: None,
            parsed: OnceLock::new(),
        }
    }

    /// Build a new Migratable from a raw source item.
    pub fn from_raw(
        item: &RawItem,
        migration: &MigrationKey,
        now: DateTime<Utc>,
    ) -> Result<Self, FreedomError> {
        let json = serde_json::to_string(&item.data)?;
        Ok(Self::new(
            MigratableKey::new(item.id.clone(), migration.clone()),
            item.kind,
            json,
            now,
        ))
    }

    /// Rehydrate a stored row. Used by storage backends.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        key: MigratableKey,
        kind: MigratableKind,
        status: Status,
        leased_until: Option<DateTime<Utc>>,
        json_data: String,
        last_updated: DateTime<Utc>,
        dest_id: Option<String>,
        dest_post_id: Option<String>,
    ) -> Self {
        Self {
            key,
            kind,
            status,
            leased_until,
            json_data,
            last_updated,
            dest_id,
            dest_post_id,
            parsed: OnceLock::new(),
        }
    }

    /// Source-native id of this post or comment.
    pub fn item_id(&self) -> &str {
        &self.key.item_id
    }

    /// Returns the decoded payload, parsing on first access and caching the result.
    pub fn payload(&self) -> Result<&Payload, FreedomError> {
        if let Some(payload) = self.parsed.get() {
            return Ok(payload);
        }
        let value: serde_json::Value = serde_json::from_str(&self.json_data)?;
        let payload = match self.kind {
            MigratableKind::Post => Payload::Post(value),
            MigratableKind::Comment => Payload::Comment(value),
        };
        Ok(self.parsed.get_or_init(|| payload))
    }

    /// Shorthand for the decoded JSON object.
    pub fn data(&self) -> Result<&serde_json::Value, FreedomError> {
        Ok(self.payload()?.data())
    }

    /// True if another attempt holds an unexpired lease at `now`.
    pub fn is_leased_at(&self, now: DateTime<Utc>) -> bool {
        self.status == Status::Processing && self.leased_until.is_some_and(|until| now < until)
    }

    /// Normalized activity representation handed to destination adapters.
    pub fn to_activity(&self) -> Result<Activity, FreedomError> {
        activity::normalize(
            self.key.migration.source_kind,
            self.kind,
            self.item_id(),
            self.data()?,
        )
    }
}

/// A connected source account, e.g. a Facebook profile.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceAccount {
    pub kind: SourceKind,
    /// Provider-specific external id.
    pub id: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub url: Option<String>,
    /// Opaque provider credential.
    pub access_token: String,
}

impl fmt::Debug for SourceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceAccount")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("name", &self.name)
            .field("url", &self.url)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// A connected destination account, e.g. a WordPress blog.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationAccount {
    pub kind: DestinationKind,
    /// Provider-specific external id or hostname.
    pub id: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub url: Option<String>,
    /// Opaque provider credential.
    pub access_token: String,
}

impl fmt::Debug for DestinationAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DestinationAccount")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("name", &self.name)
            .field("url", &self.url)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use serde_json::json;

    use super::*;

    fn migration_key() -> MigrationKey {
        MigrationKey::new(
            SourceKind::Facebook,
            "212038",
            DestinationKind::WordPress,
            "http://snarfed.org/w/xmlrpc.php",
        )
    }

    #[test]
    fn from_raw_keeps_id_and_kind() {
        let item = RawItem::post("123_456", json!({"id": "123_456", "message": "hi"}));
        let m = Migratable::from_raw(&item, &migration_key(), Utc::now()).unwrap();
        assert_eq!(m.item_id(), "123_456");
        assert_eq!(m.kind, MigratableKind::Post);
        assert_eq!(m.status, Status::New);
        assert!(m.leased_until.is_none());
        assert_eq!(m.data().unwrap()["message"], "hi");
    }

    #[test]
    fn payload_is_tagged_by_kind() {
        let item = RawItem::comment("c1", json!({"id": "c1", "message": "nice"}));
        let m = Migratable::from_raw(&item, &migration_key(), Utc::now()).unwrap();
        assert!(matches!(m.payload().unwrap(), Payload::Comment(_)));
    }

    #[test]
    fn payload_is_parsed_once() {
        let m = Migratable::new(
            MigratableKey::new("1", migration_key()),
            MigratableKind::Post,
            r#"{"id":"1"}"#,
            Utc::now(),
        );
        let first = m.payload().unwrap() as *const Payload;
        let second = m.payload().unwrap() as *const Payload;
        assert_eq!(first, second);
    }

    #[test]
    fn invalid_json_surfaces_as_serialization_error() {
        let m = Migratable::new(
            MigratableKey::new("1", migration_key()),
            MigratableKind::Post,
            "not json",
            Utc::now(),
        );
        assert!(matches!(m.payload(), Err(FreedomError::Serialization(_))));
    }

    #[test]
    fn lease_is_only_held_while_processing_and_unexpired() {
        let now = Utc::now();
        let mut m = Migratable::new(
            MigratableKey::new("1", migration_key()),
            MigratableKind::Post,
            "{}",
            now,
        );
        m.leased_until = Some(now + Duration::minutes(12));
        assert!(!m.is_leased_at(now), "status new never holds a lease");

        m.status = Status::Processing;
        assert!(m.is_leased_at(now + Duration::minutes(1)));
        assert!(!m.is_leased_at(now + Duration::minutes(13)));
    }

    #[test]
    fn keys_with_spaces_display_verbatim() {
        let key = MigratableKey::new(
            "id with spaces",
            MigrationKey::new(SourceKind::Twitter, "a b", DestinationKind::Tumblr, "c d"),
        );
        assert_eq!(key.to_string(), "id with spaces in [twitter/a b -> tumblr/c d]");
    }

    #[test]
    fn account_debug_redacts_token() {
        let account = SourceAccount {
            kind: SourceKind::Facebook,
            id: "212038".into(),
            name: Some("Ryan".into()),
            picture: None,
            url: None,
            access_token: "secret-token".into(),
        };
        let debug = format!("{account:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("REDACTED"));
    }
}
