// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of provider-specific JSON into a normalized [`Activity`].
//!
//! Destinations only ever see [`Activity`] values, so each source network's
//! field layout is confined to this module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use crate::error::FreedomError;
use crate::model::RawItem;
use crate::types::{MigratableKind, SourceKind};

const FACEBOOK_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";
const TWITTER_TIME_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Length of the content excerpt used when an activity has no title.
const EXCERPT_CHARS: usize = 60;

/// What kind of object an activity describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Note,
    Comment,
}

/// The person who wrote a post or comment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Author {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub url: Option<String>,
}

/// A place attached to a post, e.g. a Facebook check-in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Location {
    pub name: Option<String>,
    pub url: Option<String>,
}

/// An ActivityStreams-like view of a post or comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub object_type: ObjectType,
    pub published: Option<DateTime<Utc>>,
    pub title: Option<String>,
    pub content: String,
    pub url: Option<String>,
    pub author: Option<Author>,
    pub location: Option<Location>,
    pub image: Option<String>,
    /// Source-native id of the post this replies to, if known.
    pub in_reply_to: Option<String>,
}

impl Activity {
    fn empty(id: &str, kind: MigratableKind) -> Self {
        Self {
            id: id.to_string(),
            object_type: match kind {
                MigratableKind::Post => ObjectType::Note,
                MigratableKind::Comment => ObjectType::Comment,
            },
            published: None,
            title: None,
            content: String::new(),
            url: None,
            author: None,
            location: None,
            image: None,
            in_reply_to: None,
        }
    }

    /// The explicit title, or the first line of the content cut to a short excerpt.
    pub fn title_or_excerpt(&self) -> String {
        if let Some(title) = self.title.as_deref().filter(|t| !t.trim().is_empty()) {
            return title.trim().to_string();
        }
        let first_line = self.content.lines().next().unwrap_or_default().trim();
        let mut excerpt: String = first_line.chars().take(EXCERPT_CHARS).collect();
        if first_line.chars().count() > EXCERPT_CHARS {
            excerpt.push_str("...");
        }
        excerpt
    }

    /// True if there is nothing worth publishing.
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty() && self.image.is_none() && self.url.is_none()
    }
}

/// Normalize raw source JSON for one Migratable into an [`Activity`].
pub fn normalize(
    source: SourceKind,
    kind: MigratableKind,
    item_id: &str,
    data: &Value,
) -> Result<Activity, FreedomError> {
    if !data.is_object() {
        return Err(FreedomError::Serialization(format!(
            "{source} {kind} {item_id} is not a JSON object"
        )));
    }
    Ok(match source {
        SourceKind::Facebook => facebook(kind, item_id, data),
        SourceKind::Twitter => twitter(kind, item_id, data),
        SourceKind::GooglePlus => google_plus(kind, item_id, data),
    })
}

/// Comments embedded in a post's JSON, in the order the provider returned them.
///
/// Entries without an id are skipped.
pub fn embedded_comments(source: SourceKind, data: &Value) -> Vec<RawItem> {
    let container = match source {
        SourceKind::Twitter => "replies",
        SourceKind::Facebook | SourceKind::GooglePlus => "comments",
    };
    let Some(entries) = data
        .get(container)
        .and_then(|c| c.get("data"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| match id_of(entry, "id") {
            Some(id) => Some(RawItem::comment(id, entry.clone())),
            None => {
                tracing::warn!(%source, "skipping embedded comment without an id");
                None
            }
        })
        .collect()
}

fn facebook(kind: MigratableKind, item_id: &str, data: &Value) -> Activity {
    let mut activity = Activity::empty(&id_of(data, "id").unwrap_or_else(|| item_id.into()), kind);
    activity.content = str_of(data, "message").unwrap_or_default();
    activity.published = str_of(data, "created_time").and_then(|t| parse_time(&t, FACEBOOK_TIME_FORMAT));
    activity.title = str_of(data, "name");
    activity.url = str_of(data, "link");
    activity.image = str_of(data, "picture");

    if let Some(from) = data.get("from") {
        let id = id_of(from, "id");
        activity.author = Some(Author {
            url: id.as_ref().map(|id| format!("https://www.facebook.com/{id}")),
            id,
            display_name: str_of(from, "name"),
        });
    }
    if let Some(place) = data.get("place") {
        activity.location = Some(Location {
            name: str_of(place, "name"),
            url: id_of(place, "id").map(|id| format!("https://www.facebook.com/{id}")),
        });
    }
    activity
}

fn twitter(kind: MigratableKind, item_id: &str, data: &Value) -> Activity {
    let id = id_of(data, "id_str")
        .or_else(|| id_of(data, "id"))
        .unwrap_or_else(|| item_id.into());
    let mut activity = Activity::empty(&id, kind);
    activity.content = str_of(data, "text").unwrap_or_default();
    activity.published = str_of(data, "created_at").and_then(|t| parse_time(&t, TWITTER_TIME_FORMAT));
    activity.in_reply_to = id_of(data, "in_reply_to_status_id_str");

    if let Some(user) = data.get("user") {
        let screen_name = str_of(user, "screen_name");
        activity.url = screen_name
            .as_ref()
            .map(|name| format!("https://twitter.com/{name}/status/{id}"));
        activity.author = Some(Author {
            id: id_of(user, "id_str").or_else(|| id_of(user, "id")),
            display_name: str_of(user, "name").or_else(|| screen_name.clone()),
            url: screen_name.map(|name| format!("https://twitter.com/{name}")),
        });
    }
    activity
}

fn google_plus(kind: MigratableKind, item_id: &str, data: &Value) -> Activity {
    let activity_id = id_of(data, "id").unwrap_or_else(|| item_id.into());
    let object = data.get("object").cloned().unwrap_or(Value::Null);
    // The object id defaults to the enclosing activity id.
    let object_id = id_of(&object, "id").unwrap_or_else(|| activity_id.clone());

    let mut activity = Activity::empty(&object_id, kind);
    activity.content = str_of(&object, "content").unwrap_or_default();
    activity.title = str_of(data, "title").filter(|t| !t.is_empty());
    activity.published = str_of(data, "published")
        .and_then(|t| DateTime::parse_from_rfc3339(&t).ok())
        .map(|t| t.with_timezone(&Utc));
    activity.url = str_of(data, "url").or_else(|| str_of(&object, "url"));
    activity.image = object
        .get("attachments")
        .and_then(|a| a.get(0))
        .and_then(|a| a.get("image"))
        .and_then(|i| str_of(i, "url"));
    activity.in_reply_to = object
        .get("inReplyTo")
        .and_then(|r| r.get(0))
        .and_then(|r| id_of(r, "id"));

    if let Some(actor) = data.get("actor") {
        activity.author = Some(Author {
            id: id_of(actor, "id"),
            display_name: str_of(actor, "displayName"),
            url: str_of(actor, "url"),
        });
    }
    if let Some(location) = data.get("location") {
        activity.location = Some(Location {
            name: str_of(location, "displayName"),
            url: None,
        });
    }
    activity
}

fn str_of(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Ids arrive as strings from most APIs but as numbers from some.
fn id_of(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_time(raw: &str, format: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw, format)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn facebook_post_maps_core_fields() {
        let data = json!({
            "id": "212038_10100176064482163",
            "from": {"name": "Ryan Barrett", "id": "212038"},
            "message": "Checking in with friends",
            "created_time": "2012-03-04T18:20:37+0000",
            "place": {"id": "113785468632283", "name": "Lake Merced"},
            "type": "checkin",
        });
        let a = normalize(SourceKind::Facebook, MigratableKind::Post, "x", &data).unwrap();
        assert_eq!(a.id, "212038_10100176064482163");
        assert_eq!(a.object_type, ObjectType::Note);
        assert_eq!(a.content, "Checking in with friends");
        assert_eq!(
            a.published,
            Some(Utc.with_ymd_and_hms(2012, 3, 4, 18, 20, 37).unwrap())
        );
        let author = a.author.unwrap();
        assert_eq!(author.display_name.as_deref(), Some("Ryan Barrett"));
        assert_eq!(author.url.as_deref(), Some("https://www.facebook.com/212038"));
        assert_eq!(a.location.unwrap().name.as_deref(), Some("Lake Merced"));
    }

    #[test]
    fn twitter_tweet_builds_permalink() {
        let data = json!({
            "id": 172417043893731329_u64,
            "id_str": "172417043893731329",
            "text": "portablecontacts-unofficial: PoCo for Facebook",
            "created_at": "Wed Feb 22 20:26:41 +0000 2012",
            "in_reply_to_status_id_str": "172416000000000000",
            "user": {"id_str": "14447132", "screen_name": "schnarfed", "name": "Ryan"},
        });
        let a = normalize(SourceKind::Twitter, MigratableKind::Post, "x", &data).unwrap();
        assert_eq!(a.id, "172417043893731329");
        assert_eq!(
            a.url.as_deref(),
            Some("https://twitter.com/schnarfed/status/172417043893731329")
        );
        assert_eq!(
            a.published,
            Some(Utc.with_ymd_and_hms(2012, 2, 22, 20, 26, 41).unwrap())
        );
        assert_eq!(a.in_reply_to.as_deref(), Some("172416000000000000"));
    }

    #[test]
    fn google_plus_object_id_defaults_to_activity_id() {
        let data = json!({
            "id": "z13gjrz4ymeldtd5f04chnrixnvpjjqy42o",
            "title": "",
            "published": "2013-02-24T20:26:41.000Z",
            "object": {"content": "hello world"},
            "actor": {"id": "103651231634018158746", "displayName": "Ryan"},
        });
        let a = normalize(SourceKind::GooglePlus, MigratableKind::Post, "x", &data).unwrap();
        assert_eq!(a.id, "z13gjrz4ymeldtd5f04chnrixnvpjjqy42o");
        assert_eq!(a.content, "hello world");
        assert!(a.title.is_none());
        assert!(a.published.is_some());
    }

    #[test]
    fn missing_id_falls_back_to_item_id() {
        let a = normalize(
            SourceKind::Facebook,
            MigratableKind::Comment,
            "c1",
            &json!({"message": "nice"}),
        )
        .unwrap();
        assert_eq!(a.id, "c1");
        assert_eq!(a.object_type, ObjectType::Comment);
    }

    #[test]
    fn non_object_json_is_rejected() {
        let err = normalize(SourceKind::Twitter, MigratableKind::Post, "1", &json!([1, 2]))
            .unwrap_err();
        assert!(matches!(err, FreedomError::Serialization(_)));
    }

    #[test]
    fn embedded_comments_per_provider() {
        let fb = json!({"comments": {"data": [{"id": "c1"}, {"message": "no id"}, {"id": "c2"}]}});
        let ids: Vec<_> = embedded_comments(SourceKind::Facebook, &fb)
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec!["c1", "c2"]);

        let tw = json!({"replies": {"data": [{"id": 99}]}});
        let replies = embedded_comments(SourceKind::Twitter, &tw);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].id, "99");
        assert_eq!(replies[0].kind, MigratableKind::Comment);

        assert!(embedded_comments(SourceKind::GooglePlus, &json!({})).is_empty());
    }

    #[test]
    fn title_falls_back_to_excerpt() {
        let mut a = Activity::empty("1", MigratableKind::Post);
        a.content = format!("{}\nsecond line", "x".repeat(80));
        assert_eq!(a.title_or_excerpt(), format!("{}...", "x".repeat(60)));

        a.title = Some("  Real title ".into());
        assert_eq!(a.title_or_excerpt(), "Real title");
    }

    proptest::proptest! {
        #[test]
        fn excerpt_is_a_bounded_prefix_of_the_first_line(content in "[a-z \n]{0,200}") {
            let mut a = Activity::empty("1", MigratableKind::Post);
            a.content = content.clone();
            let excerpt = a.title_or_excerpt();
            let stem = excerpt.strip_suffix("...").unwrap_or(&excerpt);
            proptest::prop_assert!(stem.chars().count() <= EXCERPT_CHARS);
            let first_line = content.lines().next().unwrap_or_default().trim();
            proptest::prop_assert!(first_line.starts_with(stem));
        }
    }
}
