// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Which source items are worth migrating.

use serde_json::Value;

use freedom_core::SourceKind;

/// Facebook post types that are published.
const FACEBOOK_POST_TYPES: &[&str] = &["link", "checkin", "video"];

/// Facebook status types that are published.
const FACEBOOK_STATUS_TYPES: &[&str] = &["shared_story", "added_photos", "mobile_status_update"];

/// Posts made by these applications are skipped.
const APPLICATION_BLACKLIST: &[&str] = &["Likes", "Links", "twitterfeed"];

/// Returns the reason `item` should be skipped, or `None` to migrate it.
pub fn skip_reason(source: SourceKind, item: &Value) -> Option<&'static str> {
    match source {
        SourceKind::Facebook => facebook(item),
        SourceKind::Twitter => twitter(item),
        SourceKind::GooglePlus => None,
    }
}

fn facebook(post: &Value) -> Option<&'static str> {
    let post_type = post.get("type").and_then(Value::as_str);
    let status_type = post.get("status_type").and_then(Value::as_str);
    let published_type = post_type.is_some_and(|t| FACEBOOK_POST_TYPES.contains(&t))
        || status_type.is_some_and(|t| FACEBOOK_STATUS_TYPES.contains(&t));
    if !published_type {
        return Some("unpublished post type");
    }

    let app = post
        .get("application")
        .and_then(|a| a.get("name"))
        .and_then(Value::as_str);
    if app.is_some_and(|a| APPLICATION_BLACKLIST.contains(&a)) {
        return Some("blacklisted application");
    }

    // Friend approvals, likes, photo tags and comments elsewhere all carry a story.
    if post.get("story").is_some() {
        return Some("story");
    }
    None
}

fn twitter(tweet: &Value) -> Option<&'static str> {
    let app = tweet.get("source").and_then(Value::as_str);
    if app.is_some_and(|a| APPLICATION_BLACKLIST.contains(&a)) {
        return Some("blacklisted application");
    }
    None
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn facebook_links_and_status_updates_are_kept() {
        assert_eq!(skip_reason(SourceKind::Facebook, &json!({"type": "link"})), None);
        assert_eq!(
            skip_reason(
                SourceKind::Facebook,
                &json!({"type": "status", "status_type": "mobile_status_update"})
            ),
            None
        );
    }

    #[test]
    fn facebook_other_types_are_skipped() {
        assert_eq!(
            skip_reason(SourceKind::Facebook, &json!({"type": "status", "status_type": "approved_friend"})),
            Some("unpublished post type")
        );
        assert_eq!(
            skip_reason(SourceKind::Facebook, &json!({})),
            Some("unpublished post type")
        );
    }

    #[test]
    fn facebook_stories_and_blacklisted_apps_are_skipped() {
        assert_eq!(
            skip_reason(SourceKind::Facebook, &json!({"type": "link", "story": "Ryan likes a link."})),
            Some("story")
        );
        assert_eq!(
            skip_reason(
                SourceKind::Facebook,
                &json!({"type": "link", "application": {"name": "twitterfeed"}})
            ),
            Some("blacklisted application")
        );
    }

    #[test]
    fn twitter_filters_only_by_application() {
        assert_eq!(skip_reason(SourceKind::Twitter, &json!({"source": "web"})), None);
        assert_eq!(
            skip_reason(SourceKind::Twitter, &json!({"source": "Links"})),
            Some("blacklisted application")
        );
        assert_eq!(skip_reason(SourceKind::GooglePlus, &json!({"story": "x"})), None);
    }
}
