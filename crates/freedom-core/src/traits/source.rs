// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source adapter trait for social networks that content is read from.

use async_trait::async_trait;

use crate::activity;
use crate::error::FreedomError;
use crate::model::{Migratable, Migration, RawItem};
use crate::traits::adapter::PluginAdapter;
use crate::types::SourceKind;

/// One page of raw items returned by a source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourcePage {
    /// Items in the order the provider returned them.
    pub items: Vec<RawItem>,
    /// Opaque cursor for the next page, or `None` when the history is exhausted.
    pub next_cursor: Option<String>,
}

impl SourcePage {
    pub fn new(items: Vec<RawItem>, next_cursor: Option<String>) -> Self {
        Self { items, next_cursor }
    }

    /// A terminal page with no items.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Adapter for a social network that posts and comments are read from.
///
/// Implementations must be safe to call again with the same cursor: the
/// scanner may redeliver a page after a crash.
#[async_trait]
pub trait SourceAdapter: PluginAdapter {
    /// The network this adapter reads.
    fn kind(&self) -> SourceKind;

    /// Fetch one page of posts for `migration`, starting at `cursor` or at the
    /// newest post when `cursor` is `None`.
    async fn get_posts(
        &self,
        migration: &Migration,
        cursor: Option<&str>,
    ) -> Result<SourcePage, FreedomError>;

    /// Comments on a published post.
    ///
    /// Defaults to the comments embedded in the post's own JSON.
    async fn comments_of(&self, post: &Migratable) -> Result<Vec<RawItem>, FreedomError> {
        Ok(activity::embedded_comments(self.kind(), post.data()?))
    }
}
