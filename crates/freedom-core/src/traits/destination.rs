// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Destination adapter trait for publishing sites.

use async_trait::async_trait;

use crate::activity::Activity;
use crate::error::FreedomError;
use crate::model::Migratable;
use crate::traits::adapter::PluginAdapter;
use crate::types::DestinationKind;

/// Adapter for a publishing site that content is written to.
///
/// Delivery is at-least-once, so both publish calls may be invoked more than
/// once for the same Migratable. An adapter that detects it already holds the
/// object returns [`FreedomError::DuplicateContent`], which callers treat as
/// success.
#[async_trait]
pub trait DestinationAdapter: PluginAdapter {
    /// The site this adapter writes to.
    fn kind(&self) -> DestinationKind;

    /// Publish a post. Returns the destination-assigned id.
    async fn publish_post(
        &self,
        post: &Migratable,
        activity: &Activity,
    ) -> Result<String, FreedomError>;

    /// Publish a comment under the post identified by `comment.dest_post_id`.
    ///
    /// Returns `None` if the comment was skipped, e.g. because it is empty.
    async fn publish_comment(
        &self,
        comment: &Migratable,
        activity: &Activity,
    ) -> Result<Option<String>, FreedomError>;
}
