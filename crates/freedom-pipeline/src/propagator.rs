// SPDX-FileCopyrightText: 2026 Freedom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery of one Migratable to its destination under a lease.
//!
//! A propagate attempt runs three atomic units: lease, then publish outside
//! any transaction, then complete. Any failure after the lease was taken
//! releases it so the next delivery can retry at once. That includes a
//! publish that overruns the attempt timeout and an attempt whose future is
//! dropped mid-publish. A conflicting attempt never took the lease and leaves
//! it alone.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use freedom_core::{
    Clock, EntityStore, FreedomError, Migratable, MigratableKey, MigratableKind, Status,
    TaskRequest, UnitOfWork,
};
use tracing::{debug, error, info, warn};

use crate::registry::AdapterRegistry;
use crate::tasks::{PropagateTask, spaced};

/// What one propagate task did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropagateOutcome {
    /// An earlier delivery already completed this Migratable.
    AlreadyComplete,
    Published {
        /// Destination id, if the destination assigned one.
        dest_id: Option<String>,
        /// Comment Migratables created from a published post.
        comments: usize,
    },
}

/// Runs propagate tasks.
pub struct Propagator {
    store: Arc<dyn EntityStore>,
    registry: Arc<AdapterRegistry>,
    clock: Arc<dyn Clock>,
    lease_duration: Duration,
    comment_spacing: Duration,
    attempt_timeout: Option<Duration>,
}

impl Propagator {
    pub fn new(
        store: Arc<dyn EntityStore>,
        registry: Arc<AdapterRegistry>,
        clock: Arc<dyn Clock>,
        lease_duration: Duration,
    ) -> Self {
        Self {
            store,
            registry,
            clock,
            lease_duration,
            comment_spacing: Duration::ZERO,
            attempt_timeout: None,
        }
    }

    /// Space out the propagate tasks of comments fanned out from one post.
    pub fn with_comment_spacing(mut self, spacing: Duration) -> Self {
        self.comment_spacing = spacing;
        self
    }

    /// Bound publish and complete by `limit`. An overrun fails with
    /// `Timeout` after releasing the lease.
    pub fn with_attempt_timeout(mut self, limit: Duration) -> Self {
        self.attempt_timeout = Some(limit);
        self
    }

    /// Lease, publish and complete one Migratable.
    pub async fn propagate(&self, key: &MigratableKey) -> Result<PropagateOutcome, FreedomError> {
        let Some(leased) = self.lease(key).await? else {
            return Ok(PropagateOutcome::AlreadyComplete);
        };

        let guard = LeaseGuard::new(self.store.clone(), key.clone());
        let delivered = match self.attempt_timeout {
            Some(limit) => tokio::time::timeout(limit, self.deliver(&leased))
                .await
                .unwrap_or_else(|_| Err(FreedomError::Timeout { duration: limit })),
            None => self.deliver(&leased).await,
        };
        guard.disarm();

        match delivered {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                warn!(key = %key, error = %e, "propagate failed, releasing lease");
                if let Err(release_err) = self.release(key).await {
                    error!(key = %key, error = %release_err, "failed to release lease");
                }
                Err(e)
            }
        }
    }

    /// Take the lease on `key`.
    ///
    /// Returns `None` if the Migratable is already complete. Fails with
    /// `NotFound` if it does not exist and with `Conflict` if another attempt
    /// holds an unexpired lease.
    pub async fn lease(&self, key: &MigratableKey) -> Result<Option<Migratable>, FreedomError> {
        let now = self.clock.now();
        let until = lease_deadline(now, self.lease_duration);
        let missing = key.to_string();

        let stored = self
            .store
            .update_migratable(
                key,
                Box::new(move |current: Option<Migratable>| {
                    let Some(mut m) = current else {
                        return Err(FreedomError::not_found("migratable", missing));
                    };
                    match m.status {
                        Status::Complete => Ok(UnitOfWork::keep()),
                        Status::Processing if m.is_leased_at(now) => Err(FreedomError::Conflict {
                            key: m.key.to_string(),
                            leased_until: m.leased_until.unwrap_or(now),
                        }),
                        Status::Processing | Status::New => {
                            if m.status == Status::Processing {
                                warn!(key = %m.key, "previous lease expired, taking over");
                            }
                            m.status = Status::Processing;
                            m.leased_until = Some(until);
                            Ok(UnitOfWork::save(m))
                        }
                    }
                }),
            )
            .await?
            .ok_or_else(|| FreedomError::not_found("migratable", key.to_string()))?;

        if stored.status == Status::Complete {
            warn!(key = %key, "duplicate task, already propagated");
            return Ok(None);
        }
        debug!(key = %key, leased_until = %until, "leased");
        Ok(Some(stored))
    }

    /// Mark a leased Migratable complete, recording `dest_id` and creating
    /// `comments` with their propagate tasks in the same unit.
    pub async fn complete(
        &self,
        key: &MigratableKey,
        dest_id: Option<String>,
        comments: Vec<(Migratable, TaskRequest)>,
    ) -> Result<(), FreedomError> {
        let missing = key.to_string();
        self.store
            .update_migratable(
                key,
                Box::new(move |current: Option<Migratable>| {
                    let Some(mut m) = current else {
                        return Err(FreedomError::not_found("migratable", missing));
                    };
                    match m.status {
                        Status::Complete => {
                            warn!(key = %m.key, "completed by another attempt, did the lease expire?");
                            Ok(UnitOfWork::keep())
                        }
                        Status::New => Err(FreedomError::InvariantViolation(format!(
                            "{} went backward from processing to new",
                            m.key
                        ))),
                        Status::Processing => {
                            m.status = Status::Complete;
                            m.dest_id = dest_id;
                            Ok(comments.into_iter().fold(
                                UnitOfWork::save(m),
                                |unit, (comment, task)| unit.with_insert(comment, Some(task)),
                            ))
                        }
                    }
                }),
            )
            .await?;
        Ok(())
    }

    /// Return a processing Migratable to `new` so it can be retried.
    pub async fn release(&self, key: &MigratableKey) -> Result<(), FreedomError> {
        release_lease(self.store.as_ref(), key).await
    }

    async fn deliver(&self, leased: &Migratable) -> Result<PropagateOutcome, FreedomError> {
        let activity = leased.to_activity()?;
        let destination = self.registry.destination(leased.key.migration.dest_kind)?;

        let dest_id = match leased.kind {
            MigratableKind::Post => match destination.publish_post(leased, &activity).await {
                Ok(id) => Some(id),
                Err(FreedomError::DuplicateContent { message, dest_id }) => {
                    info!(key = %leased.key, %message, "destination already has this post");
                    dest_id
                }
                Err(e) => return Err(e),
            },
            MigratableKind::Comment => {
                match destination.publish_comment(leased, &activity).await {
                    Ok(id) => id,
                    Err(FreedomError::DuplicateContent { message, dest_id }) => {
                        info!(key = %leased.key, %message, "destination already has this comment");
                        dest_id
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        let comments = match (leased.kind, &dest_id) {
            (MigratableKind::Post, Some(post_id)) => self.comments_for(leased, post_id).await?,
            (MigratableKind::Post, None) => {
                warn!(key = %leased.key, "post has no destination id, not migrating its comments");
                Vec::new()
            }
            (MigratableKind::Comment, _) => Vec::new(),
        };
        let fanned_out = comments.len();

        self.complete(&leased.key, dest_id.clone(), comments).await?;
        info!(
            key = %leased.key,
            kind = %leased.kind,
            dest_id = dest_id.as_deref().unwrap_or("-"),
            comments = fanned_out,
            "propagated"
        );
        Ok(PropagateOutcome::Published {
            dest_id,
            comments: fanned_out,
        })
    }

    async fn comments_for(
        &self,
        post: &Migratable,
        post_dest_id: &str,
    ) -> Result<Vec<(Migratable, TaskRequest)>, FreedomError> {
        let source = self.registry.source(post.key.migration.source_kind)?;
        let now = self.clock.now();
        source
            .comments_of(post)
            .await?
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                let mut comment = Migratable::from_raw(raw, &post.key.migration, now)?;
                comment.dest_post_id = Some(post_dest_id.to_string());
                let task = PropagateTask::new(comment.key.clone())
                    .to_request(spaced(self.comment_spacing, index))?;
                Ok((comment, task))
            })
            .collect()
    }
}

async fn release_lease(store: &dyn EntityStore, key: &MigratableKey) -> Result<(), FreedomError> {
    store
        .update_migratable(
            key,
            Box::new(|current: Option<Migratable>| match current {
                Some(mut m) if m.status == Status::Processing => {
                    m.status = Status::New;
                    m.leased_until = None;
                    Ok(UnitOfWork::save(m))
                }
                _ => Ok(UnitOfWork::keep()),
            }),
        )
        .await?;
    debug!(key = %key, "released");
    Ok(())
}

/// Releases a lease whose attempt was dropped before it finished.
///
/// Dropping the guard without [`disarm`](Self::disarm) spawns the release
/// onto the current runtime.
struct LeaseGuard {
    store: Arc<dyn EntityStore>,
    key: Option<MigratableKey>,
}

impl LeaseGuard {
    fn new(store: Arc<dyn EntityStore>, key: MigratableKey) -> Self {
        Self {
            store,
            key: Some(key),
        }
    }

    fn disarm(mut self) {
        self.key = None;
    }
}

impl Drop for LeaseGuard {
    fn drop(&mut self) {
        let Some(key) = self.key.take() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            error!(key = %key, "attempt dropped outside a runtime, lease left to expire");
            return;
        };
        warn!(key = %key, "attempt dropped mid-delivery, releasing lease");
        let store = self.store.clone();
        runtime.spawn(async move {
            if let Err(e) = release_lease(store.as_ref(), &key).await {
                error!(key = %key, error = %e, "failed to release lease");
            }
        });
    }
}

fn lease_deadline(now: DateTime<Utc>, lease: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(lease)
        .ok()
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
