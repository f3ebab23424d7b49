use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::models::post::{Post, PostStatus, PostUpdate, VersionToken};
use crate::persistence::{PostStore, StoreError};

/// Post store held in memory
#[derive(Debug, Default)]
pub struct InMemoryPostStore {
    posts: RwLock<HashMap<Uuid, Post>>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, post: Post) -> Post {
        self.posts.write().insert(post.id, post.clone());
        post
    }

    pub fn get(&self, id: Uuid) -> Option<Post> {
        self.posts.read().get(&id).cloned()
    }

    /// Posts ordered by creation time, newest first
    pub fn list(&self) -> Vec<Post> {
        let mut posts: Vec<Post> = self.posts.read().values().cloned().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts
    }

    pub fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut posts = self.posts.write();
        let post = posts.get(&id).ok_or(StoreError::NotFound(id))?;
        if !post.can_delete() {
            return Err(StoreError::Immutable(id));
        }
        posts.remove(&id);
        Ok(())
    }

    /// Move a post to another publication status
    pub fn transition(&self, id: Uuid, status: PostStatus) -> Result<VersionToken, StoreError> {
        self.apply_transition(id, status, None)
    }

    /// Schedule a post; the status and the date share one revision
    pub fn schedule(&self, id: Uuid, at: DateTime<Utc>) -> Result<VersionToken, StoreError> {
        self.apply_transition(id, PostStatus::Scheduled, Some(at))
    }

    fn apply_transition(
        &self,
        id: Uuid,
        status: PostStatus,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> Result<VersionToken, StoreError> {
        let mut posts = self.posts.write();
        let post = posts.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if !post.status.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                from: post.status,
                to: status,
            });
        }

        let now = Utc::now();
        post.status = status;
        match status {
            PostStatus::Published => post.published_at = Some(now),
            PostStatus::Draft => post.scheduled_at = None,
            PostStatus::Scheduled if scheduled_at.is_some() => post.scheduled_at = scheduled_at,
            _ => {}
        }
        post.version = post.version.next(now);
        Ok(post.version)
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn fetch_version(&self, id: Uuid) -> Result<VersionToken, StoreError> {
        self.posts
            .read()
            .get(&id)
            .map(|post| post.version)
            .ok_or(StoreError::NotFound(id))
    }

    async fn update_with_lock(
        &self,
        id: Uuid,
        update: &PostUpdate,
        expected: Option<&VersionToken>,
    ) -> Result<VersionToken, StoreError> {
        let mut posts = self.posts.write();
        let post = posts.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if post.status.is_terminal() {
            return Err(StoreError::Immutable(id));
        }
        if let Some(expected) = expected {
            if !expected.is_same_revision(&post.version) {
                return Err(StoreError::Conflict {
                    expected: expected.revision,
                    current: post.version.revision,
                });
            }
        }

        update.apply_to(post);
        post.version = post.version.next(Utc::now());
        debug!(post_id = %id, revision = post.version.revision, "Post updated");
        Ok(post.version)
    }
}
