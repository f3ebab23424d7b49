//! # Persistence
//!
//! The post store collaborator: fetch the current version of a post and apply
//! partial updates under optimistic locking.
//!
//! [`InMemoryPostStore`] is a complete store for single-session use and
//! tests. [`StoreSaveHandler`] adapts any [`PostStore`] to the auto-save
//! controller's [`SaveHandler`](crate::autosave::SaveHandler).
//!
//! ```rust
//! use post_planner::models::{Post, PostPlatform, PostUpdate};
//! use post_planner::persistence::{InMemoryPostStore, PostStore, StoreError};
//!
//! # tokio_test::block_on(async {
//! let store = InMemoryPostStore::new();
//! let post = store.create(Post::draft(PostPlatform::Linkedin, "Draft"));
//!
//! let saved = store
//!     .update_with_lock(post.id, &PostUpdate::content("Edited"), Some(&post.version))
//!     .await
//!     .unwrap();
//! assert_eq!(saved.revision, 2);
//!
//! // A writer still holding revision 1 is rejected
//! let stale = store
//!     .update_with_lock(post.id, &PostUpdate::content("Stale"), Some(&post.version))
//!     .await;
//! assert!(matches!(stale, Err(StoreError::Conflict { expected: 1, current: 2 })));
//! # });
//! ```

pub mod memory;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::autosave::{SaveError, SaveHandler};
use crate::models::post::{PostStatus, PostUpdate, VersionToken};

pub use memory::InMemoryPostStore;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Post {0} not found")]
    NotFound(Uuid),
    #[error("Post was modified elsewhere (expected revision {expected}, found {current})")]
    Conflict { expected: u64, current: u64 },
    #[error("Post {0} is published and can no longer change")]
    Immutable(Uuid),
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: PostStatus, to: PostStatus },
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Storage of posts with version-checked writes
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Current version token of a post
    async fn fetch_version(&self, id: Uuid) -> Result<VersionToken, StoreError>;

    /// Apply `update` if the stored revision still equals `expected`
    ///
    /// `expected = None` writes unconditionally.
    async fn update_with_lock(
        &self,
        id: Uuid,
        update: &PostUpdate,
        expected: Option<&VersionToken>,
    ) -> Result<VersionToken, StoreError>;
}

/// Saves a [`PostUpdate`] for one post through a [`PostStore`]
pub struct StoreSaveHandler {
    store: Arc<dyn PostStore>,
    post_id: Uuid,
}

impl StoreSaveHandler {
    pub fn new(store: Arc<dyn PostStore>, post_id: Uuid) -> Self {
        Self { store, post_id }
    }

    pub fn post_id(&self) -> Uuid {
        self.post_id
    }
}

#[async_trait]
impl SaveHandler<PostUpdate> for StoreSaveHandler {
    async fn save(
        &self,
        data: &PostUpdate,
        expected: Option<&VersionToken>,
    ) -> Result<Option<VersionToken>, SaveError> {
        match self.store.update_with_lock(self.post_id, data, expected).await {
            Ok(version) => Ok(Some(version)),
            Err(error @ StoreError::Conflict { .. }) => Err(SaveError::Conflict(error.to_string())),
            Err(error) => Err(SaveError::Failed(error.to_string())),
        }
    }
}
