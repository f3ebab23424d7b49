use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::generation::Platform;

/// Platform a stored post belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostPlatform {
    Linkedin,
    Instagram,
    Both,
}

impl From<Platform> for PostPlatform {
    fn from(platform: Platform) -> Self {
        match platform {
            Platform::Linkedin => Self::Linkedin,
            Platform::Instagram => Self::Instagram,
        }
    }
}

/// Publication status of a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    #[default]
    Draft,
    Scheduled,
    Published,
    Failed,
}

impl PostStatus {
    /// Published posts are immutable history
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Published)
    }

    pub fn can_transition_to(&self, next: PostStatus) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Scheduled)
                | (Self::Draft, Self::Published)
                | (Self::Scheduled, Self::Draft)
                | (Self::Scheduled, Self::Published)
                | (Self::Scheduled, Self::Failed)
                | (Self::Failed, Self::Draft)
                | (Self::Failed, Self::Scheduled)
        )
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Scheduled => write!(f, "scheduled"),
            Self::Published => write!(f, "published"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Post as returned by the generation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPost {
    pub id: String,
    pub platform: PostPlatform,
    pub content: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default)]
    pub idea_source: Option<String>,
    #[serde(default)]
    pub ai_generated: bool,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Version token used for optimistic locking
///
/// `revision` increases by one on every successful write and is the only part
/// compared when detecting conflicts; `updated_at` is kept for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionToken {
    pub revision: u64,
    pub updated_at: DateTime<Utc>,
}

impl VersionToken {
    pub fn initial(now: DateTime<Utc>) -> Self {
        Self {
            revision: 1,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn next(&self, now: DateTime<Utc>) -> Self {
        Self {
            revision: self.revision + 1,
            updated_at: now,
        }
    }

    pub fn is_same_revision(&self, other: &VersionToken) -> bool {
        self.revision == other.revision
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}@{}", self.revision, self.updated_at.to_rfc3339())
    }
}

/// A post owned by the planner's store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub platform: PostPlatform,
    pub content: String,
    pub hashtags: Vec<String>,
    pub status: PostStatus,
    pub idea_source: Option<String>,
    pub ai_generated: bool,
    pub rating: Option<u8>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub version: VersionToken,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn draft(platform: PostPlatform, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            platform,
            content: content.into(),
            hashtags: Vec::new(),
            status: PostStatus::Draft,
            idea_source: None,
            ai_generated: false,
            rating: None,
            scheduled_at: None,
            published_at: None,
            version: VersionToken::initial(now),
            created_at: now,
        }
    }

    /// Draft built from a generated post
    pub fn from_generated(generated: &GeneratedPost) -> Self {
        Self {
            hashtags: generated.hashtags.clone(),
            idea_source: generated.idea_source.clone(),
            ai_generated: true,
            ..Self::draft(generated.platform, generated.content.clone())
        }
    }

    pub fn can_delete(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// Partial update applied to a stored post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashtags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

impl PostUpdate {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.hashtags.is_none() && self.rating.is_none()
    }

    pub fn apply_to(&self, post: &mut Post) {
        if let Some(content) = &self.content {
            post.content.clone_from(content);
        }
        if let Some(hashtags) = &self.hashtags {
            post.hashtags.clone_from(hashtags);
        }
        if let Some(rating) = self.rating {
            post.rating = Some(rating);
        }
    }
}
