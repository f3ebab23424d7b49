//! # Data Models
//!
//! Serde types exchanged with the generation service and the post store.
//!
//! - [`generation`] - platform, tone and length variants plus request/response shapes
//! - [`idea`] - content ideas proposed by the service
//! - [`post`] - generated and stored posts, publication status, version tokens
//! - [`quota`] - monthly generation quota

pub mod generation;
pub mod idea;
pub mod post;
pub mod quota;

// Re-export core models for easy access
pub use generation::{
    GenerateIdeasRequest, GenerateIdeasResponse, GeneratePostRequest, GeneratePostResponse,
    GenerateVariantsRequest, GenerateVariantsResponse, Length, LengthSpec, Platform,
    PlatformSettings, PostVariant, Tone, VariationKind,
};
pub use idea::{ContentIdea, EstimatedEngagement, IdeaRef, TargetPlatform};
pub use post::{GeneratedPost, Post, PostPlatform, PostStatus, PostUpdate, VersionToken};
pub use quota::{QuotaCategory, QuotaInfo, QuotaKind};
