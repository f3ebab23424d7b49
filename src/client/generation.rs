//! # Generation Client
//!
//! Typed operations of the content generation service, each issued through
//! the [`RemoteCallClient`] with its own deadline.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::client::remote_call::RemoteCallClient;
use crate::config::GenerationConfig;
use crate::constants::{ideas, operations};
use crate::models::generation::{
    GenerateIdeasRequest, GenerateIdeasResponse, GeneratePostRequest, GeneratePostResponse,
    GenerateVariantsRequest, GenerateVariantsResponse,
};
use crate::models::quota::QuotaInfo;
use crate::orchestration::batch::PostGenerator;
use crate::resilience::{ClassifiedError, ErrorKind};

/// Deadlines for each generation operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationTimeouts {
    pub generate_ideas: Duration,
    pub generate_post: Duration,
    pub generate_variants: Duration,
    pub check_quota: Duration,
}

impl From<&GenerationConfig> for OperationTimeouts {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            generate_ideas: Duration::from_millis(config.ideas_timeout_ms),
            generate_post: Duration::from_millis(config.post_timeout_ms),
            generate_variants: Duration::from_millis(config.variants_timeout_ms),
            check_quota: Duration::from_millis(config.quota_timeout_ms),
        }
    }
}

impl Default for OperationTimeouts {
    fn default() -> Self {
        Self::from(&GenerationConfig::default())
    }
}

/// Client for the generation service
#[derive(Debug, Clone)]
pub struct GenerationClient {
    remote: RemoteCallClient,
    timeouts: OperationTimeouts,
}

impl GenerationClient {
    pub fn new(remote: RemoteCallClient) -> Self {
        Self {
            remote,
            timeouts: OperationTimeouts::default(),
        }
    }

    #[must_use]
    pub fn with_timeouts(mut self, timeouts: OperationTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn timeouts(&self) -> &OperationTimeouts {
        &self.timeouts
    }

    /// Propose content ideas; `count` defaults to 15 and is capped at 20
    pub async fn generate_ideas(
        &self,
        mut request: GenerateIdeasRequest,
    ) -> Result<GenerateIdeasResponse, ClassifiedError> {
        let count = request
            .count
            .unwrap_or(ideas::DEFAULT_COUNT)
            .clamp(1, ideas::MAX_COUNT);
        request.count = Some(count);

        debug!(count = count, "Requesting content ideas");

        let response: GenerateIdeasResponse = self
            .remote
            .call(
                operations::GENERATE_IDEAS,
                to_payload(&request)?,
                self.timeouts.generate_ideas,
            )
            .await?;

        info!(
            generation_id = %response.generation_id,
            ideas = response.ideas.len(),
            quota_remaining = response.quota_remaining,
            "Generated content ideas"
        );
        Ok(response)
    }

    /// Write a post for one idea; an idea without title or description is
    /// rejected locally without contacting the service
    pub async fn generate_post(
        &self,
        request: GeneratePostRequest,
    ) -> Result<GeneratePostResponse, ClassifiedError> {
        if !request.idea.is_complete() {
            return Err(ClassifiedError::new(
                ErrorKind::ValidationError,
                "The idea needs a title and a description",
            ));
        }

        debug!(
            platform = %request.platform,
            generation_type = request.platform.generation_type(),
            tone = ?request.tone,
            tone_hint = request.tone.description(),
            length = ?request.length,
            "Requesting post generation"
        );

        let response: GeneratePostResponse = self
            .remote
            .call(
                operations::GENERATE_POST,
                to_payload(&request)?,
                self.timeouts.generate_post,
            )
            .await?;

        let deviations = request.platform.settings().deviations(&response.post);
        if !deviations.is_empty() {
            warn!(
                post_id = %response.post.id,
                generation_type = request.platform.generation_type(),
                deviations = ?deviations,
                "Generated post is outside the platform's publishing limits"
            );
        }
        Ok(response)
    }

    /// Rewrite an existing post in one or more styles
    pub async fn generate_variants(
        &self,
        request: GenerateVariantsRequest,
    ) -> Result<GenerateVariantsResponse, ClassifiedError> {
        if request.post_id.trim().is_empty() || request.variations.is_empty() {
            return Err(ClassifiedError::new(
                ErrorKind::ValidationError,
                "A post and at least one variation are required",
            ));
        }

        self.remote
            .call(
                operations::GENERATE_VARIANTS,
                to_payload(&request)?,
                self.timeouts.generate_variants,
            )
            .await
    }

    /// Current monthly quota
    pub async fn get_quota(&self) -> Result<QuotaInfo, ClassifiedError> {
        self.remote
            .call(
                operations::CHECK_QUOTA,
                Value::Object(serde_json::Map::new()),
                self.timeouts.check_quota,
            )
            .await
    }
}

#[async_trait]
impl PostGenerator for GenerationClient {
    async fn generate_post(
        &self,
        request: GeneratePostRequest,
    ) -> Result<GeneratePostResponse, ClassifiedError> {
        GenerationClient::generate_post(self, request).await
    }
}

fn to_payload<T: Serialize>(request: &T) -> Result<Value, ClassifiedError> {
    serde_json::to_value(request).map_err(|e| {
        ClassifiedError::new(
            ErrorKind::ValidationError,
            format!("Request could not be encoded: {e}"),
        )
    })
}
