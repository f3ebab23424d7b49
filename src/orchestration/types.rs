//! # Orchestration Types
//!
//! Items, progress and results of a batch generation run.
//!
//! A [`BatchItem`] moves through
//! `pending -> generating_step_1 -> generating_step_2 -> completed | failed`.
//! An item is `failed` only when neither step produced a post; one successful
//! step is enough for `completed`, with the other step's error kept for
//! display.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::generation::{GeneratePostRequest, Length, Platform, Tone};
use crate::models::idea::ContentIdea;
use crate::models::post::GeneratedPost;
use crate::resilience::ClassifiedError;

/// Lifecycle status of one batch item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BatchItemStatus {
    #[default]
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "generating_step_1")]
    GeneratingFirst,
    #[serde(rename = "generating_step_2")]
    GeneratingSecond,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "failed")]
    Failed,
}

impl BatchItemStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::GeneratingFirst | Self::GeneratingSecond)
    }
}

impl fmt::Display for BatchItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::GeneratingFirst => write!(f, "generating_step_1"),
            Self::GeneratingSecond => write!(f, "generating_step_2"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// One of the two generation steps run for every item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStep {
    First,
    Second,
}

impl BatchStep {
    /// Status an item carries while this step runs
    pub fn active_status(&self) -> BatchItemStatus {
        match self {
            Self::First => BatchItemStatus::GeneratingFirst,
            Self::Second => BatchItemStatus::GeneratingSecond,
        }
    }
}

/// Generation parameters for one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepParams {
    pub platform: Platform,
    pub tone: Tone,
    pub length: Length,
}

/// Parameters of both steps
///
/// Defaults: a medium professional LinkedIn post, then a short casual
/// Instagram post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPlan {
    pub first: StepParams,
    pub second: StepParams,
}

impl Default for BatchPlan {
    fn default() -> Self {
        Self {
            first: StepParams {
                platform: Platform::Linkedin,
                tone: Tone::Professional,
                length: Length::Medium,
            },
            second: StepParams {
                platform: Platform::Instagram,
                tone: Tone::Casual,
                length: Length::Short,
            },
        }
    }
}

impl BatchPlan {
    pub fn params(&self, step: BatchStep) -> &StepParams {
        match step {
            BatchStep::First => &self.first,
            BatchStep::Second => &self.second,
        }
    }

    pub fn request_for(&self, step: BatchStep, idea: &ContentIdea) -> GeneratePostRequest {
        let params = self.params(step);
        GeneratePostRequest::for_platform(idea.to_ref(), params.platform)
            .with_tone(params.tone)
            .with_length(params.length)
    }
}

/// What a single step produced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub post: Option<GeneratedPost>,
    pub error: Option<ClassifiedError>,
}

impl StepOutcome {
    pub fn succeeded(post: GeneratedPost) -> Self {
        Self {
            post: Some(post),
            error: None,
        }
    }

    pub fn failed(error: ClassifiedError) -> Self {
        Self {
            post: None,
            error: Some(error),
        }
    }

    pub fn has_post(&self) -> bool {
        self.post.is_some()
    }
}

/// One idea and the two posts generated from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub idea: ContentIdea,
    pub status: BatchItemStatus,
    pub first: StepOutcome,
    pub second: StepOutcome,
}

impl BatchItem {
    pub fn new(idea: ContentIdea) -> Self {
        Self {
            idea,
            status: BatchItemStatus::Pending,
            first: StepOutcome::default(),
            second: StepOutcome::default(),
        }
    }

    pub fn outcome(&self, step: BatchStep) -> &StepOutcome {
        match step {
            BatchStep::First => &self.first,
            BatchStep::Second => &self.second,
        }
    }

    pub(crate) fn record(&mut self, step: BatchStep, outcome: StepOutcome) {
        match step {
            BatchStep::First => self.first = outcome,
            BatchStep::Second => self.second = outcome,
        }
    }

    /// Number of posts produced so far, 0 to 2
    pub fn results_count(&self) -> usize {
        usize::from(self.first.has_post()) + usize::from(self.second.has_post())
    }

    /// Terminal status once both steps have resolved
    pub fn final_status(&self) -> BatchItemStatus {
        if self.results_count() > 0 {
            BatchItemStatus::Completed
        } else {
            BatchItemStatus::Failed
        }
    }

    /// One step succeeded and the other failed
    pub fn is_partial(&self) -> bool {
        self.status == BatchItemStatus::Completed && self.results_count() == 1
    }
}

/// Live progress of a run, recomputed after every transition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProgress {
    pub total: usize,
    /// Items whose two steps have both resolved
    pub processed: usize,
    /// 0-based index of the active item
    pub current_index: Option<usize>,
    pub current_step: Option<BatchStep>,
    pub completed_steps: usize,
    /// `completed_steps / (total × 2)`, rounded, 0-100
    pub percentage: u8,
}

impl BatchProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub(crate) fn begin_step(&mut self, index: usize, step: BatchStep) {
        self.current_index = Some(index);
        self.current_step = Some(step);
    }

    pub(crate) fn complete_step(&mut self) {
        self.completed_steps += 1;
        self.percentage = percentage(self.completed_steps, self.total);
    }

    pub(crate) fn complete_item(&mut self) {
        self.processed += 1;
        self.current_step = None;
    }

    pub(crate) fn stop(&mut self) {
        self.current_index = None;
        self.current_step = None;
    }
}

fn percentage(completed_steps: usize, total_items: usize) -> u8 {
    if total_items == 0 {
        return 0;
    }
    let ratio = completed_steps as f64 / (total_items * 2) as f64;
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Outcome of a whole run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub items: Vec<BatchItem>,
    pub success_count: usize,
    pub failure_count: usize,
    /// Posts produced across both steps and all items
    pub total_results: usize,
    pub cancelled: bool,
    /// Item stopped between its two steps by a cancellation
    pub interrupted_index: Option<usize>,
}

impl BatchResult {
    pub(crate) fn from_items(
        items: Vec<BatchItem>,
        cancelled: bool,
        interrupted_index: Option<usize>,
    ) -> Self {
        let success_count = items
            .iter()
            .filter(|item| item.status == BatchItemStatus::Completed)
            .count();
        let failure_count = items
            .iter()
            .filter(|item| item.status == BatchItemStatus::Failed)
            .count();
        let total_results = items.iter().map(BatchItem::results_count).sum();

        Self {
            items,
            success_count,
            failure_count,
            total_results,
            cancelled,
            interrupted_index,
        }
    }

    pub fn posts(&self) -> impl Iterator<Item = &GeneratedPost> {
        self.items
            .iter()
            .flat_map(|item| [item.first.post.as_ref(), item.second.post.as_ref()])
            .flatten()
    }
}

/// Phase of the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPhase {
    /// Ready to start
    #[default]
    Idle,
    Running,
    /// Every item was processed
    Finished,
    /// Stopped early by a cancellation
    Cancelled,
}

/// Read-only view published to subscribers after every transition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSnapshot {
    pub phase: BatchPhase,
    pub items: Vec<BatchItem>,
    pub progress: BatchProgress,
    pub result: Option<BatchResult>,
}

impl BatchSnapshot {
    pub fn is_running(&self) -> bool {
        self.phase == BatchPhase::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::post::PostPlatform;
    use crate::resilience::ErrorKind;
    use chrono::Utc;

    fn post() -> GeneratedPost {
        GeneratedPost {
            id: "p1".to_string(),
            platform: PostPlatform::Linkedin,
            content: "content".to_string(),
            hashtags: Vec::new(),
            status: Default::default(),
            idea_source: None,
            ai_generated: true,
            metadata: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_partial_success_is_completed() {
        let mut item = BatchItem::new(ContentIdea::new("i", "t", "d"));
        item.record(BatchStep::First, StepOutcome::succeeded(post()));
        item.record(
            BatchStep::Second,
            StepOutcome::failed(ClassifiedError::from_kind(ErrorKind::ApiError)),
        );
        item.status = item.final_status();

        assert_eq!(item.status, BatchItemStatus::Completed);
        assert!(item.is_partial());
        assert_eq!(item.results_count(), 1);
    }

    #[test]
    fn test_no_posts_is_failed() {
        let item = BatchItem::new(ContentIdea::new("i", "t", "d"));
        assert_eq!(item.final_status(), BatchItemStatus::Failed);
    }

    #[test]
    fn test_percentage_counts_steps() {
        let mut progress = BatchProgress::new(3);
        progress.complete_step();
        assert_eq!(progress.percentage, 17);
        for _ in 0..5 {
            progress.complete_step();
        }
        assert_eq!(progress.percentage, 100);
        assert_eq!(BatchProgress::new(0).percentage, 0);
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_value(BatchItemStatus::GeneratingSecond).unwrap(),
            "generating_step_2"
        );
        assert_eq!(BatchItemStatus::GeneratingFirst.to_string(), "generating_step_1");
    }

    #[test]
    fn test_default_plan() {
        let plan = BatchPlan::default();
        let idea = ContentIdea::new("i", "t", "d");

        let first = plan.request_for(BatchStep::First, &idea);
        let second = plan.request_for(BatchStep::Second, &idea);

        assert_eq!(first.platform, Platform::Linkedin);
        assert_eq!(first.tone, Tone::Professional);
        assert_eq!(second.platform, Platform::Instagram);
        assert_eq!(second.length, Length::Short);
    }
}
