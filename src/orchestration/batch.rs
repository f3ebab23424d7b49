//! # Batch Orchestrator
//!
//! Generates two posts for each selected idea, strictly one step at a time.
//!
//! ## Run loop
//!
//! For item `i` the first step resolves, the cancellation flag is checked,
//! then the second step resolves, before anything for item `i + 1` starts.
//! Step failures are recorded on the item and the loop moves on; the only way
//! to stop early is [`BatchOrchestrator::cancel`]. Cancellation is checked
//! before each item and between the two steps, so at most one in-flight step
//! completes after it is requested.
//!
//! Every transition republishes a [`BatchSnapshot`] on a watch channel.
//! [`BatchOrchestrator::reset`] bumps a run epoch; a loop from an older epoch
//! stops at its next check and never publishes again. A new run cannot begin
//! until that loop has returned, so remote calls never overlap.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::constants::events;
use crate::logging::log_batch_operation;
use crate::models::generation::{GeneratePostRequest, GeneratePostResponse};
use crate::models::idea::ContentIdea;
use crate::orchestration::types::{
    BatchItem, BatchItemStatus, BatchPhase, BatchPlan, BatchProgress, BatchResult, BatchSnapshot,
    BatchStep, StepOutcome,
};
use crate::resilience::ClassifiedError;

/// Produces one post for a generation request
#[async_trait]
pub trait PostGenerator: Send + Sync {
    async fn generate_post(
        &self,
        request: GeneratePostRequest,
    ) -> Result<GeneratePostResponse, ClassifiedError>;
}

/// Reasons a run cannot start
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("No ideas selected")]
    EmptySelection,
    /// A run is active, or a reset run is still finishing its last step
    #[error("A batch run is already active")]
    AlreadyRunning,
    #[error("The previous batch run must be reset before starting another")]
    ResetRequired,
}

/// Sequential two-step batch generation with progress and cancellation
pub struct BatchOrchestrator {
    generator: Arc<dyn PostGenerator>,
    plan: BatchPlan,
    phase: Mutex<BatchPhase>,
    cancel_requested: AtomicBool,
    epoch: AtomicU64,
    loop_active: Arc<AtomicBool>,
    state_tx: watch::Sender<BatchSnapshot>,
}

/// Held by a run loop; clears the active flag when the loop ends or is dropped
struct ActiveRun(Arc<AtomicBool>);

impl Drop for ActiveRun {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for BatchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchOrchestrator")
            .field("plan", &self.plan)
            .field("phase", &*self.phase.lock())
            .field("epoch", &self.epoch.load(Ordering::Acquire))
            .finish()
    }
}

impl BatchOrchestrator {
    pub fn new(generator: Arc<dyn PostGenerator>) -> Self {
        Self::with_plan(generator, BatchPlan::default())
    }

    pub fn with_plan(generator: Arc<dyn PostGenerator>, plan: BatchPlan) -> Self {
        let (state_tx, _) = watch::channel(BatchSnapshot::default());
        Self {
            generator,
            plan,
            phase: Mutex::new(BatchPhase::Idle),
            cancel_requested: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
            loop_active: Arc::new(AtomicBool::new(false)),
            state_tx,
        }
    }

    pub fn plan(&self) -> &BatchPlan {
        &self.plan
    }

    pub fn phase(&self) -> BatchPhase {
        *self.phase.lock()
    }

    pub fn is_running(&self) -> bool {
        self.phase() == BatchPhase::Running
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> BatchSnapshot {
        self.state_tx.borrow().clone()
    }

    /// Receiver that sees every republished snapshot
    pub fn subscribe(&self) -> watch::Receiver<BatchSnapshot> {
        self.state_tx.subscribe()
    }

    /// Run a batch to completion or cancellation on the current task
    pub async fn run(&self, ideas: Vec<ContentIdea>) -> Result<BatchResult, BatchError> {
        let (epoch, active) = self.begin(&ideas)?;
        Ok(self.process(epoch, ideas, active).await)
    }

    /// Validate and spawn a batch run in the background
    pub fn start(
        self: &Arc<Self>,
        ideas: Vec<ContentIdea>,
    ) -> Result<JoinHandle<BatchResult>, BatchError> {
        let (epoch, active) = self.begin(&ideas)?;
        let orchestrator = Arc::clone(self);
        Ok(tokio::spawn(async move {
            orchestrator.process(epoch, ideas, active).await
        }))
    }

    /// Ask the active run to stop before its next step; idempotent
    pub fn cancel(&self) {
        let was_requested = self.cancel_requested.swap(true, Ordering::AcqRel);
        if !was_requested && self.is_running() {
            info!(event = events::BATCH_CANCEL_REQUESTED, "Batch cancellation requested");
        }
    }

    /// Discard all state; a run in progress stops publishing immediately
    ///
    /// The superseded run still completes its in-flight step, and `start`
    /// reports [`BatchError::AlreadyRunning`] until it has.
    pub fn reset(&self) {
        let mut phase = self.phase.lock();
        let previous = *phase;
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.cancel_requested.store(true, Ordering::Release);
        *phase = BatchPhase::Idle;
        self.state_tx.send_replace(BatchSnapshot::default());

        debug!(
            previous_phase = ?previous,
            event = events::BATCH_RESET,
            "Batch state reset"
        );
    }

    fn begin(&self, ideas: &[ContentIdea]) -> Result<(u64, ActiveRun), BatchError> {
        if ideas.is_empty() {
            return Err(BatchError::EmptySelection);
        }

        let mut phase = self.phase.lock();
        match *phase {
            BatchPhase::Idle => {}
            BatchPhase::Running => return Err(BatchError::AlreadyRunning),
            BatchPhase::Finished | BatchPhase::Cancelled => {
                return Err(BatchError::ResetRequired)
            }
        }

        if self.loop_active.swap(true, Ordering::AcqRel) {
            debug!("Superseded batch run is still finishing its last step");
            return Err(BatchError::AlreadyRunning);
        }
        let active = ActiveRun(Arc::clone(&self.loop_active));

        *phase = BatchPhase::Running;
        self.cancel_requested.store(false, Ordering::Release);
        let epoch = self.epoch.load(Ordering::Acquire);

        let items: Vec<BatchItem> = ideas.iter().cloned().map(BatchItem::new).collect();
        self.state_tx.send_replace(BatchSnapshot {
            phase: BatchPhase::Running,
            progress: BatchProgress::new(items.len()),
            items,
            result: None,
        });

        log_batch_operation(events::BATCH_STARTED, None, ideas.len(), "running", None);
        Ok((epoch, active))
    }

    fn should_stop(&self, epoch: u64) -> bool {
        self.cancel_requested.load(Ordering::Acquire) || self.epoch.load(Ordering::Acquire) != epoch
    }

    /// Publish unless a reset has superseded this run
    fn publish(&self, epoch: u64, items: &[BatchItem], progress: BatchProgress) {
        let _phase = self.phase.lock();
        if self.epoch.load(Ordering::Acquire) != epoch {
            return;
        }
        self.state_tx.send_replace(BatchSnapshot {
            phase: BatchPhase::Running,
            items: items.to_vec(),
            progress,
            result: None,
        });
    }

    fn finish(&self, epoch: u64, progress: BatchProgress, result: &BatchResult) {
        let mut phase = self.phase.lock();
        if self.epoch.load(Ordering::Acquire) != epoch {
            debug!("Batch run superseded by reset, result not published");
            return;
        }

        *phase = if result.cancelled {
            BatchPhase::Cancelled
        } else {
            BatchPhase::Finished
        };
        self.state_tx.send_replace(BatchSnapshot {
            phase: *phase,
            items: result.items.clone(),
            progress,
            result: Some(result.clone()),
        });
    }

    async fn process(
        &self,
        epoch: u64,
        ideas: Vec<ContentIdea>,
        _active: ActiveRun,
    ) -> BatchResult {
        let total = ideas.len();
        let mut items: Vec<BatchItem> = ideas.into_iter().map(BatchItem::new).collect();
        let mut progress = BatchProgress::new(total);
        let mut cancelled = false;
        let mut interrupted_index = None;

        'items: for index in 0..total {
            for step in [BatchStep::First, BatchStep::Second] {
                if self.should_stop(epoch) {
                    cancelled = true;
                    if step == BatchStep::Second {
                        interrupted_index = Some(index);
                    }
                    break 'items;
                }

                items[index].status = step.active_status();
                progress.begin_step(index, step);
                self.publish(epoch, &items, progress);

                let outcome = self.run_step(index, step, &items[index].idea).await;
                items[index].record(step, outcome);
                progress.complete_step();
                self.publish(epoch, &items, progress);
            }

            let status = items[index].final_status();
            items[index].status = status;
            progress.complete_item();

            let event = if status == BatchItemStatus::Completed {
                events::BATCH_ITEM_COMPLETED
            } else {
                events::BATCH_ITEM_FAILED
            };
            log_batch_operation(event, Some(index), total, &status.to_string(), None);
            self.publish(epoch, &items, progress);
        }

        progress.stop();
        let result = BatchResult::from_items(items, cancelled, interrupted_index);

        info!(
            total = total,
            success_count = result.success_count,
            failure_count = result.failure_count,
            total_results = result.total_results,
            cancelled = result.cancelled,
            event = events::BATCH_FINISHED,
            "Batch generation finished"
        );

        self.finish(epoch, progress, &result);
        result
    }

    async fn run_step(&self, index: usize, step: BatchStep, idea: &ContentIdea) -> StepOutcome {
        let request = self.plan.request_for(step, idea);
        let platform = request.platform;

        match self.generator.generate_post(request).await {
            Ok(response) => {
                debug!(index = index, step = ?step, platform = %platform, "Batch step succeeded");
                StepOutcome::succeeded(response.post)
            }
            Err(error) => {
                warn!(
                    index = index,
                    step = ?step,
                    platform = %platform,
                    kind = %error.kind,
                    error = %error.message,
                    "Batch step failed, continuing"
                );
                StepOutcome::failed(error)
            }
        }
    }
}
