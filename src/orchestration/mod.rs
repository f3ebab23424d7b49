//! # Orchestration
//!
//! Batch generation of posts from a selection of ideas.
//!
//! ## Components
//!
//! - [`batch::BatchOrchestrator`]: sequential two-step run loop with
//!   cooperative cancellation and reset
//! - [`types`]: items, per-step outcomes, progress, results and snapshots
//!
//! ## Usage
//!
//! ```rust,no_run
//! use post_planner::models::ContentIdea;
//! use post_planner::orchestration::{BatchOrchestrator, PostGenerator};
//! use std::sync::Arc;
//!
//! # async fn example(generator: Arc<dyn PostGenerator>) -> Result<(), Box<dyn std::error::Error>> {
//! let orchestrator = Arc::new(BatchOrchestrator::new(generator));
//! let mut progress = orchestrator.subscribe();
//!
//! let run = orchestrator.start(vec![ContentIdea::new("1", "Title", "Description")])?;
//! while progress.changed().await.is_ok() {
//!     if !progress.borrow().is_running() {
//!         break;
//!     }
//! }
//! let result = run.await?;
//! println!("{} posts generated", result.total_results);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod types;

pub use batch::{BatchError, BatchOrchestrator, PostGenerator};
pub use types::{
    BatchItem, BatchItemStatus, BatchPhase, BatchPlan, BatchProgress, BatchResult, BatchSnapshot,
    BatchStep, StepOutcome, StepParams,
};
