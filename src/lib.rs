#![allow(clippy::doc_markdown)] // Allow technical terms like LinkedIn, YAML in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Post Planner Core
//!
//! Orchestration core of a social-media content planner.
//!
//! ## Overview
//!
//! The planner asks a remote generation service for content ideas and posts,
//! turns a selection of ideas into posts for two platforms in one batch, and
//! keeps edits to stored posts saved in the background without silently
//! overwriting concurrent changes.
//!
//! ## Module Organization
//!
//! - [`resilience`] - failure classification and retry policy
//! - [`client`] - resilient remote calls and the generation service client
//! - [`orchestration`] - batch generation with progress, cancellation and reset
//! - [`autosave`] - debounced, conflict-aware auto-save controller
//! - [`persistence`] - optimistic-lock post store seam and an in-memory store
//! - [`models`] - ideas, posts, quota and request/response shapes
//! - [`config`] - YAML configuration with environment overrides
//! - [`logging`] - structured logging setup and helpers
//! - [`error`] - crate-level error type
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use post_planner::client::{Credential, HttpTransport, StaticCredentialProvider};
//! use post_planner::config::ConfigManager;
//! use post_planner::models::GenerateIdeasRequest;
//! use post_planner::orchestration::BatchOrchestrator;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! post_planner::logging::init_structured_logging();
//!
//! let manager = ConfigManager::load()?;
//! let config = manager.config();
//!
//! let transport = Arc::new(HttpTransport::new(&config.generation)?);
//! let credentials = Arc::new(StaticCredentialProvider::new(Credential::bearer("token")));
//! let client = Arc::new(config.generation_client(transport, credentials));
//!
//! let ideas = client.generate_ideas(GenerateIdeasRequest::default()).await?;
//! let orchestrator = BatchOrchestrator::with_plan(client, config.batch);
//! let result = orchestrator.run(ideas.ideas).await?;
//! println!("{} posts generated", result.total_results);
//! # Ok(())
//! # }
//! ```

pub mod autosave;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod persistence;
pub mod resilience;

pub use autosave::{AutoSaveConfig, AutoSaveController, AutoSaveState, AutoSaveStatus};
pub use client::{GenerationClient, RemoteCallClient};
pub use config::{ConfigManager, PlannerConfig};
pub use error::{PlannerError, Result};
pub use orchestration::{BatchOrchestrator, BatchResult, BatchSnapshot};
pub use resilience::{ClassifiedError, ErrorKind, RetryPolicy};
