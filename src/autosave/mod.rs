//! # Auto-Save
//!
//! Debounced, conflict-aware saving of an editing session.
//!
//! Status moves `idle -> saving -> saved | error | conflict`. `saved` and
//! `error` return to `idle` on acknowledgement or on the next edit; `conflict`
//! stays until [`AutoSaveController::resolve_conflict`] accepts the remote
//! version.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use post_planner::autosave::{AutoSaveConfig, AutoSaveController};
//! use post_planner::models::{Post, PostPlatform, PostUpdate};
//! use post_planner::persistence::{InMemoryPostStore, StoreSaveHandler};
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let store = Arc::new(InMemoryPostStore::new());
//! let post = store.create(Post::draft(PostPlatform::Linkedin, "Draft"));
//!
//! let controller = AutoSaveController::<PostUpdate>::new(
//!     Arc::new(StoreSaveHandler::new(store.clone(), post.id)),
//!     &AutoSaveConfig::default(),
//! )
//! .with_server_version(post.version);
//!
//! controller.update(PostUpdate::content("Edited draft"), true);
//! if controller.save_now().await {
//!     controller.set_dirty(false);
//! }
//! # }
//! ```

pub mod controller;
pub mod state;

pub use controller::{AutoSaveConfig, AutoSaveController, SaveError, SaveHandler};
pub use state::{AutoSaveState, AutoSaveStatus, TeardownCheck};
