//! # Auto-Save Controller
//!
//! Debounced saving of an editing session with optimistic-lock conflict
//! detection.
//!
//! The caller reports every change through [`AutoSaveController::update`]
//! together with its own dirty flag. While enabled and dirty, each update
//! re-arms a single debounce timer; the save fires only once the timer
//! elapses without another change. [`AutoSaveController::save_now`] skips the
//! timer.
//!
//! At most one save runs at a time. A trigger that arrives while a save is in
//! flight is dropped and reported as failed. A save that has started always
//! runs to completion: the timer hands it off to its own task before
//! returning, so re-arming or tearing down never cancels it.
//!
//! Conflict detection belongs to the [`SaveHandler`], which receives the last
//! version token the controller saw from the server.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::autosave::state::{AutoSaveState, AutoSaveStatus, TeardownCheck};
use crate::constants::{auto_save, events};
use crate::logging::log_save_operation;
use crate::models::post::VersionToken;

/// Failure reported by a [`SaveHandler`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveError {
    /// The stored version is newer than the expected one
    #[error("Version conflict: {0}")]
    Conflict(String),
    #[error("Save failed: {0}")]
    Failed(String),
}

/// Persists the session's data
#[async_trait]
pub trait SaveHandler<T>: Send + Sync {
    /// Save `data`, checking against `expected` when known
    ///
    /// `Ok(Some(token))` is the new server version. `Ok(None)` counts as a
    /// failed save.
    async fn save(
        &self,
        data: &T,
        expected: Option<&VersionToken>,
    ) -> Result<Option<VersionToken>, SaveError>;
}

/// Auto-save settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoSaveConfig {
    /// Quiet period before a save fires, in milliseconds
    pub delay_ms: u64,
    pub enabled: bool,
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            delay_ms: auto_save::DEFAULT_DELAY_MS,
            enabled: true,
        }
    }
}

impl AutoSaveConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SaveTrigger {
    Timer,
    Manual,
}

impl SaveTrigger {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Timer => "timer",
            Self::Manual => "manual",
        }
    }
}

struct Inner<T> {
    handler: Arc<dyn SaveHandler<T>>,
    delay: Duration,
    enabled: AtomicBool,
    dirty: AtomicBool,
    in_flight: AtomicBool,
    data: Mutex<Option<T>>,
    server_version: Mutex<Option<VersionToken>>,
    timer: Mutex<Option<JoinHandle<()>>>,
    state_tx: watch::Sender<AutoSaveState>,
}

impl<T> Inner<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn state(&self) -> AutoSaveState {
        self.state_tx.borrow().clone()
    }

    fn should_autosave(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
            && self.dirty.load(Ordering::Acquire)
            && self.state().status != AutoSaveStatus::Conflict
    }

    fn disarm(&self) {
        if let Some(timer) = self.timer.lock().take() {
            timer.abort();
        }
    }

    async fn perform_save(&self, trigger: SaveTrigger) -> bool {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(
                trigger = trigger.as_str(),
                event = events::SAVE_DROPPED,
                "Save already in flight, request dropped"
            );
            return false;
        }

        let Some(data) = self.data.lock().clone() else {
            self.in_flight.store(false, Ordering::Release);
            debug!(trigger = trigger.as_str(), "Nothing to save yet");
            return false;
        };
        let expected = *self.server_version.lock();

        self.state_tx.send_modify(|state| state.status = AutoSaveStatus::Saving);
        log_save_operation(
            events::SAVE_STARTED,
            trigger.as_str(),
            expected.map(|v| v.revision),
            None,
        );

        let outcome = self.handler.save(&data, expected.as_ref()).await;

        let saved = match outcome {
            Ok(Some(version)) => {
                *self.server_version.lock() = Some(version);
                self.state_tx.send_modify(|state| {
                    state.status = AutoSaveStatus::Saved;
                    state.last_saved_at = Some(Utc::now());
                    state.last_error = None;
                    state.has_conflict = false;
                });
                log_save_operation(
                    events::SAVE_SUCCEEDED,
                    "saved",
                    Some(version.revision),
                    None,
                );
                true
            }
            Ok(None) => {
                self.record_failure("Save returned no version".to_string());
                false
            }
            Err(SaveError::Conflict(message)) => {
                warn!(
                    expected_revision = expected.map(|v| v.revision),
                    event = events::SAVE_CONFLICT,
                    "Save rejected: the stored version changed since it was loaded"
                );
                self.state_tx.send_modify(|state| {
                    state.status = AutoSaveStatus::Conflict;
                    state.has_conflict = true;
                    state.last_error = Some(message);
                });
                false
            }
            Err(SaveError::Failed(message)) => {
                self.record_failure(message);
                false
            }
        };

        self.in_flight.store(false, Ordering::Release);
        saved
    }

    fn record_failure(&self, message: String) {
        warn!(error = %message, event = events::SAVE_FAILED, "Auto-save failed");
        self.state_tx.send_modify(|state| {
            state.status = AutoSaveStatus::Error;
            state.last_error = Some(message);
        });
    }
}

/// Debounced auto-save for one editing session
///
/// Must be used from within a tokio runtime. Dropping the controller clears
/// the debounce timer.
pub struct AutoSaveController<T> {
    inner: Arc<Inner<T>>,
}

impl<T> std::fmt::Debug for AutoSaveController<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoSaveController")
            .field("delay", &self.inner.delay)
            .field("enabled", &self.inner.enabled.load(Ordering::Acquire))
            .field("dirty", &self.inner.dirty.load(Ordering::Acquire))
            .field("state", &*self.inner.state_tx.borrow())
            .finish()
    }
}

impl<T> AutoSaveController<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(handler: Arc<dyn SaveHandler<T>>, config: &AutoSaveConfig) -> Self {
        let (state_tx, _) = watch::channel(AutoSaveState::default());
        Self {
            inner: Arc::new(Inner {
                handler,
                delay: config.delay(),
                enabled: AtomicBool::new(config.enabled),
                dirty: AtomicBool::new(false),
                in_flight: AtomicBool::new(false),
                data: Mutex::new(None),
                server_version: Mutex::new(None),
                timer: Mutex::new(None),
                state_tx,
            }),
        }
    }

    /// Controller for a record whose current server version is known
    #[must_use]
    pub fn with_server_version(self, version: VersionToken) -> Self {
        *self.inner.server_version.lock() = Some(version);
        self
    }

    pub fn state(&self) -> AutoSaveState {
        self.inner.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<AutoSaveState> {
        self.inner.state_tx.subscribe()
    }

    pub fn server_version(&self) -> Option<VersionToken> {
        *self.inner.server_version.lock()
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.load(Ordering::Acquire)
    }

    pub fn is_saving(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::Acquire)
    }

    pub fn last_saved_display(&self) -> Option<String> {
        self.state().last_saved_display()
    }

    /// Report the current data and the caller's dirty flag
    pub fn update(&self, data: T, dirty: bool) {
        *self.inner.data.lock() = Some(data);
        self.inner.dirty.store(dirty, Ordering::Release);

        if dirty {
            self.inner.state_tx.send_if_modified(|state| {
                if state.status.clears_on_edit() {
                    state.status = AutoSaveStatus::Idle;
                    true
                } else {
                    false
                }
            });
        }

        self.reset_timer();
    }

    /// Update the dirty flag alone, e.g. after the caller saw a save succeed
    pub fn set_dirty(&self, dirty: bool) {
        self.inner.dirty.store(dirty, Ordering::Release);
        if !dirty {
            self.inner.disarm();
        }
    }

    /// Re-arm the debounce timer, or clear it when no save is due
    pub fn reset_timer(&self) {
        if !self.inner.should_autosave() {
            self.inner.disarm();
            return;
        }

        let weak: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        let delay = self.inner.delay;

        let mut slot = self.inner.timer.lock();
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if !inner.should_autosave() {
                return;
            }
            // Detached so that re-arming cannot cancel a started save
            tokio::spawn(async move {
                inner.perform_save(SaveTrigger::Timer).await;
            });
        }));
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.inner.enabled.store(enabled, Ordering::Release);
        self.reset_timer();
    }

    /// Save immediately; `false` when the save failed or another was in flight
    pub async fn save_now(&self) -> bool {
        if self.inner.in_flight.load(Ordering::Acquire) {
            debug!(event = events::SAVE_DROPPED, "Manual save dropped, save in flight");
            return false;
        }
        self.inner.disarm();
        self.inner.perform_save(SaveTrigger::Manual).await
    }

    /// Adopt a freshly loaded server version unless a conflict is pending
    pub fn set_server_version(&self, version: VersionToken) -> bool {
        if self.state().has_conflict {
            return false;
        }
        *self.inner.server_version.lock() = Some(version);
        true
    }

    /// Accept the remote version; no save is performed
    ///
    /// The local edits are not saved over the accepted version. The timer
    /// stays disarmed until the next dirty [`update`](Self::update) or an
    /// explicit [`save_now`](Self::save_now).
    pub fn resolve_conflict(&self, remote_version: VersionToken) {
        self.inner.disarm();
        *self.inner.server_version.lock() = Some(remote_version);
        self.inner.state_tx.send_modify(|state| {
            state.status = AutoSaveStatus::Idle;
            state.has_conflict = false;
            state.last_error = None;
        });
        log_save_operation(
            events::SAVE_CONFLICT,
            "resolved",
            Some(remote_version.revision),
            None,
        );
    }

    /// Return a saved or failed status to idle
    pub fn acknowledge(&self) {
        self.inner.state_tx.send_if_modified(|state| {
            if state.status.clears_on_edit() {
                state.status = AutoSaveStatus::Idle;
                true
            } else {
                false
            }
        });
    }

    /// Whether tearing the environment down now would lose edits
    pub fn teardown_check(&self) -> TeardownCheck {
        if self.is_dirty() {
            TeardownCheck::UnsavedChanges
        } else {
            TeardownCheck::Clear
        }
    }

    /// Clear the debounce timer and report unsaved edits
    pub fn shutdown(&self) -> TeardownCheck {
        self.inner.disarm();
        let check = self.teardown_check();
        if check.needs_warning() {
            warn!("Auto-save controller torn down with unsaved changes");
        }
        check
    }
}

impl<T> Drop for AutoSaveController<T> {
    fn drop(&mut self) {
        if let Some(timer) = self.inner.timer.lock().take() {
            timer.abort();
        }
    }
}
