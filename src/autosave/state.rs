use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Save status shown next to the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoSaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error,
    Conflict,
}

impl AutoSaveStatus {
    /// Whether a new edit returns the status to idle
    pub fn clears_on_edit(&self) -> bool {
        matches!(self, Self::Saved | Self::Error)
    }
}

impl fmt::Display for AutoSaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Saving => write!(f, "saving"),
            Self::Saved => write!(f, "saved"),
            Self::Error => write!(f, "error"),
            Self::Conflict => write!(f, "conflict"),
        }
    }
}

/// Auto-save state for one editing session, read-only outside the controller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoSaveState {
    pub status: AutoSaveStatus,
    pub last_saved_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub has_conflict: bool,
}

impl AutoSaveState {
    /// Local "HH:MM" of the last successful save
    pub fn last_saved_display(&self) -> Option<String> {
        self.last_saved_at
            .map(|at| at.with_timezone(&Local).format("%H:%M").to_string())
    }
}

/// Answer to "may the environment be torn down now?"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownCheck {
    Clear,
    /// Edits would be lost; the environment should warn the user
    UnsavedChanges,
}

impl TeardownCheck {
    pub fn needs_warning(&self) -> bool {
        matches!(self, Self::UnsavedChanges)
    }
}
