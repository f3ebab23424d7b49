use thiserror::Error;

use crate::autosave::SaveError;
use crate::config::ConfigurationError;
use crate::orchestration::BatchError;
use crate::persistence::StoreError;
use crate::resilience::ClassifiedError;

/// Crate-level error aggregating every component's failure type
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("Remote call error: {0}")]
    RemoteCall(#[from] ClassifiedError),
    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),
    #[error("Save error: {0}")]
    Save(#[from] SaveError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

impl PlannerError {
    /// Whether retrying the same operation later may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RemoteCall(error) => error.is_retryable(),
            Self::Save(SaveError::Failed(_)) | Self::Store(StoreError::Unavailable(_)) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;
