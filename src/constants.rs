//! # System Constants
//!
//! Default timeouts, retry parameters, quota sizes and event names shared by
//! the remote-call client, the batch orchestrator and the auto-save
//! controller. [`PlannerConfig::default`](crate::config::PlannerConfig) is
//! built from these values.

/// Lifecycle event names carried in structured log records
pub mod events {
    // Remote call events
    pub const REMOTE_CALL_STARTED: &str = "remote_call.started";
    pub const REMOTE_CALL_SUCCEEDED: &str = "remote_call.succeeded";
    pub const REMOTE_CALL_RETRYING: &str = "remote_call.retrying";
    pub const REMOTE_CALL_FAILED: &str = "remote_call.failed";

    // Batch lifecycle events
    pub const BATCH_STARTED: &str = "batch.started";
    pub const BATCH_ITEM_COMPLETED: &str = "batch.item_completed";
    pub const BATCH_ITEM_FAILED: &str = "batch.item_failed";
    pub const BATCH_CANCEL_REQUESTED: &str = "batch.cancel_requested";
    pub const BATCH_FINISHED: &str = "batch.finished";
    pub const BATCH_RESET: &str = "batch.reset";

    // Auto-save events
    pub const SAVE_STARTED: &str = "save.started";
    pub const SAVE_SUCCEEDED: &str = "save.succeeded";
    pub const SAVE_FAILED: &str = "save.failed";
    pub const SAVE_CONFLICT: &str = "save.conflict";
    pub const SAVE_DROPPED: &str = "save.dropped";
}

/// Operation names understood by the generation service
pub mod operations {
    pub const GENERATE_IDEAS: &str = "generate-ideas";
    pub const GENERATE_POST: &str = "generate-post";
    pub const GENERATE_VARIANTS: &str = "generate-variants";
    pub const CHECK_QUOTA: &str = "check-quota";
}

/// Retry defaults
pub mod retry {
    /// Attempts allowed beyond the first
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;
    pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;
    pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;
    /// Wait applied to a rate limit when the server names none
    pub const DEFAULT_RATE_LIMIT_RETRY_AFTER_SECS: u64 = 60;
}

/// Per-operation wall-clock deadlines, in milliseconds
pub mod timeouts {
    pub const GENERATE_IDEAS_MS: u64 = 120_000;
    pub const GENERATE_POST_MS: u64 = 60_000;
    pub const GENERATE_VARIANTS_MS: u64 = 60_000;
    pub const CHECK_QUOTA_MS: u64 = 5_000;
}

/// Idea generation limits
pub mod ideas {
    pub const DEFAULT_COUNT: u32 = 15;
    pub const MAX_COUNT: u32 = 20;
}

/// Auto-save defaults
pub mod auto_save {
    /// Quiet period after the last edit before a save fires
    pub const DEFAULT_DELAY_MS: u64 = 30_000;
}

/// System-wide constants
pub mod system {
    pub const PLANNER_CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

    /// Default configuration file name inside a configuration directory
    pub const CONFIG_FILE_NAME: &str = "planner-config.yaml";

    /// Environment used when none is set
    pub const DEFAULT_ENVIRONMENT: &str = "development";

    /// Environments a configuration file may carry override sections for
    pub const KNOWN_ENVIRONMENTS: &[&str] = &["development", "test", "production"];
}
