//! Progress reporting for sync cycles.
//!
//! The engine emits [`SyncProgress`] events through an optional callback;
//! the CLI renders them as log lines.

use chrono::{DateTime, Utc};

/// Progress events emitted during sync cycles.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SyncProgress {
    /// A cycle started.
    CycleStarted {
        platform: String,
        /// Checkpoint the fetch starts from (`None` = full backfill).
        since: Option<DateTime<Utc>>,
    },

    /// The source returned its items.
    Fetched {
        platform: String,
        /// Number of raw items.
        count: usize,
        /// The source reported no changes.
        not_modified: bool,
    },

    /// An item failed validation and was skipped.
    SkippedMalformed {
        platform: String,
        native_event_id: String,
        reason: String,
    },

    /// A batch and its checkpoint were committed.
    Committed {
        platform: String,
        inserted: usize,
        checkpoint: DateTime<Utc>,
    },

    /// The cycle failed transiently and will be retried.
    CycleRetry {
        platform: String,
        /// Time to wait before retry (ms).
        retry_after_ms: u64,
        /// Current attempt number.
        attempt: u32,
        error: String,
    },

    /// The cycle finished.
    CycleComplete {
        platform: String,
        inserted: usize,
        skipped: usize,
    },

    /// The cycle failed; the checkpoint was not moved.
    CycleFailed { platform: String, error: String },

    /// Warning message (non-fatal).
    Warning { message: String },
}

/// Callback for progress updates during sync cycles.
pub type ProgressCallback = Box<dyn Fn(SyncProgress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: SyncProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}
