use std::time::Duration;

use thiserror::Error;

use crate::platform::PlatformError;
use crate::store::StoreError;

/// Errors that end a sync cycle.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Fetching from the platform failed.
    #[error("Fetch failed: {0}")]
    Fetch(#[from] PlatformError),

    /// Reading or writing the store failed. Nothing of the batch was kept.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Another cycle for the same platform is still running.
    #[error("A sync cycle for {platform} is already in progress")]
    CycleInProgress { platform: String },

    /// The fetch phase exceeded the cycle timeout.
    #[error("Fetching {platform} timed out after {after:?}")]
    TimedOut { platform: String, after: Duration },

    /// The cycle was abandoned because of shutdown.
    #[error("Sync cycle cancelled")]
    Cancelled,

    /// The commit task panicked or was aborted.
    #[error("Commit task failed: {message}")]
    CommitTask { message: String },
}

impl SyncError {
    /// Whether the cycle should be retried with backoff.
    ///
    /// Transient fetch errors, an unavailable store and timeouts qualify.
    /// Constraint violations and checkpoint regressions do not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch(err) => err.is_transient(),
            Self::Store(err) => err.is_retryable(),
            Self::TimedOut { .. } => true,
            Self::CycleInProgress { .. } | Self::Cancelled | Self::CommitTask { .. } => false,
        }
    }
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_retryable_classification() {
        assert!(SyncError::from(PlatformError::network("reset")).is_retryable());
        assert!(
            SyncError::from(PlatformError::RateLimited {
                reset_at: Utc::now()
            })
            .is_retryable()
        );
        assert!(!SyncError::from(PlatformError::AuthRequired).is_retryable());

        assert!(
            SyncError::from(StoreError::Unavailable {
                message: "database is locked".to_string()
            })
            .is_retryable()
        );
        assert!(
            !SyncError::from(StoreError::ConstraintViolation {
                message: "UNIQUE".to_string()
            })
            .is_retryable()
        );
        assert!(
            !SyncError::from(StoreError::CheckpointRegression {
                platform: "github".to_string(),
                current: Utc::now(),
                attempted: Utc::now(),
            })
            .is_retryable()
        );

        assert!(
            SyncError::TimedOut {
                platform: "github".to_string(),
                after: Duration::from_secs(1)
            }
            .is_retryable()
        );
        assert!(
            !SyncError::CycleInProgress {
                platform: "github".to_string()
            }
            .is_retryable()
        );
        assert!(!SyncError::Cancelled.is_retryable());
    }
}
