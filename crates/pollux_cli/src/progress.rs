//! Progress reporting for sync runs.
//!
//! Progress events from the library are rendered as structured log lines.

use pollux::sync::{ProgressCallback, SyncProgress};

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    /// Convert into a callback for the library.
    pub fn into_callback(self) -> ProgressCallback {
        Box::new(move |event| self.handle(event))
    }

    pub fn handle(&self, event: SyncProgress) {
        match event {
            SyncProgress::CycleStarted { platform, since } => match since {
                Some(since) => {
                    tracing::debug!(platform = %platform, since = %since, "Starting cycle")
                }
                None => tracing::info!(platform = %platform, "Starting full backfill"),
            },

            SyncProgress::Fetched {
                platform,
                count,
                not_modified,
            } => {
                if not_modified {
                    tracing::debug!(platform = %platform, "No changes");
                } else {
                    tracing::debug!(platform = %platform, count, "Fetched activity");
                }
            }

            SyncProgress::SkippedMalformed {
                platform,
                native_event_id,
                reason,
            } => {
                tracing::warn!(
                    platform = %platform,
                    native_event_id = %native_event_id,
                    reason = %reason,
                    "Skipped malformed item"
                );
            }

            SyncProgress::Committed {
                platform,
                inserted,
                checkpoint,
            } => {
                tracing::debug!(platform = %platform, inserted, checkpoint = %checkpoint, "Committed");
            }

            SyncProgress::CycleRetry {
                platform,
                retry_after_ms,
                attempt,
                error,
            } => {
                tracing::warn!(
                    platform = %platform,
                    retry_after_ms,
                    attempt,
                    error = %error,
                    "Cycle failed, backing off"
                );
            }

            SyncProgress::CycleComplete {
                platform,
                inserted,
                skipped,
            } => {
                if inserted > 0 {
                    tracing::info!(platform = %platform, inserted, skipped, "Ingested new events");
                } else {
                    tracing::debug!(platform = %platform, skipped, "Nothing new");
                }
            }

            SyncProgress::CycleFailed { platform, error } => {
                tracing::error!(platform = %platform, error = %error, "Cycle failed");
            }

            SyncProgress::Warning { message } => {
                tracing::warn!(message = %message, "Warning");
            }

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_accepts_every_event() {
        let callback = LoggingReporter::new().into_callback();
        callback(SyncProgress::CycleStarted {
            platform: "github".to_string(),
            since: None,
        });
        callback(SyncProgress::CycleFailed {
            platform: "gitlab".to_string(),
            error: "boom".to_string(),
        });
    }
}
