//! Synchronization of platform activity into the event store.
//!
//! # Module Structure
//!
//! - [`engine`] - `PlatformSyncer`: one cycle of fetch, filter and commit
//! - [`scheduler`] - `SyncScheduler`: one periodic task per platform
//! - [`normalize`] - validation, checkpoint filtering and de-duplication
//! - `progress` - progress reporting: `SyncProgress`, `ProgressCallback`, `emit()`
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use pollux::sync::{PlatformSyncer, SyncOptions};
//!
//! let syncer = PlatformSyncer::new(Arc::clone(&db), Arc::new(github), SyncOptions::default());
//! let report = syncer.run_cycle(None).await?;
//! println!("{} new events", report.inserted);
//! ```

mod commit;
pub mod engine;
mod errors;
pub mod normalize;
mod progress;
pub mod scheduler;
mod types;

pub use engine::PlatformSyncer;
pub use errors::{Result, SyncError};
pub use normalize::{CommittedKeys, DedupKey, MalformedItem, NormalizedActivity, PreparedBatch};
pub use progress::{ProgressCallback, SyncProgress, emit};
pub use scheduler::{PlatformRunStats, SyncScheduler};
pub use types::{CycleReport, PlatformOutcome, SyncOptions};

pub use types::{
    DEFAULT_CYCLE_TIMEOUT_SECS, DEFAULT_MAX_RETRIES, DEFAULT_SYNC_INTERVAL_SECS,
    INITIAL_BACKOFF_MS, MAX_BACKOFF_MS,
};
