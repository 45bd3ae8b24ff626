//! Pollux - aggregates source-control activity into one event log.
//!
//! Activity of a user on several hosting platforms (GitHub, GitLab) is
//! polled periodically, normalized into canonical actions and appended to a
//! relational store together with a per-platform checkpoint.
//!
//! # Features
//!
//! - `migrate` - Enables database migration support. When enabled, you can use
//!   [`connect_and_migrate`] to automatically run migrations on connection.
//! - `github`, `gitlab` - HTTP event sources for the respective platforms.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use pollux::store::EventRecord;
//! use pollux::{connect_and_migrate, github::GitHubClient, sync::{PlatformSyncer, SyncOptions}};
//!
//! let db = Arc::new(connect_and_migrate("sqlite://pollux.db?mode=rwc").await?);
//! let github = GitHubClient::new("octocat")?.with_token(Some(token));
//!
//! let syncer = PlatformSyncer::new(Arc::clone(&db), Arc::new(github), SyncOptions::default());
//! let report = syncer.run_cycle(None).await?;
//!
//! for EventRecord::Git(event) in pollux::store::list_git_events(&*db, Some("github")).await? {
//!     println!("{} {} {}", event.timestamp, event.project_name, event.action);
//! }
//! ```

pub mod db;
pub mod entity;
pub mod http;
pub mod platform;
pub mod retry;
pub mod store;
pub mod sync;

#[cfg(feature = "github")]
pub mod github;

#[cfg(feature = "gitlab")]
pub mod gitlab;

#[cfg(feature = "migrate")]
pub mod migration;

pub use db::connect;
#[cfg(feature = "migrate")]
pub use db::connect_and_migrate;
pub use entity::prelude::*;
pub use platform::{
    ApiRateLimiter, EventSource, FetchResult, PlatformError, RawActivity, rate_limits,
};
pub use store::StoreError;
pub use sync::{CycleReport, PlatformSyncer, SyncError, SyncOptions, SyncScheduler};
