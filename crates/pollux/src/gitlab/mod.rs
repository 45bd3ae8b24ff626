//! GitLab event source.
//!
//! Reads the activity feed of one user (`GET /users/{id}/events`) on
//! gitlab.com or a self-hosted instance.
//!
//! ```ignore
//! use pollux::gitlab::GitLabClient;
//!
//! let client = GitLabClient::new("1234")?.with_token(Some(token));
//! let result = client.fetch_since(last_sync).await?;
//! ```

mod client;
mod convert;
mod types;

pub use client::{DEFAULT_MAX_PAGES, GitLabClient, PLATFORM_NAME};
pub use convert::{canonical_action, placeholder_project, to_raw_activity};
pub use types::{DEFAULT_HOST, GitLabEvent, GitLabProject, GitLabPushData};
