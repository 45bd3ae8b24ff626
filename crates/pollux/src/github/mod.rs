//! GitHub event source.
//!
//! Reads the public activity feed of one user (`GET /users/{user}/events`)
//! and turns it into [`RawActivity`](crate::platform::RawActivity) items.
//!
//! ```ignore
//! use pollux::github::GitHubClient;
//!
//! let client = GitHubClient::new("octocat")?.with_token(Some(token));
//! let result = client.fetch_since(None).await?;
//! ```

mod client;
mod convert;
mod types;

pub use client::{DEFAULT_MAX_PAGES, GitHubClient, LinkPagination, PLATFORM_NAME, parse_link_header};
pub use convert::{canonical_action, to_raw_activity, web_base_url};
pub use types::{DEFAULT_API_URL, GitHubEvent, GitHubEventPayload, GitHubEventRepo};
