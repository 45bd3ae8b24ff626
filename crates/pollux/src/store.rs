//! Durable storage for platforms, projects, actions and events.
//!
//! Every operation is generic over the connection type so the sync engine can
//! run it on a pooled connection or inside its batch transaction.

pub mod action;
mod errors;
pub mod event;
pub mod platform;
pub mod project;

pub use action::{canonical_action_name, resolve_or_create_action};
pub use errors::{Result, StoreError};
pub use event::{
    EventRecord, GitEventRecord, append_git_event, count_events, count_git_events,
    list_git_events,
};
pub use platform::{
    advance_checkpoint, delete_platform, find_platform, list_platforms, register_platform,
};
pub use project::{refresh_project_metadata, resolve_or_create_project};
