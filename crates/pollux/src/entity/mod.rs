//! SeaORM entity definitions for the pollux database schema.

pub mod action;
pub mod event;
pub mod git_event;
pub mod platform;
pub mod prelude;
pub mod project;
