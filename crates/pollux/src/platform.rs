//! Platform-agnostic event source abstraction.
//!
//! Every hosting platform is exposed to the sync engine as an [`EventSource`]
//! yielding [`RawActivity`] items. HTTP clients share the error taxonomy in
//! [`PlatformError`] and the conditional-fetch result type [`FetchResult`].
//!
//! ```ignore
//! use pollux::platform::{EventSource, FetchResult};
//!
//! async fn preview<S: EventSource>(source: &S) -> Result<usize, PlatformError> {
//!     match source.fetch_since(None).await? {
//!         FetchResult::NotModified => Ok(0),
//!         FetchResult::Fetched { data, .. } => Ok(data.len()),
//!     }
//! }
//! ```

mod conditional;
mod convert;
mod errors;
mod rate_limit;
mod types;

pub use conditional::{FetchResult, PaginationInfo};
pub use convert::{dotted_action, parse_timestamp, to_snake_case};
pub use errors::{PlatformError, Result};
pub use rate_limit::{ApiRateLimiter, rate_limits};
pub use types::{EventSource, RawActivity};
