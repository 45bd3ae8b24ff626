use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::http::{HttpError, HttpResponse};

/// Errors that can occur when fetching activity from a platform.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// API error from the platform.
    #[error("API error: {message}")]
    Api { message: String },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded. Resets at {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },

    /// Authentication required or failed.
    #[error("Authentication required")]
    AuthRequired,

    /// Resource not found (user, project, etc.).
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// Network, connection or server-side error.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Response body did not match the expected shape.
    #[error("Failed to decode response: {message}")]
    Deserialize { message: String },

    /// Unexpected/internal error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PlatformError {
    /// Create an API error.
    #[inline]
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a not found error.
    #[inline]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a network error.
    #[inline]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a deserialization error.
    #[inline]
    pub fn deserialize(message: impl Into<String>) -> Self {
        Self::Deserialize {
            message: message.into(),
        }
    }

    /// Create an internal error.
    #[inline]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this error is a rate limit error.
    #[inline]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Whether a later attempt may succeed without intervention
    /// (rate limiting, network failures and 5xx responses).
    #[inline]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Network { .. })
    }

    /// Classify a non-success response.
    ///
    /// Returns `None` for 2xx and 304 responses.
    pub fn from_response(response: &HttpResponse, resource: &str) -> Option<Self> {
        let status = response.status;
        if (200..300).contains(&status) || status == 304 {
            return None;
        }

        let err = match status {
            401 | 403 if rate_limit_exhausted(response) => Self::RateLimited {
                reset_at: rate_limit_reset(response),
            },
            401 | 403 => Self::AuthRequired,
            404 => Self::not_found(resource),
            429 => Self::RateLimited {
                reset_at: rate_limit_reset(response),
            },
            500..=599 => Self::network(format!(
                "{} returned {}: {}",
                resource,
                status,
                short_body(response)
            )),
            _ => Self::api(format!(
                "{} returned {}: {}",
                resource,
                status,
                short_body(response)
            )),
        };
        Some(err)
    }
}

impl From<HttpError> for PlatformError {
    fn from(err: HttpError) -> Self {
        Self::network(err.to_string())
    }
}

impl From<serde_json::Error> for PlatformError {
    fn from(err: serde_json::Error) -> Self {
        Self::deserialize(err.to_string())
    }
}

fn rate_limit_exhausted(response: &HttpResponse) -> bool {
    response
        .header("x-ratelimit-remaining")
        .and_then(|v| v.trim().parse::<u64>().ok())
        == Some(0)
}

/// Reset time from `x-ratelimit-reset` (epoch seconds), else one minute from now.
fn rate_limit_reset(response: &HttpResponse) -> DateTime<Utc> {
    response
        .header("x-ratelimit-reset")
        .and_then(|v| v.trim().parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(|| Utc::now() + chrono::Duration::minutes(1))
}

fn short_body(response: &HttpResponse) -> String {
    let text = response.body_text();
    let line = text.lines().next().unwrap_or_default();
    line.chars().take(200).collect()
}

/// Result type for platform operations.
pub type Result<T> = std::result::Result<T, PlatformError>;
