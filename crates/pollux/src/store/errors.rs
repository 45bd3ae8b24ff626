use chrono::{DateTime, Utc};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Errors that can occur during event store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sea-orm that fits no narrower category.
    #[error("Database error: {0}")]
    Database(DbErr),

    /// Uniqueness or foreign-key violation. The enclosing transaction is aborted.
    #[error("Constraint violation: {message}")]
    ConstraintViolation { message: String },

    /// Durable storage is unreachable or busy.
    #[error("Store unavailable: {message}")]
    Unavailable { message: String },

    /// Attempted to move a platform checkpoint backwards.
    #[error(
        "Checkpoint regression for platform {platform}: {attempted} is earlier than {current}"
    )]
    CheckpointRegression {
        platform: String,
        current: DateTime<Utc>,
        attempted: DateTime<Utc>,
    },

    /// Referenced row does not exist.
    #[error("Not found: {context}")]
    NotFound { context: String },

    /// Invalid input data.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl StoreError {
    /// Create a NotFound error for a platform lookup.
    pub fn platform_not_found(name: &str) -> Self {
        Self::NotFound {
            context: format!("platform={}", name),
        }
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Whether retrying the same operation later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(message))
            | Some(SqlErr::ForeignKeyConstraintViolation(message)) => {
                return Self::ConstraintViolation { message };
            }
            _ => {}
        }

        if is_unavailable_db_error(&err) {
            Self::Unavailable {
                message: err.to_string(),
            }
        } else {
            Self::Database(err)
        }
    }
}

fn is_unavailable_db_error(err: &DbErr) -> bool {
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => true,
        DbErr::Exec(_) | DbErr::Query(_) => {
            let err_str = err.to_string().to_lowercase();
            // SQLite: database is locked, busy
            // PostgreSQL: connection refused, too many connections
            err_str.contains("locked")
                || err_str.contains("busy")
                || err_str.contains("timeout")
                || err_str.contains("connection")
                || err_str.contains("temporarily unavailable")
        }
        _ => false,
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
