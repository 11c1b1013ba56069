//! Errors raised while reading from the data store or reference files.

use thiserror::Error;

/// Failure to read dashboard data.
///
/// Every query is read-only, so callers may simply retry on the next
/// interaction; nothing here is retried automatically.
#[derive(Debug, Error)]
pub enum DataAccessError {
    /// The pool could not hand out a working connection.
    #[error("database connection error: {0}")]
    Connection(String),

    /// The database rejected or failed to execute a statement.
    #[error("query failed: {0}")]
    Query(String),

    /// A returned column did not match the expected Rust type.
    #[error("unexpected column type: {0}")]
    Decode(String),

    /// The venue reference file is missing or malformed.
    #[error("venue reference file {path}: {message}")]
    VenueFile { path: String, message: String },
}

impl From<sqlx::Error> for DataAccessError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Configuration(_) => Self::Connection(err.to_string()),
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::TypeNotFound { .. } => Self::Decode(err.to_string()),
            _ => Self::Query(err.to_string()),
        }
    }
}
