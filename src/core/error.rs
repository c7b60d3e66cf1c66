//! Typed errors for scenario queries
//!
//! Three kinds of failure reach a caller:
//!
//! - [`QueryError::InvalidSort`]: rejected input, no statement was issued
//! - [`QueryError::Storage`]: a connection, statement or scan failure from
//!   either round trip, with the driver error kept as the source
//! - [`QueryError::Unsupported`]: the skip signal of strategies that do not
//!   implement a scenario; not a fault
//!
//! Cancellation surfaces as [`QueryError::Cancelled`].
//!
//! # Example
//!
//! ```rust,ignore
//! match repo.query_dashboard(&ctx, &params).await {
//!     Ok(movies) => println!("{} movies", movies.len()),
//!     Err(err) if err.is_skip() => println!("skipped"),
//!     Err(QueryError::InvalidSort { key }) => eprintln!("bad sort {key}"),
//!     Err(err) => return Err(err.into()),
//! }
//! ```

use crate::core::repository::Scenario;
use thiserror::Error;

/// Boxed driver error carried as a `source`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type of every repository operation.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The dashboard sort key is not one of the allow-listed columns
    #[error("invalid sort: {key:?}")]
    InvalidSort { key: String },

    /// The strategy deliberately does not implement this scenario
    #[error("{scenario} is not supported by strategy '{strategy}'")]
    Unsupported { strategy: String, scenario: Scenario },

    /// The invocation's cancellation token fired before a round trip finished
    #[error("query cancelled")]
    Cancelled,

    /// Store failure, propagated unchanged
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl QueryError {
    /// True for the skip signal, which callers must not treat as a failure.
    pub fn is_skip(&self) -> bool {
        matches!(self, QueryError::Unsupported { .. })
    }

    /// Stable code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            QueryError::InvalidSort { .. } => "INVALID_SORT",
            QueryError::Unsupported { .. } => "UNSUPPORTED",
            QueryError::Cancelled => "CANCELLED",
            QueryError::Storage(_) => "STORAGE_ERROR",
        }
    }
}

/// Errors raised by a store adapter
#[derive(Debug, Error)]
pub enum StorageError {
    /// Could not reach or authenticate against the store
    #[error("failed to connect to {backend}: {source}")]
    Connection {
        backend: &'static str,
        #[source]
        source: BoxError,
    },

    /// Statement preparation or execution failed
    #[error("{backend} query error: {source}")]
    Query {
        backend: &'static str,
        #[source]
        source: BoxError,
    },

    /// A column could not be read into its field
    #[error("{backend} failed to decode column '{column}': {source}")]
    Decode {
        backend: &'static str,
        column: &'static str,
        #[source]
        source: BoxError,
    },

    /// The backend cannot bind this kind of value
    #[error("{backend} cannot bind a {kind} value")]
    UnsupportedBind {
        backend: &'static str,
        kind: &'static str,
    },
}

impl StorageError {
    pub fn query(backend: &'static str, source: impl Into<BoxError>) -> Self {
        StorageError::Query {
            backend,
            source: source.into(),
        }
    }

    pub fn decode(backend: &'static str, column: &'static str, source: impl Into<BoxError>) -> Self {
        StorageError::Decode {
            backend,
            column,
            source: source.into(),
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            StorageError::Connection { backend, .. }
            | StorageError::Query { backend, .. }
            | StorageError::Decode { backend, .. }
            | StorageError::UnsupportedBind { backend, .. } => backend,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_invalid_sort_message() {
        let err = QueryError::InvalidSort {
            key: "budget".to_string(),
        };
        assert_eq!(err.to_string(), "invalid sort: \"budget\"");
        assert_eq!(err.error_code(), "INVALID_SORT");
        assert!(!err.is_skip());
    }

    #[test]
    fn test_unsupported_is_skip() {
        let err = QueryError::Unsupported {
            strategy: "static".to_string(),
            scenario: Scenario::Dashboard,
        };
        assert!(err.is_skip());
        assert_eq!(err.error_code(), "UNSUPPORTED");
        assert!(err.to_string().contains("dashboard"));
        assert!(err.to_string().contains("static"));
    }

    #[test]
    fn test_storage_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: QueryError = StorageError::query("PostgreSQL", io).into();
        assert_eq!(err.error_code(), "STORAGE_ERROR");
        assert!(err.to_string().contains("PostgreSQL"));

        let QueryError::Storage(storage) = &err else {
            panic!("expected storage error");
        };
        assert_eq!(storage.backend(), "PostgreSQL");
        assert_eq!(storage.source().map(|s| s.to_string()), Some("refused".to_string()));
    }

    #[test]
    fn test_decode_error_names_column() {
        let err = StorageError::decode("MySQL", "added_at", "bad date");
        assert!(err.to_string().contains("added_at"));
    }
}
