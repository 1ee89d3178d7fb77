//! Error types for quire.

use thiserror::Error;

/// Result type alias using quire's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for quire operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed connection parameters
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage could not be reached. The message carries the underlying cause.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement failed (wraps sqlx::Error)
    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),

    /// Caller-level misuse, rejected before any query is issued
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Wrap a driver error raised while establishing a connection.
    pub fn connection(cause: impl std::fmt::Display) -> Self {
        Error::Connection(format!("failed to connect to database: {}", cause))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("port must be a number".to_string());
        assert_eq!(err.to_string(), "Configuration error: port must be a number");
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("title cannot be empty".to_string());
        assert_eq!(err.to_string(), "Invalid input: title cannot be empty");
    }

    #[test]
    fn test_connection_error_keeps_cause() {
        let err = Error::connection("password authentication failed for user \"quire\"");
        let msg = err.to_string();
        assert!(msg.starts_with("Connection error:"));
        assert!(msg.contains("password authentication failed"));
    }

    #[test]
    fn test_from_sqlx_error() {
        let err: Error = sqlx::Error::RowNotFound.into();
        match err {
            Error::Query(sqlx::Error::RowNotFound) => {}
            other => panic!("Expected Query error, got {:?}", other),
        }
    }

    #[test]
    fn test_query_error_display_includes_source() {
        let err = Error::Query(sqlx::Error::Protocol("unexpected message".to_string()));
        assert!(err.to_string().starts_with("Query error:"));
        assert!(err.to_string().contains("unexpected message"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
