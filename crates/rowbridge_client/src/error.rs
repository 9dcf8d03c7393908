//! Error types for client operations.

use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised by a client backend.
///
/// The `Display` output of every variant is the message the binding layer
/// forwards to the host, so driver errors render exactly as the driver
/// reports them.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The connection string could not be parsed.
    #[error("invalid connection string: {message}")]
    InvalidConnectionString {
        /// What was wrong with it.
        message: String,
    },

    /// The requested backend is not compiled in or cannot serve the options.
    #[error("backend unavailable: {message}")]
    BackendUnavailable {
        /// Why the backend cannot be used.
        message: String,
    },

    /// A column index outside the row.
    #[error("column index {index} out of range (row has {count} columns)")]
    ColumnOutOfRange {
        /// The requested 0-based index.
        index: i64,
        /// The row's column count.
        count: usize,
    },

    /// An element index outside a cell's elements.
    #[error("element index {index} out of range (value has {count} elements)")]
    ElementOutOfRange {
        /// The requested 0-based index.
        index: i64,
        /// The cell's element count.
        count: usize,
    },

    /// Connection refused or lost.
    #[error("{message}")]
    Connection {
        /// Driver message.
        message: String,
    },

    /// The statement failed to execute.
    #[error("{message}")]
    Execution {
        /// Driver message.
        message: String,
    },

    /// SQLite driver error.
    #[cfg(feature = "sqlite")]
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),

    /// MySQL driver error.
    #[cfg(feature = "mysql")]
    #[error("{0}")]
    Mysql(#[from] mysql::Error),

    /// The session was closed.
    #[error("session is closed")]
    Closed,
}

impl ClientError {
    /// Creates an invalid connection string error.
    pub fn invalid_connection_string(message: impl Into<String>) -> Self {
        Self::InvalidConnectionString {
            message: message.into(),
        }
    }

    /// Creates a backend unavailable error.
    pub fn backend_unavailable(message: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates an execution error.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_messages_are_verbatim() {
        let err = ClientError::execution("Table 'test.nope' doesn't exist");
        assert_eq!(err.to_string(), "Table 'test.nope' doesn't exist");

        let err = ClientError::connection("Access denied for user 'root'@'localhost'");
        assert_eq!(err.to_string(), "Access denied for user 'root'@'localhost'");
    }

    #[test]
    fn out_of_range_messages() {
        let err = ClientError::ColumnOutOfRange { index: 5, count: 3 };
        assert_eq!(err.to_string(), "column index 5 out of range (row has 3 columns)");

        let err = ClientError::ElementOutOfRange { index: -1, count: 0 };
        assert_eq!(
            err.to_string(),
            "element index -1 out of range (value has 0 elements)"
        );
    }
}
