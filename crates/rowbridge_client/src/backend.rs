//! Client backend traits.

use crate::error::{ClientError, ClientResult};
use crate::options::{Backend, ConnectOptions};
use crate::row::ResultSet;

/// A live connection to a database.
///
/// Sessions execute opaque SQL text synchronously and return a fully
/// materialized [`ResultSet`]. They are owned by exactly one binding-layer
/// handle and may move between threads, but are never shared.
///
/// # Invariants
///
/// - `execute` returns rows in the order the server produced them
/// - A failed `execute` leaves the session usable
/// - `close` is idempotent
///
/// # Implementors
///
/// - [`super::MemorySession`] - For testing
/// - [`super::SqliteSession`] - Embedded SQLite
/// - `MysqlSession` - MySQL server (feature `mysql`)
pub trait NativeSession: Send {
    /// Executes one statement and materializes its result.
    ///
    /// Statements that produce no result columns (DDL, DML) return an empty
    /// result carrying the affected-row count.
    ///
    /// # Errors
    ///
    /// Returns the driver's error when the statement fails.
    fn execute(&mut self, sql: &str) -> ClientResult<ResultSet>;

    /// Releases the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver reports a failure while closing.
    fn close(&mut self) -> ClientResult<()> {
        Ok(())
    }
}

/// Opens sessions.
pub trait Connector: Send + Sync {
    /// Connects using the given options.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend is unavailable or the connection
    /// fails.
    fn connect(&self, options: &ConnectOptions) -> ClientResult<Box<dyn NativeSession>>;
}

/// Routes connections to the backends compiled into this build.
///
/// `memory://` needs a scripted [`super::MemoryConnector`] and is rejected
/// here.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardConnector;

impl StandardConnector {
    /// Creates the connector.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Connector for StandardConnector {
    fn connect(&self, options: &ConnectOptions) -> ClientResult<Box<dyn NativeSession>> {
        match options.backend {
            #[cfg(feature = "sqlite")]
            Backend::Sqlite => Ok(Box::new(crate::sqlite::SqliteSession::open(options)?)),
            #[cfg(feature = "mysql")]
            Backend::Mysql => Ok(Box::new(crate::mysql::MysqlSession::open(options)?)),
            Backend::Memory => Err(ClientError::backend_unavailable(
                "memory:// sessions need a scripted MemoryConnector",
            )),
            #[allow(unreachable_patterns)]
            other => Err(ClientError::backend_unavailable(format!(
                "{} support is not compiled in",
                other.scheme()
            ))),
        }
    }
}
