//! # rowbridge client
//!
//! The database-client contract consumed by the rowbridge binding layer.
//!
//! This crate provides the lowest-level abstraction for rowbridge. A client
//! backend connects, executes a SQL string synchronously and hands back a
//! fully materialized [`ResultSet`]; the binding layer never sees a driver
//! type.
//!
//! ## Design Principles
//!
//! - Backends execute opaque SQL text; no parsing happens here
//! - Results are materialized eagerly into immutable [`Row`]s
//! - Cell values carry the client library's type tags ([`TypeTag`])
//! - Errors keep the driver's message text verbatim
//!
//! ## Available Backends
//!
//! - [`MemoryConnector`] - Scripted responses for testing
//! - [`SqliteSession`] - Embedded SQLite through `rusqlite` (feature `sqlite`)
//! - `MysqlSession` - MySQL server through the `mysql` crate (feature `mysql`)
//!
//! ## Example
//!
//! ```rust
//! use rowbridge_client::{ConnectOptions, Connector, MemoryConnector, NativeValue, ResultSet, Row};
//!
//! let connector = MemoryConnector::new().with_result(
//!     "SELECT 'hello'",
//!     ResultSet::new(vec!["greeting".into()], vec![Row::new(vec![NativeValue::from("hello")])]),
//! );
//! let options = ConnectOptions::parse("memory://demo").unwrap();
//! let mut session = connector.connect(&options).unwrap();
//! let result = session.execute("SELECT 'hello'").unwrap();
//! assert_eq!(result.count(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod memory;
#[cfg(feature = "mysql")]
mod mysql;
mod options;
mod row;
#[cfg(feature = "sqlite")]
mod sqlite;
mod value;

pub use backend::{Connector, NativeSession, StandardConnector};
pub use error::{ClientError, ClientResult};
pub use memory::{MemoryConnector, MemorySession};
#[cfg(feature = "mysql")]
pub use self::mysql::MysqlSession;
pub use options::{Backend, ConnectOptions, DEFAULT_MYSQL_PORT};
pub use row::{ResultSet, Row};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSession;
pub use value::{NativeValue, TypeTag};
