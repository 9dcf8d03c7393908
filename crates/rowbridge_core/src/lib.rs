//! # rowbridge core
//!
//! Host-agnostic binding layer that exposes a SQL client to a dynamic host
//! language.
//!
//! This crate provides:
//! - Kind registration (`Session`, `Row`) with per-kind operation tables
//! - Generation-checked handles so released objects are detected, not
//!   dereferenced
//! - Argument validation with host-style error messages
//! - A single native → host value conversion table
//! - Panic containment around every client-library call
//!
//! Host adapters (the Python extension, the CLI) sit on top of [`Bridge`],
//! [`SessionWrapper`] and [`RowWrapper`] and only translate values and
//! errors into their own representation.
//!
//! ## Example
//!
//! ```rust
//! use rowbridge_core::{Bridge, KindTable, MemoryConnector, NativeValue, ResultSet, Row, ScalarValue};
//!
//! let connector = MemoryConnector::new().with_result(
//!     "SELECT 'hello'",
//!     ResultSet::new(vec!["s".into()], vec![Row::new(vec![NativeValue::from("hello")])]),
//! );
//! let bridge = Bridge::new(connector);
//! bridge.init(&mut KindTable::new()).unwrap();
//!
//! let session = bridge.open_session(&["memory://demo".into()]).unwrap();
//! let rows = session.sql("SELECT 'hello'").unwrap();
//! assert_eq!(rows[0].get(1).unwrap(), ScalarValue::Str(b"hello".to_vec()));
//! assert!(rows[0].get(2).unwrap().is_null());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod guard;
mod handle;
mod marshal;
mod registry;
mod row;
mod session;

pub use config::BridgeConfig;
pub use error::{BridgeError, BridgeResult, HostErrorClass};
pub use guard::guarded;
pub use handle::{Handle, HandleTable, Resource, SharedSession};
pub use marshal::{
    expect_integer, expect_string, marshal, HostArg, IndexBase, ScalarValue, MAX_SAFE_INTEGER,
};
pub use registry::{
    descriptor, init, kinds, HostRegistry, Kind, KindDescriptor, KindTable, Operation, ROW,
    SESSION,
};
pub use row::RowWrapper;
pub use session::{Bridge, QueryResult, SessionWrapper};

pub use rowbridge_client::{
    Backend, ClientError, ConnectOptions, Connector, MemoryConnector, NativeSession, NativeValue,
    ResultSet, Row, StandardConnector, TypeTag,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
