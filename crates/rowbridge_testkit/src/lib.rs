//! # rowbridge testkit
//!
//! Test utilities for rowbridge.
//!
//! This crate provides:
//! - A scripted memory connector with canned queries
//! - Registered bridges and temporary SQLite databases
//! - Property-based generators for cell values and rows
//! - Accessor-by-accessor row checks for integration tests
//!
//! ## Usage
//!
//! ```rust
//! use rowbridge_testkit::prelude::*;
//!
//! with_session(|_, session| {
//!     let rows = session.sql(queries::HELLO).unwrap();
//!     assert_eq!(rows[0].col_count().unwrap(), 1);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
