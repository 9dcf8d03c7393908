//! Property-based test generators using proptest.
//!
//! Provides strategies for generating cell values and rows in every shape
//! the client library can hand back.

use proptest::prelude::*;
use rowbridge_core::{NativeValue, Row};

/// Strategy for scalar cells, NULL included.
pub fn scalar_value_strategy() -> impl Strategy<Value = NativeValue> {
    prop_oneof![
        Just(NativeValue::Null),
        any::<u64>().prop_map(NativeValue::UInt64),
        any::<i64>().prop_map(NativeValue::Int64),
        any::<f32>().prop_map(NativeValue::Float),
        any::<f64>().prop_map(NativeValue::Double),
        any::<bool>().prop_map(NativeValue::Bool),
        prop::collection::vec(any::<u8>(), 0..32).prop_map(NativeValue::String),
        prop::collection::vec(any::<u8>(), 0..32).prop_map(NativeValue::Raw),
    ]
}

/// Strategy for any cell, including nested arrays and documents.
pub fn native_value_strategy() -> impl Strategy<Value = NativeValue> {
    scalar_value_strategy().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(NativeValue::Array),
            prop::collection::vec(("[a-z]{1,8}", inner), 0..4).prop_map(NativeValue::Document),
        ]
    })
}

/// Strategy for rows of up to `max_columns` cells.
pub fn row_strategy(max_columns: usize) -> impl Strategy<Value = Row> {
    prop::collection::vec(native_value_strategy(), 0..=max_columns).prop_map(Row::new)
}

/// Strategy for small result sets.
pub fn rows_strategy() -> impl Strategy<Value = Vec<Row>> {
    (0usize..6).prop_flat_map(|width| prop::collection::vec(row_strategy(width), 0..5))
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
