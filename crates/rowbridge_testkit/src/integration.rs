//! Cross-crate integration test helpers.
//!
//! Checks a host-facing [`RowWrapper`] against the native [`Row`] it was
//! built from, accessor by accessor.

use rowbridge_core::{marshal, Row, RowWrapper, ScalarValue};

/// Asserts that every accessor of `wrapper` agrees with `expected`.
///
/// Covers `colCount`, 1-based `get` and generic index, 0-based `type`,
/// `elementCount` and `at`, and the out-of-range behavior on both sides of
/// the row.
pub fn verify_row_accessors(wrapper: &RowWrapper, expected: &Row) {
    let count = i64::try_from(expected.col_count()).expect("row too wide");
    assert_eq!(wrapper.col_count().expect("col_count"), count);

    for (i, value) in expected.values().iter().enumerate() {
        let i = i64::try_from(i).expect("row too wide");
        let scalar = marshal(value);
        assert_same(&wrapper.get(i + 1).expect("get"), &scalar);
        assert_same(&wrapper.index(&(i + 1).into()).expect("index"), &scalar);
        assert_eq!(wrapper.type_code(i).expect("type"), value.type_tag().code());

        let elements = wrapper.element_count(i).expect("elementCount");
        assert_eq!(elements, i64::try_from(value.element_count()).expect("too many elements"));
        for j in 0..elements {
            let element = value.element(j).expect("element");
            assert_same(&wrapper.at(i, j).expect("at"), &marshal(element));
        }
        assert!(wrapper.at(i, elements).is_err());
    }

    for outside in [0, count + 1] {
        assert!(wrapper.get(outside).expect("get").is_null());
        assert!(wrapper.index(&outside.into()).expect("index").is_null());
    }
    assert!(wrapper.type_code(count).is_err());
    assert!(wrapper.element_count(-1).is_err());
}

/// Compares two scalars, treating NaN as equal to itself.
pub fn assert_same(actual: &ScalarValue, expected: &ScalarValue) {
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) if a.is_nan() && b.is_nan() => {}
        _ => assert_eq!(actual, expected),
    }
}
