//! End-to-end behavior of the binding layer over the scripted connector.

use rowbridge_core::{BridgeError, ClientError, HostArg, Kind, KindTable, ScalarValue, TypeTag};
use rowbridge_testkit::prelude::*;

fn args(parts: &[&str]) -> Vec<HostArg> {
    parts.iter().map(|p| HostArg::from(*p)).collect()
}

#[test]
fn hello_row() {
    with_session(|_, session| {
        let rows = session.sql(queries::HELLO).unwrap();
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        let hello = ScalarValue::Str(b"hello".to_vec());
        assert_eq!(row.get(1).unwrap(), hello);
        assert_eq!(row.index(&HostArg::Int(1)).unwrap(), hello);
        assert_eq!(row.type_code(0).unwrap(), TypeTag::String.code());
        assert_eq!(row.col_count().unwrap(), 1);
    });
}

#[test]
fn null_cell_is_absent_but_typed() {
    with_session(|_, session| {
        let rows = session.sql(queries::NULL).unwrap();
        let row = &rows[0];
        assert!(row.get(1).unwrap().is_null());
        assert!(row.index(&HostArg::Int(1)).unwrap().is_null());
        assert_eq!(row.type_code(0).unwrap(), TypeTag::Null.code());
        assert_eq!(row.element_count(0).unwrap(), 0);
    });
}

#[test]
fn zero_row_select_is_empty() {
    with_session(|_, session| {
        assert!(session.sql(queries::EMPTY).unwrap().is_empty());
        assert!(session.sql(queries::CREATE).unwrap().is_empty());
    });
}

#[test]
fn every_row_reports_its_width() {
    with_session(|_, session| {
        for row in session.sql(queries::ONE_TWO_THREE).unwrap() {
            assert_eq!(row.col_count().unwrap(), 3);
            assert_eq!(
                row.values().unwrap(),
                vec![ScalarValue::Int(1), ScalarValue::Int(2), ScalarValue::Int(3)]
            );
        }
    });
}

#[test]
fn rows_come_back_in_order() {
    with_session(|_, session| {
        let values: Vec<ScalarValue> = session
            .sql(queries::THREE_ROWS)
            .unwrap()
            .iter()
            .map(|row| row.get(1).unwrap())
            .collect();
        assert_eq!(
            values,
            vec![ScalarValue::Int(1), ScalarValue::Int(2), ScalarValue::Int(3)]
        );
    });
}

// Regression: a scalar column has exactly one element, itself.
#[test]
fn scalar_sub_elements() {
    with_session(|_, session| {
        let row = &session.sql(queries::ONE_TWO_THREE).unwrap()[0];
        assert_eq!(row.element_count(1).unwrap(), 1);
        assert_eq!(row.at(1, 0).unwrap(), ScalarValue::Int(2));

        let err = row.at(1, 1).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Native(ClientError::ElementOutOfRange { index: 1, count: 1 })
        ));
    });
}

#[test]
fn nested_cells() {
    with_session(|_, session| {
        let row = &session.sql(queries::NESTED).unwrap()[0];
        assert!(row.get(1).unwrap().is_null());
        assert!(row.get(2).unwrap().is_null());
        assert_eq!(row.type_code(0).unwrap(), TypeTag::Array.code());
        assert_eq!(row.type_code(1).unwrap(), TypeTag::Document.code());

        assert_eq!(row.element_count(0).unwrap(), 3);
        assert_eq!(row.at(0, 0).unwrap(), ScalarValue::Int(1));
        assert_eq!(row.at(0, 1).unwrap(), ScalarValue::Str(b"two".to_vec()));
        assert!(row.at(0, 2).unwrap().is_null());

        assert_eq!(row.element_count(1).unwrap(), 2);
        assert_eq!(row.at(1, 1).unwrap(), ScalarValue::Int(2));
    });
}

#[test]
fn raw_and_binary_cells() {
    with_session(|_, session| {
        let row = &session.sql(queries::RAW).unwrap()[0];
        assert!(row.get(1).unwrap().is_null());
        assert_eq!(row.type_code(0).unwrap(), TypeTag::Raw.code());
        assert_eq!(row.get(2).unwrap(), ScalarValue::Str(vec![0x00, 0xff]));
    });
}

#[test]
fn large_integers_keep_their_value() {
    with_session(|_, session| {
        let row = &session.sql(queries::LARGE_INTEGERS).unwrap()[0];
        let unsigned = row.get(1).unwrap();
        assert_eq!(unsigned, ScalarValue::UInt(u64::MAX));
        assert!(unsigned.exceeds_safe_integer());
        assert!(row.get(2).unwrap().exceeds_safe_integer());
    });
}

#[test]
fn malformed_connection_string() {
    let test_bridge = TestBridge::new();
    for uri in ["", "localhost", "ftp://host", "mysql://:3306", "mysql://host:port"] {
        let err = test_bridge.open_session(&args(&[uri])).unwrap_err();
        assert!(
            matches!(err, BridgeError::Native(ClientError::InvalidConnectionString { .. })),
            "{uri}: {err}"
        );
    }
    assert_eq!(test_bridge.connector.open_sessions(), 0);
    assert_eq!(test_bridge.live_handles(), 0);
}

#[test]
fn argument_counts() {
    let test_bridge = TestBridge::new();

    let err = test_bridge.open_session(&args(&["a", "b"])).unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid number of arguments: expected 1 or 4, got 2"
    );

    // Four arguments reach the connector, which has no MySQL backend.
    let err = test_bridge
        .open_session(&args(&["localhost", "root", "", "test"]))
        .unwrap_err();
    assert!(err.is_native());
    assert_eq!(test_bridge.connector.open_sessions(), 0);
}

#[test]
fn argument_types_are_checked_before_connecting() {
    let test_bridge = TestBridge::new();
    let err = test_bridge
        .open_session(&[HostArg::Nil])
        .unwrap_err();
    assert!(matches!(
        err,
        BridgeError::ArgumentType {
            position: 1,
            expected: "string",
            ..
        }
    ));
    assert!(test_bridge.connector.executed().is_empty());
}

#[test]
fn native_errors_keep_their_message() {
    with_session(|test_bridge, session| {
        let err = session.sql(queries::MISSING_TABLE).unwrap_err();
        assert_eq!(err.to_string(), MISSING_TABLE_MESSAGE);
        assert!(session.sql(queries::HELLO).is_ok());
        assert_eq!(
            test_bridge.connector.executed(),
            vec![queries::MISSING_TABLE.to_string(), queries::HELLO.to_string()]
        );
    });
}

#[test]
fn query_text_is_passed_verbatim() {
    with_session(|test_bridge, session| {
        let query = "  select 'x' ;";
        assert!(session.sql(query).is_err());
        assert_eq!(test_bridge.connector.executed(), vec![query.to_string()]);
    });
}

#[test]
fn release_is_idempotent() {
    let test_bridge = TestBridge::new();
    let session = test_bridge.open();
    let rows = session.sql(queries::THREE_ROWS).unwrap();
    assert_eq!(test_bridge.live_handles(), 4);

    assert!(session.release());
    assert!(!session.release());
    assert_eq!(test_bridge.connector.open_sessions(), 0);
    assert!(matches!(
        session.sql(queries::HELLO),
        Err(BridgeError::Released {
            kind: Kind::Session
        })
    ));

    // Rows hold their own data.
    assert_eq!(rows[2].get(1).unwrap(), ScalarValue::Int(3));
    drop(rows);
    drop(session);
    assert_eq!(test_bridge.live_handles(), 0);
}

#[test]
fn sessions_are_independent() {
    let test_bridge = TestBridge::new();
    let first = test_bridge.open();
    let second = test_bridge.open();
    assert_eq!(test_bridge.connector.open_sessions(), 2);

    first.release();
    assert_eq!(second.sql(queries::HELLO).unwrap().len(), 1);
    assert_eq!(test_bridge.connector.open_sessions(), 1);
}

#[test]
fn registration_is_required_and_once_per_registry() {
    let bridge = rowbridge_core::Bridge::new(scripted_connector());
    assert!(matches!(
        bridge.open_session(&args(&["memory://test"])),
        Err(BridgeError::NotRegistered { .. })
    ));

    let mut host = KindTable::new();
    bridge.init(&mut host).unwrap();
    assert!(matches!(
        bridge.init(&mut host),
        Err(BridgeError::AlreadyRegistered { kind: Kind::Row })
    ));
    assert!(bridge.open_session(&args(&["memory://test"])).is_ok());
}
