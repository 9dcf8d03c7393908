//! The binding layer over a real SQLite database.

use rowbridge_core::{Bridge, BridgeError, HostArg, KindTable, ScalarValue, StandardConnector, TypeTag};
use rowbridge_testkit::prelude::*;

fn memory_bridge() -> Bridge {
    let bridge = Bridge::new(StandardConnector);
    bridge.init(&mut KindTable::new()).unwrap();
    bridge
}

#[test]
fn literal_select() {
    let bridge = memory_bridge();
    let session = bridge.open_session(&["sqlite::memory:".into()]).unwrap();
    let rows = session.sql("SELECT 'hello', NULL, 42, 2.5, x'00ff'").unwrap();
    assert_eq!(rows.len(), 1);

    let row = &rows[0];
    assert_eq!(row.col_count().unwrap(), 5);
    assert_eq!(row.get(1).unwrap(), ScalarValue::Str(b"hello".to_vec()));
    assert_eq!(row.type_code(0).unwrap(), TypeTag::String.code());
    assert!(row.get(2).unwrap().is_null());
    assert_eq!(row.type_code(1).unwrap(), TypeTag::Null.code());
    assert_eq!(row.get(3).unwrap(), ScalarValue::Int(42));
    assert_eq!(row.get(4).unwrap(), ScalarValue::F64(2.5));
    assert!(row.get(5).unwrap().is_null());
    assert_eq!(row.type_code(4).unwrap(), TypeTag::Raw.code());
    assert!(row.get(6).unwrap().is_null());
}

#[test]
fn table_round_trip() {
    let db = TestSqlite::new();
    let bridge = db.bridge();
    let session = db.open(&bridge);

    assert!(session
        .sql("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, score REAL)")
        .unwrap()
        .is_empty());
    assert!(session
        .sql("INSERT INTO users (name, score) VALUES ('ada', 9.5), ('grace', NULL)")
        .unwrap()
        .is_empty());

    let rows = session
        .sql("SELECT id, name, score FROM users ORDER BY id")
        .unwrap();
    assert_eq!(rows.len(), 2);
    for row in &rows {
        assert_eq!(row.col_count().unwrap(), 3);
    }
    assert_eq!(rows[0].get(2).unwrap(), ScalarValue::Str(b"ada".to_vec()));
    assert_eq!(rows[0].get(3).unwrap(), ScalarValue::F64(9.5));
    assert!(rows[1].get(3).unwrap().is_null());

    assert!(session.sql("SELECT * FROM users WHERE id > 10").unwrap().is_empty());
}

#[test]
fn data_survives_reopen() {
    let db = TestSqlite::new();
    let bridge = db.bridge();

    let first = db.open(&bridge);
    first.sql("CREATE TABLE kv (k TEXT, v INTEGER)").unwrap();
    first.sql("INSERT INTO kv VALUES ('answer', 42)").unwrap();
    first.release();

    let second = db.open(&bridge);
    let rows = second.sql("SELECT v FROM kv WHERE k = 'answer'").unwrap();
    assert_eq!(rows[0].get(1).unwrap(), ScalarValue::Int(42));
    assert!(db.path().exists());
}

#[test]
fn sql_errors_are_native_and_recoverable() {
    let bridge = memory_bridge();
    let session = bridge.open_session(&["sqlite::memory:".into()]).unwrap();

    let err = session.sql("SELECT * FROM missing").unwrap_err();
    assert!(matches!(err, BridgeError::Native(_)));
    assert!(err.to_string().contains("no such table: missing"));

    let err = session.sql("SELEC 1").unwrap_err();
    assert!(err.is_native());

    assert_eq!(session.sql("SELECT 1").unwrap().len(), 1);
}

#[test]
fn each_session_has_its_own_memory_database() {
    let bridge = memory_bridge();
    let first = bridge.open_session(&["sqlite::memory:".into()]).unwrap();
    let second = bridge.open_session(&["sqlite://:memory:".into()]).unwrap();

    first.sql("CREATE TABLE only_here (a INTEGER)").unwrap();
    assert!(second.sql("SELECT * FROM only_here").is_err());
}

#[test]
fn accessors_agree_with_native_rows() {
    let bridge = memory_bridge();
    let session = bridge.open_session(&["sqlite::memory:".into()]).unwrap();
    let rows = session
        .sql("SELECT 1, 'two', NULL UNION ALL SELECT 4, NULL, x'05'")
        .unwrap();

    let expected = [
        rowbridge_core::Row::new(vec![1i64.into(), "two".into(), rowbridge_core::NativeValue::Null]),
        rowbridge_core::Row::new(vec![
            4i64.into(),
            rowbridge_core::NativeValue::Null,
            rowbridge_core::NativeValue::Raw(vec![5]),
        ]),
    ];
    for (wrapper, native) in rows.iter().zip(&expected) {
        verify_row_accessors(wrapper, native);
    }
}

#[test]
fn four_part_form_targets_mysql() {
    let bridge = memory_bridge();
    let result = bridge.open_session(&[
        HostArg::from("127.0.0.1:1"),
        HostArg::from("root"),
        HostArg::from(""),
        HostArg::from("test"),
    ]);
    // Either the backend is not compiled in or nothing listens on port 1.
    assert!(result.unwrap_err().is_native());
    assert_eq!(bridge.live_handles(), 0);
}

#[test]
fn multi_statement_text_runs_nothing() {
    let bridge = memory_bridge();
    let session = bridge.open_session(&["sqlite::memory:".into()]).unwrap();
    session.sql("CREATE TABLE t (id INTEGER)").unwrap();

    let err = session
        .sql("INSERT INTO t VALUES (1); INSERT INTO t VALUES (2)")
        .unwrap_err();
    assert!(err.is_native());
    assert_eq!(
        err.to_string(),
        "multiple statements in one call are not supported"
    );

    let rows = session.sql("SELECT COUNT(*) FROM t").unwrap();
    assert_eq!(rows[0].get(1).unwrap(), ScalarValue::Int(0));
    assert!(session.sql("SELECT 1; SELECT 2").is_err());
}

#[test]
fn empty_text_returns_no_rows() {
    let bridge = memory_bridge();
    let session = bridge.open_session(&["sqlite::memory:".into()]).unwrap();
    assert!(session.sql("").unwrap().is_empty());
    assert!(session.sql("-- comment only").unwrap().is_empty());
    assert_eq!(session.sql("SELECT 1;").unwrap().len(), 1);
}
