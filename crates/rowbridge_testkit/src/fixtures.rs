//! Test fixtures and bridge helpers.
//!
//! Provides a scripted connector preloaded with the common query shapes and
//! temporary SQLite databases with automatic cleanup.

use rowbridge_core::{
    Bridge, HostArg, KindTable, MemoryConnector, NativeValue, ResultSet, Row, SessionWrapper,
    StandardConnector,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Canned queries answered by [`scripted_connector`].
pub mod queries {
    /// One row, one string cell `"hello"`.
    pub const HELLO: &str = "SELECT 'hello'";
    /// One row, one NULL cell.
    pub const NULL: &str = "SELECT NULL";
    /// One row, three integer cells.
    pub const ONE_TWO_THREE: &str = "SELECT 1, 2, 3";
    /// Three rows of one integer cell each.
    pub const THREE_ROWS: &str = "SELECT n FROM numbers";
    /// Zero rows.
    pub const EMPTY: &str = "SELECT 1 FROM dual WHERE 1 = 0";
    /// A statement with no result columns.
    pub const CREATE: &str = "CREATE TABLE t (a INT)";
    /// One row holding an array cell and a document cell.
    pub const NESTED: &str = "SELECT JSON_ARRAY(1, 'two', NULL), JSON_OBJECT('a', 1, 'b', 2)";
    /// One row holding integers beyond 2^53.
    pub const LARGE_INTEGERS: &str = "SELECT 18446744073709551615, -9007199254740993";
    /// One row holding a raw temporal cell and a binary string.
    pub const RAW: &str = "SELECT NOW(), X'00FF'";
    /// Fails with [`MISSING_TABLE_MESSAGE`](super::MISSING_TABLE_MESSAGE).
    pub const MISSING_TABLE: &str = "SELECT * FROM no_such_table";
}

/// Message of the scripted [`queries::MISSING_TABLE`] failure.
pub const MISSING_TABLE_MESSAGE: &str = "Table 'test.no_such_table' doesn't exist";

/// Script name whose connections are refused.
pub const REFUSED: &str = "refused";

/// Message of a refused connection.
pub const REFUSED_MESSAGE: &str = "Can't connect to MySQL server on 'localhost' (111)";

fn single(values: Vec<NativeValue>) -> ResultSet {
    let columns = (1..=values.len()).map(|i| format!("c{i}")).collect();
    ResultSet::new(columns, vec![Row::new(values)])
}

/// Returns a memory connector answering every query in [`queries`].
pub fn scripted_connector() -> MemoryConnector {
    MemoryConnector::new()
        .with_result(queries::HELLO, single(vec!["hello".into()]))
        .with_result(queries::NULL, single(vec![NativeValue::Null]))
        .with_result(
            queries::ONE_TWO_THREE,
            single(vec![1i64.into(), 2i64.into(), 3i64.into()]),
        )
        .with_result(
            queries::THREE_ROWS,
            ResultSet::new(
                vec!["n".into()],
                (1..=3i64).map(|n| Row::new(vec![n.into()])).collect(),
            ),
        )
        .with_result(queries::EMPTY, ResultSet::new(vec!["1".into()], vec![]))
        .with_result(queries::CREATE, ResultSet::empty(0))
        .with_result(
            queries::NESTED,
            single(vec![
                NativeValue::Array(vec![1i64.into(), "two".into(), NativeValue::Null]),
                NativeValue::Document(vec![("a".into(), 1i64.into()), ("b".into(), 2i64.into())]),
            ]),
        )
        .with_result(
            queries::LARGE_INTEGERS,
            single(vec![
                NativeValue::UInt64(u64::MAX),
                NativeValue::Int64(-9_007_199_254_740_993),
            ]),
        )
        .with_result(
            queries::RAW,
            single(vec![
                NativeValue::Raw(b"2024-01-01 00:00:00".to_vec()),
                NativeValue::String(vec![0x00, 0xff]),
            ]),
        )
        .with_error(queries::MISSING_TABLE, MISSING_TABLE_MESSAGE)
        .refusing(REFUSED, REFUSED_MESSAGE)
}

/// Creates a bridge over `connector` with both kinds registered.
pub fn registered_bridge(connector: MemoryConnector) -> Bridge {
    let bridge = Bridge::new(connector);
    bridge
        .init(&mut KindTable::new())
        .expect("Failed to register kinds");
    bridge
}

/// A registered bridge over [`scripted_connector`].
pub struct TestBridge {
    /// The bridge.
    pub bridge: Bridge,
    /// The connector, for inspecting executed queries and open sessions.
    pub connector: MemoryConnector,
}

impl TestBridge {
    /// Creates a bridge over the scripted connector.
    pub fn new() -> Self {
        let connector = scripted_connector();
        Self {
            bridge: registered_bridge(connector.clone()),
            connector,
        }
    }

    /// Opens a session on `memory://test`.
    pub fn open(&self) -> SessionWrapper {
        self.bridge
            .open_session(&[HostArg::from("memory://test")])
            .expect("Failed to open session")
    }
}

impl Default for TestBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestBridge {
    type Target = Bridge;

    fn deref(&self) -> &Self::Target {
        &self.bridge
    }
}

/// A temporary SQLite database file with automatic cleanup.
pub struct TestSqlite {
    path: PathBuf,
    /// Kept alive so the directory outlives the database.
    _temp_dir: TempDir,
}

impl TestSqlite {
    /// Creates an empty database file location.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("test.sqlite");
        Self {
            path,
            _temp_dir: temp_dir,
        }
    }

    /// Returns the database path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the connection string for the database.
    pub fn uri(&self) -> String {
        format!("sqlite://{}", self.path.display())
    }

    /// Creates a registered bridge over the standard connector.
    pub fn bridge(&self) -> Bridge {
        let bridge = Bridge::new(StandardConnector);
        bridge
            .init(&mut KindTable::new())
            .expect("Failed to register kinds");
        bridge
    }

    /// Opens a session on the database through `bridge`.
    pub fn open(&self, bridge: &Bridge) -> SessionWrapper {
        bridge
            .open_session(&[HostArg::Str(self.uri())])
            .expect("Failed to open SQLite session")
    }
}

impl Default for TestSqlite {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs a test with a fresh [`TestBridge`] and an open session.
pub fn with_session<F, R>(f: F) -> R
where
    F: FnOnce(&TestBridge, &SessionWrapper) -> R,
{
    let test_bridge = TestBridge::new();
    let session = test_bridge.open();
    f(&test_bridge, &session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_hello() {
        with_session(|_, session| {
            let rows = session.sql(queries::HELLO).expect("query failed");
            assert_eq!(rows.len(), 1);
        });
    }

    #[test]
    fn test_refused_name() {
        let test_bridge = TestBridge::new();
        let err = test_bridge
            .open_session(&[HostArg::from(format!("memory://{REFUSED}"))])
            .unwrap_err();
        assert_eq!(err.to_string(), REFUSED_MESSAGE);
    }

    #[test]
    fn test_sqlite_fixture() {
        let db = TestSqlite::new();
        let bridge = db.bridge();
        let session = db.open(&bridge);
        assert!(session.sql("CREATE TABLE t (a INTEGER)").unwrap().is_empty());
        assert!(db.path().exists());
    }
}
