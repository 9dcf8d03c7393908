//! The bridge and its session wrapper.

use crate::config::BridgeConfig;
use crate::error::BridgeResult;
use crate::guard::guarded;
use crate::handle::{Handle, HandleTable, Resource, SharedSession};
use crate::marshal::{expect_string, HostArg};
use crate::registry::{self, HostRegistry, Kind, KindTable, SESSION, SESSION_NEW, SESSION_SQL};
use crate::row::RowWrapper;
use parking_lot::Mutex;
use rowbridge_client::{ClientError, ConnectOptions, Connector, Row};
use std::fmt;
use std::sync::Arc;

struct Inner {
    config: BridgeConfig,
    connector: Box<dyn Connector>,
    kinds: Mutex<KindTable>,
    table: Mutex<HandleTable>,
}

/// Entry point of the binding layer.
///
/// A bridge owns the connector, the set of registered kinds and the table of
/// live native resources. Cloning is cheap; clones share all state.
///
/// # Example
///
/// ```rust
/// use rowbridge_core::{Bridge, HostArg, KindTable, MemoryConnector};
///
/// let bridge = Bridge::new(MemoryConnector::new());
/// bridge.init(&mut KindTable::new()).unwrap();
///
/// let session = bridge.open_session(&[HostArg::from("memory://demo")]).unwrap();
/// assert!(session.sql("SELECT 1").is_err());
/// ```
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<Inner>,
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("config", &self.inner.config)
            .field("live_handles", &self.live_handles())
            .finish_non_exhaustive()
    }
}

impl Bridge {
    /// Creates a bridge with the default configuration.
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self::with_config(BridgeConfig::default(), connector)
    }

    /// Creates a bridge with an explicit configuration.
    pub fn with_config(config: BridgeConfig, connector: impl Connector + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                connector: Box::new(connector),
                kinds: Mutex::new(KindTable::new()),
                table: Mutex::new(HandleTable::new()),
            }),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// Registers both kinds with the host and enables them on this bridge.
    ///
    /// # Errors
    ///
    /// Returns the host registry's error, including
    /// `BridgeError::AlreadyRegistered` on a repeated call with the same
    /// registry.
    pub fn init<R: HostRegistry>(&self, host: &mut R) -> Result<(), R::Error> {
        registry::init(host)?;
        let mut kinds = self.inner.kinds.lock();
        for descriptor in registry::kinds() {
            // A second host registry may install the same kinds again.
            let _ = kinds.register_kind(descriptor);
        }
        Ok(())
    }

    /// Returns true once `kind` has been registered through [`init`](Self::init).
    #[must_use]
    pub fn is_registered(&self, kind: Kind) -> bool {
        self.inner.kinds.lock().is_registered(kind)
    }

    /// Returns the number of live sessions and rows.
    #[must_use]
    pub fn live_handles(&self) -> usize {
        self.inner.table.lock().len()
    }

    /// Opens a session from host constructor arguments.
    ///
    /// Accepts either a single connection string or the four parts
    /// `(host, user, password, schema)`. Argument count and types are checked
    /// before any connection attempt.
    ///
    /// # Errors
    ///
    /// - `BridgeError::NotRegistered` before [`init`](Self::init)
    /// - `BridgeError::ArgumentCount` for anything but 1 or 4 arguments
    /// - `BridgeError::ArgumentType` for a non-string argument
    /// - `BridgeError::Native` if the connection string is malformed or the
    ///   connection fails
    pub fn open_session(&self, args: &[HostArg]) -> BridgeResult<SessionWrapper> {
        let descriptor = self.inner.kinds.lock().require(Kind::Session)?;
        descriptor.check_constructor_arity(args.len())?;

        let parts = args
            .iter()
            .enumerate()
            .map(|(i, arg)| expect_string(SESSION_NEW.name, i + 1, arg))
            .collect::<BridgeResult<Vec<&str>>>()?;

        let options = guarded(SESSION_NEW.name, || match parts.as_slice() {
            [uri] => ConnectOptions::parse(uri),
            [host, user, password, schema] => {
                ConnectOptions::from_parts(host, user, password, schema)
            }
            other => Err(ClientError::invalid_connection_string(format!(
                "expected 1 or 4 parts, got {}",
                other.len()
            ))),
        })?;

        let session = guarded(SESSION_NEW.name, || self.inner.connector.connect(&options))?;
        let handle = self
            .inner
            .table
            .lock()
            .insert(Resource::Session(Arc::new(Mutex::new(session))));
        tracing::debug!(%handle, backend = options.backend.scheme(), "opened session");

        Ok(SessionWrapper {
            bridge: self.clone(),
            handle,
        })
    }

    pub(crate) fn session_at(&self, handle: Handle, operation: &'static str) -> BridgeResult<SharedSession> {
        self.inner.table.lock().session(handle, operation)
    }

    pub(crate) fn row_at(&self, handle: Handle, operation: &'static str) -> BridgeResult<Arc<Row>> {
        self.inner.table.lock().row(handle, operation)
    }

    pub(crate) fn insert_row(&self, row: Row) -> BridgeResult<Handle> {
        self.inner.kinds.lock().require(Kind::Row)?;
        Ok(self.inner.table.lock().insert(Resource::Row(Arc::new(row))))
    }

    /// Releases a handle. Returns false if it was already released.
    pub(crate) fn release(&self, handle: Handle) -> bool {
        // Taken out of the table first so a slow close never holds the lock.
        let resource = self.inner.table.lock().release(handle);
        match resource {
            Some(Resource::Session(session)) => {
                if let Err(err) = guarded("close", || session.lock().close()) {
                    tracing::warn!(%handle, error = %err, "failed to close session");
                }
                tracing::debug!(%handle, "released session");
                true
            }
            Some(Resource::Row(_)) => true,
            None => false,
        }
    }
}

/// Host-visible `Session` object.
///
/// Releasing the wrapper, explicitly or by dropping it, closes the native
/// session exactly once.
#[derive(Debug)]
pub struct SessionWrapper {
    bridge: Bridge,
    handle: Handle,
}

impl SessionWrapper {
    /// Executes a statement and returns its rows in server order.
    ///
    /// The query text is passed to the client unchanged. A statement that
    /// produces no rows returns an empty vector.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::Released` after release and
    /// `BridgeError::Native` with the client's message if execution fails.
    /// The session stays usable after an execution error.
    pub fn sql(&self, query: &str) -> BridgeResult<Vec<RowWrapper>> {
        self.execute(query).map(|result| result.rows)
    }

    /// Like [`sql`](Self::sql), also returning column names and the
    /// affected-row count.
    ///
    /// # Errors
    ///
    /// As [`sql`](Self::sql).
    pub fn execute(&self, query: &str) -> BridgeResult<QueryResult> {
        SESSION.check_receiver(SESSION_SQL.name, self.handle.kind())?;
        let session = self.bridge.session_at(self.handle, SESSION_SQL.name)?;

        if self.bridge.config().log_query_text {
            tracing::debug!(handle = %self.handle, query, "executing");
        } else {
            tracing::debug!(handle = %self.handle, "executing");
        }

        let result = guarded(SESSION_SQL.name, || session.lock().execute(query))?;
        tracing::debug!(
            handle = %self.handle,
            rows = result.count(),
            affected = result.affected_rows(),
            "executed"
        );

        let columns = result.columns().to_vec();
        let affected_rows = result.affected_rows();
        let rows = result
            .fetch_all()
            .into_iter()
            .map(|row| {
                let handle = self.bridge.insert_row(row)?;
                Ok(RowWrapper::new(self.bridge.clone(), handle))
            })
            .collect::<BridgeResult<Vec<_>>>()?;

        Ok(QueryResult {
            columns,
            affected_rows,
            rows,
        })
    }

    /// Same as [`sql`](Self::sql) with the query given as a host argument.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::ArgumentType` if `query` is not a string,
    /// otherwise as [`sql`](Self::sql).
    pub fn sql_arg(&self, query: &HostArg) -> BridgeResult<Vec<RowWrapper>> {
        let query = expect_string(SESSION_SQL.name, 1, query)?;
        self.sql(query)
    }

    /// Returns the handle.
    #[must_use]
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Closes the native session. Returns false if already released.
    pub fn release(&self) -> bool {
        self.bridge.release(self.handle)
    }

    /// Returns true once the session has been released.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.bridge.session_at(self.handle, SESSION_SQL.name).is_err()
    }
}

/// Rows of one statement plus its metadata.
#[derive(Debug)]
pub struct QueryResult {
    /// Column names, empty for statements without a result set.
    pub columns: Vec<String>,
    /// Rows changed by a DML statement.
    pub affected_rows: u64,
    /// Result rows in server order.
    pub rows: Vec<RowWrapper>,
}

impl Drop for SessionWrapper {
    fn drop(&mut self) {
        self.bridge.release(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;
    use rowbridge_client::{MemoryConnector, NativeValue, ResultSet};

    fn connector() -> MemoryConnector {
        MemoryConnector::new()
            .with_result(
                "SELECT 'hello'",
                ResultSet::new(vec!["s".into()], vec![Row::new(vec!["hello".into()])]),
            )
            .with_result(
                "SELECT 1 UNION SELECT 2",
                ResultSet::new(
                    vec!["n".into()],
                    vec![
                        Row::new(vec![NativeValue::Int64(1)]),
                        Row::new(vec![NativeValue::Int64(2)]),
                    ],
                ),
            )
            .with_result("CREATE TABLE t (a INT)", ResultSet::empty(0))
            .with_error("SELECT * FROM nope", "Table 'test.nope' doesn't exist")
            .refusing("down", "Can't connect to MySQL server")
    }

    fn bridge(connector: MemoryConnector) -> Bridge {
        let bridge = Bridge::new(connector);
        bridge.init(&mut KindTable::new()).unwrap();
        bridge
    }

    fn open(bridge: &Bridge) -> SessionWrapper {
        bridge.open_session(&["memory://test".into()]).unwrap()
    }

    #[test]
    fn sql_returns_rows_in_order() {
        let bridge = bridge(connector());
        let session = open(&bridge);
        let rows = session.sql("SELECT 1 UNION SELECT 2").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].values().unwrap(), vec![crate::ScalarValue::Int(1)]);
        assert_eq!(rows[1].values().unwrap(), vec![crate::ScalarValue::Int(2)]);
    }

    #[test]
    fn statement_without_rows_is_empty() {
        let bridge = bridge(connector());
        let session = open(&bridge);
        assert!(session.sql("CREATE TABLE t (a INT)").unwrap().is_empty());
    }

    #[test]
    fn execution_error_keeps_session_usable() {
        let bridge = bridge(connector());
        let session = open(&bridge);
        let err = session.sql("SELECT * FROM nope").unwrap_err();
        assert!(err.is_native());
        assert_eq!(err.to_string(), "Table 'test.nope' doesn't exist");
        assert_eq!(session.sql("SELECT 'hello'").unwrap().len(), 1);
    }

    #[test]
    fn arity_is_checked_before_connecting() {
        let connector = connector();
        let bridge = bridge(connector.clone());
        let cases: [Vec<HostArg>; 3] = [
            vec![],
            vec!["a".into(), "b".into()],
            vec![HostArg::from("a"); 5],
        ];
        for args in cases {
            let err = bridge.open_session(&args).unwrap_err();
            assert!(matches!(err, BridgeError::ArgumentCount { .. }));
        }
        assert_eq!(connector.open_sessions(), 0);
    }

    #[test]
    fn argument_types_are_checked() {
        let bridge = bridge(connector());
        let err = bridge
            .open_session(&["h".into(), "u".into(), HostArg::Int(3), "s".into()])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "bad argument #3 to 'Session' (string expected, got integer)"
        );
    }

    #[test]
    fn malformed_connection_string_is_native() {
        let bridge = bridge(connector());
        let err = bridge.open_session(&["no scheme".into()]).unwrap_err();
        assert!(err.is_native());
    }

    #[test]
    fn refused_connection_is_native() {
        let bridge = bridge(connector());
        let err = bridge.open_session(&["memory://down".into()]).unwrap_err();
        assert!(err.is_native());
        assert_eq!(err.to_string(), "Can't connect to MySQL server");
        assert_eq!(bridge.live_handles(), 0);
    }

    #[test]
    fn requires_registration() {
        let bridge = Bridge::new(connector());
        let err = bridge.open_session(&["memory://test".into()]).unwrap_err();
        assert!(matches!(err, BridgeError::NotRegistered { kind: Kind::Session }));
    }

    #[test]
    fn init_twice_on_same_registry_fails() {
        let bridge = Bridge::new(connector());
        let mut host = KindTable::new();
        bridge.init(&mut host).unwrap();
        assert!(bridge.init(&mut host).is_err());
        assert!(bridge.init(&mut KindTable::new()).is_ok());
        assert!(bridge.is_registered(Kind::Row));
    }

    #[test]
    fn release_closes_once() {
        let connector = connector();
        let bridge = bridge(connector.clone());
        let session = open(&bridge);
        assert_eq!(connector.open_sessions(), 1);

        assert!(session.release());
        assert!(!session.release());
        assert!(session.is_released());
        assert_eq!(connector.open_sessions(), 0);
        assert!(matches!(
            session.sql("SELECT 'hello'"),
            Err(BridgeError::Released { kind: Kind::Session })
        ));
    }

    #[test]
    fn drop_closes_session() {
        let connector = connector();
        let bridge = bridge(connector.clone());
        drop(open(&bridge));
        assert_eq!(connector.open_sessions(), 0);
        assert_eq!(bridge.live_handles(), 0);
    }

    #[test]
    fn rows_outlive_their_session() {
        let bridge = bridge(connector());
        let session = open(&bridge);
        let rows = session.sql("SELECT 'hello'").unwrap();
        drop(session);
        assert_eq!(rows[0].col_count().unwrap(), 1);
    }

    #[test]
    fn execute_reports_columns() {
        let bridge = bridge(connector());
        let session = open(&bridge);
        let result = session.execute("SELECT 1 UNION SELECT 2").unwrap();
        assert_eq!(result.columns, vec!["n".to_string()]);
        assert_eq!(result.rows.len(), 2);

        let result = session.execute("CREATE TABLE t (a INT)").unwrap();
        assert!(result.columns.is_empty());
        assert!(result.rows.is_empty());
    }

    #[test]
    fn sql_arg_requires_string() {
        let bridge = bridge(connector());
        let session = open(&bridge);
        let err = session.sql_arg(&HostArg::Nil).unwrap_err();
        assert_eq!(
            err.to_string(),
            "bad argument #1 to 'sql' (string expected, got nil)"
        );
    }
}
