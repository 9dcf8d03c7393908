//! Scripted in-memory backend for testing.

use crate::backend::{Connector, NativeSession};
use crate::error::{ClientError, ClientResult};
use crate::options::{Backend, ConnectOptions};
use crate::row::ResultSet;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Response {
    Rows(ResultSet),
    Error(String),
}

#[derive(Debug, Default)]
struct Script {
    responses: HashMap<String, Response>,
    refused: HashMap<String, String>,
    executed: Vec<String>,
    open: HashSet<u64>,
    next_id: u64,
}

/// A connector whose sessions answer from a fixed script.
///
/// Every query text maps to a result or an error; anything unscripted fails
/// like an unknown table would. Sessions share the script, so queries run on
/// any session are visible through [`executed`](Self::executed).
///
/// # Example
///
/// ```rust
/// use rowbridge_client::{ConnectOptions, Connector, MemoryConnector, ResultSet};
///
/// let connector = MemoryConnector::new()
///     .with_result("SELECT 1 WHERE 0", ResultSet::default())
///     .with_error("SELECT * FROM nope", "Table 'test.nope' doesn't exist");
/// let mut session = connector.connect(&ConnectOptions::parse("memory://t").unwrap()).unwrap();
/// assert_eq!(session.execute("SELECT 1 WHERE 0").unwrap().count(), 0);
/// assert!(session.execute("SELECT * FROM nope").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    script: Arc<RwLock<Script>>,
}

impl MemoryConnector {
    /// Creates a connector with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a successful result for a query.
    #[must_use]
    pub fn with_result(self, sql: impl Into<String>, result: ResultSet) -> Self {
        self.script
            .write()
            .responses
            .insert(sql.into(), Response::Rows(result));
        self
    }

    /// Scripts a failure for a query.
    #[must_use]
    pub fn with_error(self, sql: impl Into<String>, message: impl Into<String>) -> Self {
        self.script
            .write()
            .responses
            .insert(sql.into(), Response::Error(message.into()));
        self
    }

    /// Makes connections to `memory://<name>` fail with a message.
    #[must_use]
    pub fn refusing(self, name: impl Into<String>, message: impl Into<String>) -> Self {
        self.script
            .write()
            .refused
            .insert(name.into(), message.into());
        self
    }

    /// Returns every query executed so far, in order.
    #[must_use]
    pub fn executed(&self) -> Vec<String> {
        self.script.read().executed.clone()
    }

    /// Returns the number of sessions not yet closed.
    #[must_use]
    pub fn open_sessions(&self) -> usize {
        self.script.read().open.len()
    }
}

impl Connector for MemoryConnector {
    fn connect(&self, options: &ConnectOptions) -> ClientResult<Box<dyn NativeSession>> {
        if options.backend != Backend::Memory {
            return Err(ClientError::backend_unavailable(format!(
                "memory connector cannot open {} connections",
                options.backend.scheme()
            )));
        }

        let name = options.schema.clone().unwrap_or_default();
        let mut script = self.script.write();
        if let Some(message) = script.refused.get(&name) {
            return Err(ClientError::connection(message.clone()));
        }

        let id = script.next_id;
        script.next_id += 1;
        script.open.insert(id);
        Ok(Box::new(MemorySession {
            id,
            script: Arc::clone(&self.script),
            closed: false,
        }))
    }
}

/// A session opened by [`MemoryConnector`].
#[derive(Debug)]
pub struct MemorySession {
    id: u64,
    script: Arc<RwLock<Script>>,
    closed: bool,
}

impl NativeSession for MemorySession {
    fn execute(&mut self, sql: &str) -> ClientResult<ResultSet> {
        if self.closed {
            return Err(ClientError::Closed);
        }

        let mut script = self.script.write();
        script.executed.push(sql.to_string());
        match script.responses.get(sql) {
            Some(Response::Rows(result)) => Ok(result.clone()),
            Some(Response::Error(message)) => Err(ClientError::execution(message.clone())),
            None => Err(ClientError::execution(format!("unscripted query: {sql}"))),
        }
    }

    fn close(&mut self) -> ClientResult<()> {
        if !self.closed {
            self.closed = true;
            self.script.write().open.remove(&self.id);
        }
        Ok(())
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::Row;
    use crate::value::NativeValue;

    fn options(name: &str) -> ConnectOptions {
        ConnectOptions::parse(&format!("memory://{name}")).unwrap()
    }

    #[test]
    fn scripted_results() {
        let connector = MemoryConnector::new().with_result(
            "SELECT 'hello'",
            ResultSet::new(vec!["s".into()], vec![Row::new(vec!["hello".into()])]),
        );
        let mut session = connector.connect(&options("a")).unwrap();
        let rows = session.execute("SELECT 'hello'").unwrap().fetch_all();
        assert_eq!(rows[0].get(0), Some(&NativeValue::from("hello")));
        assert_eq!(connector.executed(), vec!["SELECT 'hello'".to_string()]);
    }

    #[test]
    fn errors_keep_session_usable() {
        let connector = MemoryConnector::new()
            .with_error("BAD", "You have an error in your SQL syntax")
            .with_result("GOOD", ResultSet::default());
        let mut session = connector.connect(&options("a")).unwrap();

        let err = session.execute("BAD").unwrap_err();
        assert_eq!(err.to_string(), "You have an error in your SQL syntax");
        assert!(session.execute("GOOD").is_ok());
    }

    #[test]
    fn unscripted_query_fails() {
        let connector = MemoryConnector::new();
        let mut session = connector.connect(&options("a")).unwrap();
        assert!(session.execute("SELECT 2").is_err());
    }

    #[test]
    fn refused_connection() {
        let connector = MemoryConnector::new().refusing("down", "Connection refused");
        let err = connector.connect(&options("down")).err().unwrap();
        assert_eq!(err.to_string(), "Connection refused");
        assert!(connector.connect(&options("up")).is_ok());
    }

    #[test]
    fn rejects_other_backends() {
        let connector = MemoryConnector::new();
        let sqlite = ConnectOptions::parse("sqlite::memory:").unwrap();
        assert!(connector.connect(&sqlite).is_err());
    }

    #[test]
    fn tracks_open_sessions() {
        let connector = MemoryConnector::new();
        let mut a = connector.connect(&options("a")).unwrap();
        let b = connector.connect(&options("b")).unwrap();
        assert_eq!(connector.open_sessions(), 2);

        a.close().unwrap();
        a.close().unwrap();
        assert_eq!(connector.open_sessions(), 1);
        assert!(matches!(a.execute("SELECT 1"), Err(ClientError::Closed)));

        drop(b);
        assert_eq!(connector.open_sessions(), 0);
    }
}
