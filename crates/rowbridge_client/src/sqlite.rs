//! SQLite backend through `rusqlite`.

use crate::backend::NativeSession;
use crate::error::{ClientError, ClientResult};
use crate::options::{Backend, ConnectOptions};
use crate::row::{ResultSet, Row};
use crate::value::NativeValue;
use rusqlite::types::ValueRef;
use rusqlite::{Batch, Connection, Statement};
use std::path::{Path, PathBuf};

/// A session backed by an embedded SQLite database.
///
/// Type mapping: INTEGER → `Int64`, REAL → `Double`, TEXT → `String`,
/// BLOB → `Raw`, NULL → `Null`.
///
/// Each call runs exactly one statement. Text holding several statements is
/// rejected before any of them runs; empty or comment-only text yields an
/// empty result.
///
/// # Example
///
/// ```rust
/// use rowbridge_client::{ConnectOptions, NativeSession, NativeValue, SqliteSession};
///
/// let mut session = SqliteSession::open(&ConnectOptions::parse("sqlite::memory:").unwrap()).unwrap();
/// let rows = session.execute("SELECT 'hello'").unwrap().fetch_all();
/// assert_eq!(rows[0].get(0), Some(&NativeValue::from("hello")));
/// ```
#[derive(Debug)]
pub struct SqliteSession {
    conn: Option<Connection>,
    path: Option<PathBuf>,
}

impl SqliteSession {
    /// Opens the database named by the options.
    ///
    /// # Errors
    ///
    /// Returns an error if the options do not target SQLite or the file
    /// cannot be opened.
    pub fn open(options: &ConnectOptions) -> ClientResult<Self> {
        if options.backend != Backend::Sqlite {
            return Err(ClientError::backend_unavailable(format!(
                "sqlite session cannot open {} connections",
                options.backend.scheme()
            )));
        }

        let conn = match &options.path {
            Some(path) => Connection::open(path)?,
            None => Connection::open_in_memory()?,
        };
        tracing::debug!(path = ?options.path, "opened sqlite session");
        Ok(Self {
            conn: Some(conn),
            path: options.path.clone(),
        })
    }

    /// Returns the database file, or `None` for an in-memory database.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn native_value(value: ValueRef<'_>) -> NativeValue {
    match value {
        ValueRef::Null => NativeValue::Null,
        ValueRef::Integer(n) => NativeValue::Int64(n),
        ValueRef::Real(f) => NativeValue::Double(f),
        ValueRef::Text(bytes) => NativeValue::String(bytes.to_vec()),
        ValueRef::Blob(bytes) => NativeValue::Raw(bytes.to_vec()),
    }
}

/// Prepares the only statement in `sql`, or `None` when there is none.
fn single_statement<'conn>(
    conn: &'conn Connection,
    sql: &str,
) -> ClientResult<Option<Statement<'conn>>> {
    let mut batch = Batch::new(conn, sql);
    let Some(stmt) = batch.next()? else {
        return Ok(None);
    };
    // The tail is only prepared to see whether it holds a statement.
    if !matches!(batch.next(), Ok(None)) {
        return Err(ClientError::execution(
            "multiple statements in one call are not supported",
        ));
    }
    Ok(Some(stmt))
}

impl NativeSession for SqliteSession {
    fn execute(&mut self, sql: &str) -> ClientResult<ResultSet> {
        let conn = self.conn.as_ref().ok_or(ClientError::Closed)?;
        let Some(mut stmt) = single_statement(conn, sql)? else {
            return Ok(ResultSet::empty(0));
        };
        let col_count = stmt.column_count();

        if col_count == 0 {
            let affected = stmt.execute([])?;
            return Ok(ResultSet::empty(affected as u64));
        }

        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        let mut cursor = stmt.query([])?;
        while let Some(row) = cursor.next()? {
            let mut values = Vec::with_capacity(col_count);
            for i in 0..col_count {
                values.push(native_value(row.get_ref(i)?));
            }
            rows.push(Row::new(values));
        }

        Ok(ResultSet::new(columns, rows))
    }

    fn close(&mut self) -> ClientResult<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| ClientError::from(e))?;
        }
        Ok(())
    }
}
