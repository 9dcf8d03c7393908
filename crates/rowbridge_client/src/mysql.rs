//! MySQL backend through the `mysql` crate.

use crate::backend::NativeSession;
use crate::error::{ClientError, ClientResult};
use crate::options::{Backend, ConnectOptions};
use crate::row::{ResultSet, Row};
use crate::value::NativeValue;
use mysql::consts::{ColumnFlags, ColumnType};
use mysql::prelude::Queryable;
use mysql::{Column, Conn, OptsBuilder, Value};

/// Character set number of binary strings.
const BINARY_CHARSET: u16 = 63;

/// A session connected to a MySQL server.
///
/// Queries run over the text protocol and every cell is decoded from its
/// column metadata, so the tags match what the server declares: integer
/// columns become `Int64` or `UInt64` (by the unsigned flag), `FLOAT` becomes
/// `Float`, `JSON` becomes `Document` / `Array`, temporal and binary columns
/// stay `Raw`.
pub struct MysqlSession {
    conn: Option<Conn>,
}

impl MysqlSession {
    /// Connects to the server named by the options.
    ///
    /// # Errors
    ///
    /// Returns the driver's error if the connection or authentication fails.
    pub fn open(options: &ConnectOptions) -> ClientResult<Self> {
        if options.backend != Backend::Mysql {
            return Err(ClientError::backend_unavailable(format!(
                "mysql session cannot open {} connections",
                options.backend.scheme()
            )));
        }

        let mut builder = OptsBuilder::new()
            .ip_or_hostname(options.host.clone())
            .user(options.user.clone())
            .pass(options.password.clone())
            .db_name(options.schema.clone());
        if let Some(port) = options.port_or_default() {
            builder = builder.tcp_port(port);
        }

        let conn = Conn::new(builder)?;
        tracing::debug!(host = ?options.host, schema = ?options.schema, "opened mysql session");
        Ok(Self { conn: Some(conn) })
    }
}

impl NativeSession for MysqlSession {
    fn execute(&mut self, sql: &str) -> ClientResult<ResultSet> {
        let conn = self.conn.as_mut().ok_or(ClientError::Closed)?;
        let mut result = conn.query_iter(sql)?;
        let columns: Vec<Column> = result.columns().as_ref().to_vec();

        let mut rows = Vec::new();
        for row in result.by_ref() {
            let values = row?.unwrap();
            rows.push(
                columns
                    .iter()
                    .zip(values)
                    .map(|(column, value)| decode(column, value))
                    .collect::<Row>(),
            );
        }

        let affected = result.affected_rows();
        if columns.is_empty() {
            return Ok(ResultSet::empty(affected));
        }
        let names = columns.iter().map(|c| c.name_str().into_owned()).collect();
        Ok(ResultSet::new(names, rows).with_affected_rows(affected))
    }

    fn close(&mut self) -> ClientResult<()> {
        self.conn = None;
        Ok(())
    }
}

fn decode(column: &Column, value: Value) -> NativeValue {
    let bytes = match value {
        Value::NULL => return NativeValue::Null,
        Value::Bytes(bytes) => bytes,
        Value::Int(n) => return NativeValue::Int64(n),
        Value::UInt(n) => return NativeValue::UInt64(n),
        Value::Float(f) => return NativeValue::Float(f),
        Value::Double(f) => return NativeValue::Double(f),
        other => return NativeValue::Raw(other.as_sql(true).into_bytes()),
    };
    decode_text(
        column.column_type(),
        column.flags().contains(ColumnFlags::UNSIGNED_FLAG),
        column.character_set(),
        bytes,
    )
}

fn decode_text(column_type: ColumnType, unsigned: bool, charset: u16, bytes: Vec<u8>) -> NativeValue {
    use ColumnType::*;

    let text = || std::str::from_utf8(&bytes).ok().map(str::trim);
    match column_type {
        MYSQL_TYPE_TINY | MYSQL_TYPE_SHORT | MYSQL_TYPE_LONG | MYSQL_TYPE_INT24
        | MYSQL_TYPE_LONGLONG | MYSQL_TYPE_YEAR => {
            let parsed = if unsigned {
                text().and_then(|s| s.parse().ok()).map(NativeValue::UInt64)
            } else {
                text().and_then(|s| s.parse().ok()).map(NativeValue::Int64)
            };
            parsed.unwrap_or(NativeValue::String(bytes))
        }
        MYSQL_TYPE_FLOAT => text()
            .and_then(|s| s.parse().ok())
            .map_or(NativeValue::String(bytes), NativeValue::Float),
        MYSQL_TYPE_DOUBLE => text()
            .and_then(|s| s.parse().ok())
            .map_or(NativeValue::String(bytes), NativeValue::Double),
        MYSQL_TYPE_BIT => NativeValue::UInt64(
            bytes
                .iter()
                .take(8)
                .fold(0u64, |acc, b| (acc << 8) | u64::from(*b)),
        ),
        MYSQL_TYPE_JSON => serde_json::from_slice(&bytes)
            .map_or(NativeValue::String(bytes), |json| from_json(&json)),
        MYSQL_TYPE_NULL => NativeValue::Null,
        MYSQL_TYPE_DATE | MYSQL_TYPE_NEWDATE | MYSQL_TYPE_TIME | MYSQL_TYPE_TIME2
        | MYSQL_TYPE_DATETIME | MYSQL_TYPE_DATETIME2 | MYSQL_TYPE_TIMESTAMP
        | MYSQL_TYPE_TIMESTAMP2 | MYSQL_TYPE_GEOMETRY => NativeValue::Raw(bytes),
        _ if charset == BINARY_CHARSET => NativeValue::Raw(bytes),
        _ => NativeValue::String(bytes),
    }
}

fn from_json(json: &serde_json::Value) -> NativeValue {
    use serde_json::Value as Json;

    match json {
        Json::Null => NativeValue::Null,
        Json::Bool(b) => NativeValue::Bool(*b),
        Json::Number(n) => n
            .as_i64()
            .map(NativeValue::Int64)
            .or_else(|| n.as_u64().map(NativeValue::UInt64))
            .unwrap_or_else(|| NativeValue::Double(n.as_f64().unwrap_or(f64::NAN))),
        Json::String(s) => NativeValue::from(s.as_str()),
        Json::Array(items) => NativeValue::Array(items.iter().map(from_json).collect()),
        Json::Object(fields) => NativeValue::Document(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), from_json(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UTF8MB4: u16 = 255;

    #[test]
    fn integers_follow_the_unsigned_flag() {
        assert_eq!(
            decode_text(ColumnType::MYSQL_TYPE_LONGLONG, false, UTF8MB4, b"-7".to_vec()),
            NativeValue::Int64(-7)
        );
        assert_eq!(
            decode_text(
                ColumnType::MYSQL_TYPE_LONGLONG,
                true,
                UTF8MB4,
                b"18446744073709551615".to_vec()
            ),
            NativeValue::UInt64(u64::MAX)
        );
    }

    #[test]
    fn floats_and_strings() {
        assert_eq!(
            decode_text(ColumnType::MYSQL_TYPE_FLOAT, false, UTF8MB4, b"1.5".to_vec()),
            NativeValue::Float(1.5)
        );
        assert_eq!(
            decode_text(ColumnType::MYSQL_TYPE_DOUBLE, false, UTF8MB4, b"2.25".to_vec()),
            NativeValue::Double(2.25)
        );
        assert_eq!(
            decode_text(ColumnType::MYSQL_TYPE_VAR_STRING, false, UTF8MB4, b"hello".to_vec()),
            NativeValue::from("hello")
        );
        assert_eq!(
            decode_text(ColumnType::MYSQL_TYPE_BLOB, false, BINARY_CHARSET, vec![0, 1]),
            NativeValue::Raw(vec![0, 1])
        );
    }

    #[test]
    fn temporal_columns_stay_raw() {
        assert_eq!(
            decode_text(
                ColumnType::MYSQL_TYPE_DATETIME,
                false,
                UTF8MB4,
                b"2024-01-02 03:04:05".to_vec()
            ),
            NativeValue::Raw(b"2024-01-02 03:04:05".to_vec())
        );
    }

    #[test]
    fn bit_columns_are_unsigned() {
        assert_eq!(
            decode_text(ColumnType::MYSQL_TYPE_BIT, true, BINARY_CHARSET, vec![0x01, 0x02]),
            NativeValue::UInt64(0x0102)
        );
    }

    #[test]
    fn json_becomes_documents_and_arrays() {
        let value = decode_text(
            ColumnType::MYSQL_TYPE_JSON,
            false,
            BINARY_CHARSET,
            br#"{"tags": ["a", 2], "ok": true}"#.to_vec(),
        );
        assert_eq!(value.element_count(), 2);
        assert_eq!(
            value.field("tags"),
            Some(&NativeValue::Array(vec!["a".into(), NativeValue::Int64(2)]))
        );
        assert_eq!(value.field("ok"), Some(&NativeValue::Bool(true)));
    }
}
