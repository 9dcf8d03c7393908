//! Sql command implementation.

use crate::Format;
use rowbridge_core::{
    Bridge, BridgeConfig, BridgeResult, HostArg, KindTable, QueryResult, ScalarValue,
    StandardConnector,
};
use serde_json::{json, Map, Value};
use std::collections::HashSet;

/// Runs the sql command.
pub fn run(
    args: &[String],
    query: &str,
    log_queries: bool,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = BridgeConfig::new()
        .log_query_text(log_queries)
        .warn_on_unsafe_integers(false);
    let bridge = Bridge::with_config(config, StandardConnector);
    bridge.init(&mut KindTable::new())?;

    let output = execute(&bridge, args, query, format)?;
    println!("{output}");
    Ok(())
}

/// Opens a session from `args`, runs `query` and renders the result.
pub fn execute(
    bridge: &Bridge,
    args: &[String],
    query: &str,
    format: Format,
) -> Result<String, Box<dyn std::error::Error>> {
    let args: Vec<HostArg> = args.iter().map(|a| HostArg::from(a.as_str())).collect();
    let session = bridge.open_session(&args)?;
    let result = session.execute(query)?;

    Ok(match format {
        Format::Text => render_text(&result)?,
        Format::Json => serde_json::to_string_pretty(&render_json(&result)?)?,
    })
}

fn text_cell(value: &ScalarValue) -> String {
    match value {
        ScalarValue::Null => "NULL".to_string(),
        ScalarValue::Str(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        ScalarValue::UInt(n) => n.to_string(),
        ScalarValue::Int(n) => n.to_string(),
        ScalarValue::F32(f) => f.to_string(),
        ScalarValue::F64(f) => f.to_string(),
        ScalarValue::Bool(b) => b.to_string(),
    }
}

/// Renders rows as tab-separated text under a header line.
pub fn render_text(result: &QueryResult) -> BridgeResult<String> {
    if result.columns.is_empty() {
        return Ok(format!("({} rows affected)", result.affected_rows));
    }

    let mut lines = vec![result.columns.join("\t")];
    for row in &result.rows {
        let cells: Vec<String> = row.values()?.iter().map(text_cell).collect();
        lines.push(cells.join("\t"));
    }
    lines.push(format!("({} rows)", result.rows.len()));
    Ok(lines.join("\n"))
}

fn json_cell(column: &str, value: &ScalarValue) -> Value {
    if value.exceeds_safe_integer() {
        tracing::warn!(column, ?value, "integer exceeds 2^53, emitting it as a string");
        return Value::String(text_cell(value));
    }
    match value {
        ScalarValue::Null => Value::Null,
        ScalarValue::Str(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ScalarValue::UInt(n) => json!(n),
        ScalarValue::Int(n) => json!(n),
        ScalarValue::F32(f) => json!(f64::from(*f)),
        ScalarValue::F64(f) => json!(f),
        ScalarValue::Bool(b) => Value::Bool(*b),
    }
}

/// Returns one distinct object key per column.
///
/// A repeated name gets the first free `_2`, `_3`, ... suffix.
fn json_keys(columns: &[String]) -> Vec<String> {
    let mut used = HashSet::new();
    columns
        .iter()
        .map(|column| {
            let mut key = column.clone();
            let mut n = 2;
            while used.contains(&key) {
                key = format!("{column}_{n}");
                n += 1;
            }
            used.insert(key.clone());
            key
        })
        .collect()
}

/// Renders rows as a JSON array of column-keyed objects.
pub fn render_json(result: &QueryResult) -> BridgeResult<Value> {
    if result.columns.is_empty() {
        return Ok(json!({ "affected_rows": result.affected_rows }));
    }

    let keys = json_keys(&result.columns);
    let mut rows = Vec::with_capacity(result.rows.len());
    for row in &result.rows {
        let object: Map<String, Value> = keys
            .iter()
            .zip(row.values()?)
            .map(|(key, value)| (key.clone(), json_cell(key, &value)))
            .collect();
        rows.push(Value::Object(object));
    }
    Ok(Value::Array(rows))
}
