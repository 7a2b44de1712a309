use std::fmt;
use std::time::Duration;

use rusqlite::types::ValueRef;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::info;

use crate::error::{DbError, Result};
use crate::sqlite::Connection;

/// The backend's query plan for one statement, as ordered `(column, value)` rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplainReport {
    pub sql: String,
    pub rows: Vec<Vec<(String, JsonValue)>>,
}

impl ExplainReport {
    /// # Errors
    /// Returns `DbError::Other` if the report cannot be serialized.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| DbError::Other(e.to_string()))
    }
}

impl fmt::Display for ExplainReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "EXPLAIN for query: {}", self.sql)?;
        for row in &self.rows {
            for (column, value) in row {
                match value {
                    JsonValue::String(s) => write!(f, "{column}-->{s} | ")?,
                    other => write!(f, "{column}-->{other} | ")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Receives instrumentation from queries built with `.explain(..)`.
pub trait QueryObserver: Send + Sync {
    /// Called with the plan, before the query itself runs.
    fn explained(&self, sql: &str, report: &ExplainReport);

    /// Called after the query's rows have been consumed.
    fn executed(&self, sql: &str, elapsed: Duration);
}

/// Logs explain reports and timings through `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl QueryObserver for TracingObserver {
    fn explained(&self, sql: &str, report: &ExplainReport) {
        info!(sql, "{report}");
    }

    fn executed(&self, sql: &str, elapsed: Duration) {
        info!(sql, elapsed_ms = elapsed.as_millis(), "query executed");
    }
}

/// Run `EXPLAIN QUERY PLAN <sql>` without parameters and flatten its rows.
pub(crate) fn explain(conn: &Connection, sql: &str) -> Result<ExplainReport> {
    let explain_sql = format!("EXPLAIN QUERY PLAN {sql}");
    let mut stmt = conn.prepare(&explain_sql)?;
    let columns = stmt.column_names();
    let mut rows = stmt.query();

    let mut report = ExplainReport {
        sql: sql.to_string(),
        rows: Vec::new(),
    };
    while let Some(row) = rows.next()? {
        let mut flat = Vec::with_capacity(columns.len());
        for (idx, column) in columns.iter().enumerate() {
            flat.push((column.clone(), value_to_json(row.get_ref(idx)?)));
        }
        report.rows.push(flat);
    }
    Ok(report)
}

fn value_to_json(value: ValueRef<'_>) -> JsonValue {
    match value {
        ValueRef::Null => JsonValue::Null,
        ValueRef::Integer(i) => JsonValue::from(i),
        ValueRef::Real(r) => JsonValue::from(r),
        ValueRef::Text(t) => JsonValue::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => JsonValue::String(format!("<{} bytes>", b.len())),
    }
}
