#![allow(dead_code)]

use sql_ops::prelude::*;
use tempfile::tempdir;

pub fn unique_db_path(prefix: &str) -> String {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(format!("{prefix}.db"));
    // Leak the tempdir so the file persists for the duration of the test binary.
    std::mem::forget(dir);
    path.to_string_lossy().into_owned()
}

pub fn source(prefix: &str) -> SqliteSource {
    SqliteOptions::builder(unique_db_path(prefix)).build_source()
}

pub const SCHEMA: &str = "
    CREATE TABLE foo (id INTEGER PRIMARY KEY, description TEXT NOT NULL);
    CREATE TABLE bar (id INTEGER PRIMARY KEY, foo_id INTEGER NOT NULL, description TEXT NOT NULL);
";

/// A synchronous interpreter over a fresh file database with `SCHEMA` applied.
pub fn sync_db(prefix: &str) -> SyncInterpreter<SqliteSource> {
    let db = SyncInterpreter::new(source(prefix));
    db.submit(&from_fn(|conn: &mut Connection| conn.execute_script(SCHEMA)))
        .expect("schema");
    db
}

pub fn count(table: &str) -> AggregateOp<NoBinder> {
    AggregateOp::new(format!("SELECT COUNT(*) FROM {table}"), NoBinder)
}

pub fn text(value: &str) -> Params {
    Params(vec![value.to_string().into()])
}
