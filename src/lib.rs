//! Composable database operations for `SQLite`.
//!
//! Build work as [`DbOp`] values, combine them with `map`, `bind`, [`sequence`] and friends,
//! and hand the result to an interpreter that supplies the connection and the transaction
//! policy:
//!
//! ```rust
//! use sql_ops::prelude::*;
//!
//! # fn demo() -> Result<(), DbError> {
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("app.db");
//! let db = SyncInterpreter::new(SqliteOptions::builder(path.to_string_lossy()).build_source());
//!
//! db.submit(&EffectOp::new("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)"))?;
//!
//! let add_and_count = insert_gen_key_i64(
//!     "INSERT INTO users (name) VALUES (?)",
//!     Params(vec!["ann".to_string().into()]),
//! )
//! .bind(|_id| AggregateOp::new("SELECT COUNT(*) FROM users", NoBinder));
//!
//! assert_eq!(db.transact(&add_and_count)?, 1);
//! # Ok(()) }
//! # demo().unwrap();
//! ```
//!
//! Interpreters:
//! - [`SyncInterpreter`] runs on the calling thread
//! - [`ResultInterpreter`] runs on the calling thread and maps errors into the caller's type
//! - [`AsyncInterpreter`] runs on tokio's blocking pool
//! - [`ExecutorInterpreter`] runs on any [`TaskExecutor`] and returns a [`DbFuture`]

pub mod binder;
pub mod collect;
pub mod combinators;
pub mod error;
pub mod interpreter;
pub mod op;
pub mod ops;
pub mod prelude;
pub mod sql;
pub mod sqlite;

pub use rusqlite;

pub use binder::{Binder, NoBinder, Params};
pub use collect::{CanBuild, Collecting, ToVec};
pub use combinators::{sequence, to_chunks, to_result, unique};
pub use error::{DbError, Result};
pub use interpreter::{
    AsyncInterpreter, DbFuture, ExecutorInterpreter, ResultInterpreter, SyncInterpreter,
    TaskExecutor,
};
pub use op::{BoxDbOp, DbOp};
pub use sqlite::{Connection, ConnectionSource, SqliteOptions, SqlitePool};
