// SQLite backend for the operation algebra.
//
// - config: connection options and their builder
// - connection: the session wrapper carrying the autocommit flag
// - statement: the prepared statement handed to binders, generated keys
// - source: where interpreters get connections from
// - pool: r2d2-backed pooled source

pub mod config;
pub mod connection;
pub mod pool;
pub mod source;
pub mod statement;

pub use config::{SqliteOptions, SqliteOptionsBuilder};
pub use connection::Connection;
pub use pool::SqlitePool;
pub use source::{ConnectionSource, SqliteSource};
pub use statement::{GeneratedKey, Statement};
