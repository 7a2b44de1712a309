use tracing::debug;

use crate::error::Result;

use super::config::SqliteOptions;
use super::connection::Connection;

/// Anything that can hand out a live connection: a pool, a path to open, a test fixture.
///
/// Interpreters call [`connection`](ConnectionSource::connection) once per interpretation and
/// drop the connection when the interpretation ends. Closures returning
/// `Result<Connection>` are sources too.
pub trait ConnectionSource: Send + Sync {
    /// Acquire a connection.
    ///
    /// # Errors
    /// Returns whatever error prevented the connection from being opened or checked out.
    fn connection(&self) -> Result<Connection>;
}

impl<F> ConnectionSource for F
where
    F: Fn() -> Result<Connection> + Send + Sync,
{
    fn connection(&self) -> Result<Connection> {
        self()
    }
}

/// Opens a new connection to `db_path` on every call, without pooling.
#[derive(Debug, Clone)]
pub struct SqliteSource {
    opts: SqliteOptions,
}

impl SqliteSource {
    #[must_use]
    pub fn new(opts: SqliteOptions) -> Self {
        Self { opts }
    }

    #[must_use]
    pub fn options(&self) -> &SqliteOptions {
        &self.opts
    }
}

impl ConnectionSource for SqliteSource {
    fn connection(&self) -> Result<Connection> {
        debug!(db_path = %self.opts.db_path, "opening sqlite connection");
        let raw = rusqlite::Connection::open(&self.opts.db_path)?;
        self.opts.apply_pragmas(&raw)?;
        Ok(Connection::from_rusqlite(raw))
    }
}
