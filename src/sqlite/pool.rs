use std::fmt;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::error::{DbError, Result};

use super::config::SqliteOptions;
use super::connection::Connection;
use super::source::ConnectionSource;

/// An r2d2 pool of `SQLite` connections.
///
/// Pool threads may check connections out concurrently; each checked-out connection belongs to
/// one interpretation until it is dropped and returned.
#[derive(Clone)]
pub struct SqlitePool {
    pool: Pool<SqliteConnectionManager>,
    opts: SqliteOptions,
}

impl SqlitePool {
    /// Create the pool and open its initial connections.
    ///
    /// # Errors
    /// Returns `DbError::ConfigError` for a zero pool size, or `DbError::ConnectionError` if
    /// the pool cannot be built.
    pub fn new(opts: SqliteOptions) -> Result<Self> {
        if opts.pool_size == 0 {
            return Err(DbError::ConfigError("pool_size must be at least 1".into()));
        }

        let init_opts = opts.clone();
        let manager = SqliteConnectionManager::file(&opts.db_path)
            .with_init(move |conn| init_opts.apply_pragmas(conn));

        info!(db_path = %opts.db_path, pool_size = opts.pool_size, "creating sqlite pool");
        let pool = Pool::builder()
            .max_size(opts.pool_size)
            .build(manager)
            .map_err(|e| DbError::ConnectionError(format!("Failed to create SQLite pool: {e}")))?;

        Ok(Self { pool, opts })
    }

    #[must_use]
    pub fn options(&self) -> &SqliteOptions {
        &self.opts
    }

    /// Connections currently open, idle or checked out.
    #[must_use]
    pub fn open_connections(&self) -> u32 {
        self.pool.state().connections
    }

    #[must_use]
    pub fn idle_connections(&self) -> u32 {
        self.pool.state().idle_connections
    }
}

impl ConnectionSource for SqlitePool {
    fn connection(&self) -> Result<Connection> {
        Ok(Connection::pooled(self.pool.get()?))
    }
}

impl fmt::Debug for SqlitePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlitePool")
            .field("db_path", &self.opts.db_path)
            .field("pool_size", &self.opts.pool_size)
            .finish()
    }
}
