use std::fmt;
use std::ops::Deref;

use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use tracing::{trace, warn};

use crate::error::{DbError, Result};

use super::statement::Statement;

pub(crate) enum Handle {
    Owned(rusqlite::Connection),
    Pooled(PooledConnection<SqliteConnectionManager>),
}

impl Deref for Handle {
    type Target = rusqlite::Connection;

    fn deref(&self) -> &Self::Target {
        match self {
            Handle::Owned(conn) => conn,
            Handle::Pooled(conn) => &**conn,
        }
    }
}

/// A live `SQLite` session with a JDBC-style autocommit flag.
///
/// With autocommit on, every statement commits on its own. Switching autocommit off does not
/// touch the database; the next statement prepared through this connection opens the
/// transaction, and it stays open until [`commit`](Connection::commit) or
/// [`rollback`](Connection::rollback).
///
/// A connection is used by one operation tree at a time and is released when dropped. An open
/// transaction left behind at that point is rolled back so a pooled connection goes back clean.
pub struct Connection {
    handle: Handle,
    autocommit: bool,
}

impl Connection {
    /// Wrap an already opened rusqlite connection.
    #[must_use]
    pub fn from_rusqlite(conn: rusqlite::Connection) -> Self {
        Self::new(Handle::Owned(conn))
    }

    pub(crate) fn pooled(conn: PooledConnection<SqliteConnectionManager>) -> Self {
        Self::new(Handle::Pooled(conn))
    }

    fn new(handle: Handle) -> Self {
        trace!(pooled = matches!(handle, Handle::Pooled(_)), "connection acquired");
        Self {
            handle,
            autocommit: true,
        }
    }

    /// Open a private in-memory database. Mostly useful for tests and examples.
    ///
    /// # Errors
    /// Returns `DbError::SqliteError` if `SQLite` cannot open the database.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_rusqlite(rusqlite::Connection::open_in_memory()?))
    }

    #[must_use]
    pub fn autocommit(&self) -> bool {
        self.autocommit
    }

    /// Change the autocommit mode.
    ///
    /// Turning autocommit back on while a transaction is open commits that transaction.
    ///
    /// # Errors
    /// Returns `DbError::SqliteError` if the implicit commit fails.
    pub fn set_autocommit(&mut self, autocommit: bool) -> Result<()> {
        if autocommit && !self.autocommit && self.in_transaction() {
            self.handle.execute_batch("COMMIT")?;
        }
        self.autocommit = autocommit;
        Ok(())
    }

    /// True while a transaction is open on the underlying session.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        !self.handle.is_autocommit()
    }

    /// Commit the current transaction, if one has been opened.
    ///
    /// # Errors
    /// Returns `DbError::ExecutionError` when autocommit is on, or `DbError::SqliteError` if
    /// `COMMIT` fails.
    pub fn commit(&mut self) -> Result<()> {
        self.ensure_manual("commit")?;
        if self.in_transaction() {
            self.handle.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    /// Roll back the current transaction, if one has been opened.
    ///
    /// # Errors
    /// Returns `DbError::ExecutionError` when autocommit is on, or `DbError::SqliteError` if
    /// `ROLLBACK` fails.
    pub fn rollback(&mut self) -> Result<()> {
        self.ensure_manual("rollback")?;
        if self.in_transaction() {
            self.handle.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }

    /// Prepare a statement, opening the pending transaction first when autocommit is off.
    ///
    /// # Errors
    /// Returns `DbError::SqliteError` if `BEGIN` or statement preparation fails.
    pub fn prepare<'c>(&'c self, sql: &str) -> Result<Statement<'c>> {
        self.begin_if_pending()?;
        let inner = self.handle.prepare(sql)?;
        Ok(Statement::new(inner, &self.handle))
    }

    /// Run a script of semicolon separated statements without parameters.
    ///
    /// # Errors
    /// Returns `DbError::SqliteError` if any statement fails.
    pub fn execute_script(&self, sql: &str) -> Result<()> {
        self.begin_if_pending()?;
        self.handle.execute_batch(sql)?;
        Ok(())
    }

    /// Borrow the raw rusqlite connection for driver features this crate does not wrap.
    ///
    /// In manual mode the pending transaction is opened first, so work done through the
    /// raw handle commits or rolls back with everything else.
    ///
    /// # Errors
    /// Returns `DbError::SqliteError` if `BEGIN` fails.
    pub fn raw(&self) -> Result<&rusqlite::Connection> {
        self.begin_if_pending()?;
        Ok(&self.handle)
    }

    fn begin_if_pending(&self) -> Result<()> {
        if !self.autocommit && !self.in_transaction() {
            self.handle.execute_batch("BEGIN")?;
        }
        Ok(())
    }

    fn ensure_manual(&self, action: &str) -> Result<()> {
        if self.autocommit {
            return Err(DbError::ExecutionError(format!(
                "cannot {action} while auto commit is true"
            )));
        }
        Ok(())
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if self.in_transaction() {
            warn!("connection released with an open transaction; rolling back");
            if let Err(e) = self.handle.execute_batch("ROLLBACK") {
                warn!(error = %e, "rollback on release failed");
            }
        }
        trace!("connection released");
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("pooled", &matches!(self.handle, Handle::Pooled(_)))
            .field("autocommit", &self.autocommit)
            .field("in_transaction", &self.in_transaction())
            .finish()
    }
}
