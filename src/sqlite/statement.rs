use rusqlite::ToSql;
use rusqlite::types::{FromSql, Type, ValueRef};

use crate::error::{DbError, Result};

/// A prepared statement handed to binders.
///
/// Binders only write input parameters; executing the statement and reading its rows is left
/// to the operation that owns it.
pub struct Statement<'c> {
    inner: rusqlite::Statement<'c>,
    conn: &'c rusqlite::Connection,
}

impl<'c> Statement<'c> {
    pub(crate) fn new(inner: rusqlite::Statement<'c>, conn: &'c rusqlite::Connection) -> Self {
        Self { inner, conn }
    }

    /// Bind `value` to the parameter at `position`, counting from 1.
    ///
    /// Bindings survive execution, so a batch that rebinds only some positions keeps the
    /// previous values for the others.
    ///
    /// # Errors
    /// Returns `DbError::SqliteError` if the position is out of range or the value cannot be
    /// converted.
    pub fn bind<T: ToSql>(&mut self, position: usize, value: T) -> Result<()> {
        self.inner.raw_bind_parameter(position, value)?;
        Ok(())
    }

    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.inner.parameter_count()
    }

    pub(crate) fn column_names(&self) -> Vec<String> {
        self.inner
            .column_names()
            .iter()
            .map(std::string::ToString::to_string)
            .collect()
    }

    pub(crate) fn execute(&mut self) -> Result<usize> {
        Ok(self.inner.raw_execute()?)
    }

    pub(crate) fn query(&mut self) -> rusqlite::Rows<'_> {
        self.inner.raw_query()
    }

    pub(crate) fn last_insert_rowid(&self) -> i64 {
        self.conn.last_insert_rowid()
    }
}

/// A key the database assigned to an inserted row.
///
/// `SQLite` reports the rowid of the row just inserted; it reads as column 1 of a one-column
/// generated-keys row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratedKey {
    rowid: i64,
}

impl GeneratedKey {
    pub(crate) fn new(rowid: i64) -> Self {
        Self { rowid }
    }

    #[must_use]
    pub fn rowid(&self) -> i64 {
        self.rowid
    }

    /// Read the key column as `T`.
    ///
    /// # Errors
    /// Returns `DbError::SqliteError` if `position` is not 1 or the key does not fit `T`.
    pub fn get<T: FromSql>(&self, position: usize) -> Result<T> {
        if position != 1 {
            return Err(DbError::SqliteError(rusqlite::Error::InvalidColumnIndex(
                position,
            )));
        }
        T::column_result(ValueRef::Integer(self.rowid)).map_err(|e| {
            DbError::SqliteError(rusqlite::Error::FromSqlConversionFailure(
                0,
                Type::Integer,
                Box::new(e),
            ))
        })
    }
}
