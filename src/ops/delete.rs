use tracing::debug;

use crate::binder::bind_all;
use crate::combinators::run_chunks;
use crate::error::Result;
use crate::op::DbOp;
use crate::sql::placeholder_rows;
use crate::sqlite::{Connection, Statement};

/// Deletes rows by composite key with one wide `IN` statement per chunk of keys.
///
/// Each chunk becomes `DELETE FROM <table> WHERE (<columns>) IN (VALUES (?, ..), ..)`, bound
/// by `bind_one(position, stmt, key)` which returns the next free position. Keeping chunks
/// small keeps each statement under the backend's parameter limit.
pub struct BatchDeleteOptimized<A, F> {
    table: String,
    columns: Vec<String>,
    keys: Vec<A>,
    bind_one: F,
    chunk_size: usize,
}

impl<A, F> BatchDeleteOptimized<A, F>
where
    F: Fn(usize, &mut Statement<'_>, &A) -> Result<usize>,
{
    pub fn new(
        table: impl Into<String>,
        columns: Vec<String>,
        keys: Vec<A>,
        bind_one: F,
        chunk_size: usize,
    ) -> Self {
        Self {
            table: table.into(),
            columns,
            keys,
            bind_one,
            chunk_size,
        }
    }

    fn chunk_sql(&self, rows: usize) -> Result<String> {
        Ok(format!(
            "DELETE FROM {} WHERE ({}) IN (VALUES {})",
            self.table,
            self.columns.join(", "),
            placeholder_rows(rows, self.columns.len())?
        ))
    }
}

impl<A, F> DbOp for BatchDeleteOptimized<A, F>
where
    F: Fn(usize, &mut Statement<'_>, &A) -> Result<usize>,
{
    type Output = usize;

    /// # Errors
    /// Returns `DbError::InvalidChunkSize` for a zero chunk size and
    /// `DbError::ExecutionError` when no key columns were given.
    fn run(&self, conn: &mut Connection) -> Result<usize> {
        let deleted = run_chunks(conn, &self.keys, self.chunk_size, |chunk, conn| {
            let sql = self.chunk_sql(chunk.len())?;
            let mut stmt = conn.prepare(&sql)?;
            bind_all(&mut stmt, chunk, &self.bind_one)?;
            stmt.execute()
        })?;
        debug!(table = %self.table, keys = self.keys.len(), deleted, "batch delete executed");
        Ok(deleted)
    }
}

impl<A, F> std::fmt::Debug for BatchDeleteOptimized<A, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchDeleteOptimized")
            .field("table", &self.table)
            .field("columns", &self.columns)
            .field("keys", &self.keys.len())
            .field("chunk_size", &self.chunk_size)
            .finish_non_exhaustive()
    }
}
