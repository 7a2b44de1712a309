use tracing::debug;

use crate::binder::{BatchResult, execute_batch, sum_batch_counts};
use crate::error::{DbError, Result};
use crate::op::DbOp;
use crate::sql::{StatementKind, statement_kind};
use crate::sqlite::{Connection, Statement};

/// Executes one statement per element as a single batch and totals the affected rows.
///
/// Anything but an `INSERT` is refused while the connection is in autocommit mode: a batch
/// update or delete there is neither atomic nor fast. Run those through `transact`.
pub struct BatchUpdateOp<A, F> {
    sql: String,
    elements: Vec<A>,
    bind_one: F,
}

impl<A, F> BatchUpdateOp<A, F>
where
    F: Fn(&A, &mut Statement<'_>) -> Result<()>,
{
    pub fn new(sql: impl Into<String>, elements: Vec<A>, bind_one: F) -> Self {
        Self {
            sql: sql.into(),
            elements,
            bind_one,
        }
    }
}

impl<A, F> DbOp for BatchUpdateOp<A, F>
where
    F: Fn(&A, &mut Statement<'_>) -> Result<()>,
{
    type Output = BatchResult;

    /// # Errors
    /// Returns `DbError::BatchMutationInAutocommit` before preparing anything when the
    /// statement is not an insert and autocommit is on, or the batch-code errors of
    /// [`sum_batch_counts`].
    fn run(&self, conn: &mut Connection) -> Result<BatchResult> {
        if statement_kind(&self.sql) != StatementKind::Insert && conn.autocommit() {
            return Err(DbError::BatchMutationInAutocommit);
        }
        if self.elements.is_empty() {
            return Ok(Some(0));
        }

        let mut stmt = conn.prepare(&self.sql)?;
        let codes = execute_batch(&mut stmt, &self.elements, &self.bind_one, |_, _| {})?;
        let result = sum_batch_counts(&codes)?;
        debug!(sql = %self.sql, elements = codes.len(), ?result, "batch executed");
        Ok(result)
    }
}

impl<A, F> std::fmt::Debug for BatchUpdateOp<A, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchUpdateOp")
            .field("sql", &self.sql)
            .field("elements", &self.elements.len())
            .finish_non_exhaustive()
    }
}
