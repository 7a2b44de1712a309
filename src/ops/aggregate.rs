use std::sync::Arc;

use crate::binder::Binder;
use crate::error::{DbError, Result};
use crate::op::DbOp;
use crate::sqlite::Connection;

use super::explain::QueryObserver;
use super::select::query_rows;

/// A query expected to return exactly one row whose first column is an integer,
/// e.g. `SELECT COUNT(*) ...`.
pub struct AggregateOp<B> {
    sql: String,
    binder: B,
    observer: Option<Arc<dyn QueryObserver>>,
}

impl<B: Binder> AggregateOp<B> {
    pub fn new(sql: impl Into<String>, binder: B) -> Self {
        Self {
            sql: sql.into(),
            binder,
            observer: None,
        }
    }

    #[must_use]
    pub fn explain(mut self, observer: Arc<dyn QueryObserver>) -> Self {
        self.observer = Some(observer);
        self
    }
}

impl<B: Binder> DbOp for AggregateOp<B> {
    type Output = i64;

    /// # Errors
    /// Returns `DbError::EmptyResult` for no rows and `DbError::MoreThanOneRow` for several.
    fn run(&self, conn: &mut Connection) -> Result<i64> {
        query_rows(conn, &self.sql, &self.binder, self.observer.as_deref(), |rows| {
            let value: i64 = match rows.next()? {
                Some(row) => row.get(0)?,
                None => return Err(DbError::EmptyResult),
            };
            if rows.next()?.is_some() {
                return Err(DbError::MoreThanOneRow);
            }
            Ok(value)
        })
    }
}

impl<B> std::fmt::Debug for AggregateOp<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregateOp")
            .field("sql", &self.sql)
            .finish_non_exhaustive()
    }
}
