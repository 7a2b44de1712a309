use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use rusqlite::{Row, Rows};

use crate::binder::Binder;
use crate::collect::{CanBuild, ToVec};
use crate::error::Result;
use crate::op::DbOp;
use crate::sqlite::Connection;

use super::explain::{QueryObserver, explain};

/// Prepare `sql`, bind it, and hand the cursor to `on_rows`.
///
/// With an observer, the plan is reported before the query runs and the elapsed time after
/// `on_rows` returns.
pub(crate) fn query_rows<B, T, F>(
    conn: &Connection,
    sql: &str,
    binder: &B,
    observer: Option<&dyn QueryObserver>,
    on_rows: F,
) -> Result<T>
where
    B: Binder + ?Sized,
    F: FnOnce(&mut Rows<'_>) -> Result<T>,
{
    if let Some(observer) = observer {
        let report = explain(conn, sql)?;
        observer.explained(sql, &report);
    }

    let started = Instant::now();
    let mut stmt = conn.prepare(sql)?;
    binder.bind(&mut stmt)?;
    let mut rows = stmt.query();
    let value = on_rows(&mut rows)?;

    if let Some(observer) = observer {
        observer.executed(sql, started.elapsed());
    }
    Ok(value)
}

/// Maps every row of a query and collects the results with a [`CanBuild`] strategy.
///
/// ```rust
/// use std::collections::BTreeSet;
/// use sql_ops::prelude::*;
///
/// let names = SelectOp::new(
///     "SELECT name FROM users WHERE age > ?",
///     Params(vec![18_i64.into()]),
///     |row| Ok(row.get::<_, String>(0)?),
///     Collecting::<BTreeSet<String>>::new(),
/// );
/// # let _ = names;
/// ```
pub struct SelectOp<B, M, C> {
    sql: String,
    binder: B,
    mapper: M,
    cbf: C,
    observer: Option<Arc<dyn QueryObserver>>,
}

impl<B, M, C> SelectOp<B, M, C> {
    pub fn new<A>(sql: impl Into<String>, binder: B, mapper: M, cbf: C) -> Self
    where
        B: Binder,
        M: Fn(&Row<'_>) -> Result<A>,
        C: CanBuild<A>,
    {
        Self {
            sql: sql.into(),
            binder,
            mapper,
            cbf,
            observer: None,
        }
    }

    /// Report the query plan and timing to `observer` on every run.
    #[must_use]
    pub fn explain(mut self, observer: Arc<dyn QueryObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }
}

/// A [`SelectOp`] collecting into a `Vec`.
pub fn select_vec<A, B, M>(sql: impl Into<String>, binder: B, mapper: M) -> SelectOp<B, M, ToVec>
where
    B: Binder,
    M: Fn(&Row<'_>) -> Result<A>,
{
    SelectOp::new(sql, binder, mapper, ToVec)
}

impl<A, B, M, C> DbOp for SelectOp<B, M, C>
where
    B: Binder,
    M: Fn(&Row<'_>) -> Result<A>,
    C: CanBuild<A>,
{
    type Output = C::Output;

    fn run(&self, conn: &mut Connection) -> Result<C::Output> {
        query_rows(conn, &self.sql, &self.binder, self.observer.as_deref(), |rows| {
            let mut buffer = self.cbf.create_buffer();
            while let Some(row) = rows.next()? {
                self.cbf.add(&mut buffer, (self.mapper)(row)?);
            }
            Ok(self.cbf.build(buffer))
        })
    }
}

impl<B, M, C> fmt::Debug for SelectOp<B, M, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectOp")
            .field("sql", &self.sql)
            .field("explain", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

/// Reduces the rows of a query with `fold(accumulator, row)`, starting from `zero`.
pub struct FoldOp<B, A, F> {
    sql: String,
    binder: B,
    zero: A,
    fold: F,
    observer: Option<Arc<dyn QueryObserver>>,
}

impl<B, A, F> FoldOp<B, A, F> {
    pub fn new(sql: impl Into<String>, binder: B, zero: A, fold: F) -> Self
    where
        B: Binder,
        A: Clone,
        F: Fn(A, &Row<'_>) -> Result<A>,
    {
        Self {
            sql: sql.into(),
            binder,
            zero,
            fold,
            observer: None,
        }
    }

    #[must_use]
    pub fn explain(mut self, observer: Arc<dyn QueryObserver>) -> Self {
        self.observer = Some(observer);
        self
    }
}

impl<B, A, F> DbOp for FoldOp<B, A, F>
where
    B: Binder,
    A: Clone,
    F: Fn(A, &Row<'_>) -> Result<A>,
{
    type Output = A;

    fn run(&self, conn: &mut Connection) -> Result<A> {
        query_rows(conn, &self.sql, &self.binder, self.observer.as_deref(), |rows| {
            let mut acc = self.zero.clone();
            while let Some(row) = rows.next()? {
                acc = (self.fold)(acc, row)?;
            }
            Ok(acc)
        })
    }
}

impl<B, A, F> fmt::Debug for FoldOp<B, A, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FoldOp")
            .field("sql", &self.sql)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::binder::{NoBinder, Params};
    use crate::collect::Collecting;

    fn seeded() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_script(
            "CREATE TABLE pets (name TEXT, kind TEXT);
             INSERT INTO pets VALUES ('rex', 'dog'), ('tom', 'cat'), ('fido', 'dog');",
        )
        .unwrap();
        conn
    }

    #[test]
    fn select_collects_in_row_order() {
        let op = select_vec(
            "SELECT name FROM pets WHERE kind = ? ORDER BY rowid",
            Params(vec!["dog".to_string().into()]),
            |row| Ok(row.get::<_, String>(0)?),
        );
        assert_eq!(op.run(&mut seeded()).unwrap(), vec!["rex", "fido"]);
    }

    #[test]
    fn fold_groups_without_materializing() {
        let op = FoldOp::new(
            "SELECT kind, name FROM pets ORDER BY rowid",
            NoBinder,
            BTreeMap::<String, Vec<String>>::new(),
            |mut acc, row| {
                acc.entry(row.get(0)?).or_default().push(row.get(1)?);
                Ok(acc)
            },
        );
        let grouped = op.run(&mut seeded()).unwrap();
        assert_eq!(grouped["dog"], vec!["rex", "fido"]);
        assert_eq!(grouped["cat"], vec!["tom"]);
    }

    #[test]
    fn collecting_strategy_changes_container_only() {
        let op = SelectOp::new(
            "SELECT kind FROM pets",
            NoBinder,
            |row| Ok(row.get::<_, String>(0)?),
            Collecting::<std::collections::BTreeSet<String>>::new(),
        );
        assert_eq!(op.run(&mut seeded()).unwrap().len(), 2);
    }
}
