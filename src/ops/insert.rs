use tracing::debug;

use crate::binder::{Binder, execute_batch};
use crate::collect::{CanBuild, ToVec};
use crate::error::{DbError, Result};
use crate::op::DbOp;
use crate::sqlite::{Connection, GeneratedKey, Statement};

/// Inserts one row and extracts the key the database generated for it.
pub struct InsertGenKeyOp<B, K> {
    sql: String,
    binder: B,
    extract: K,
}

impl<B, K> InsertGenKeyOp<B, K> {
    pub fn new<A>(sql: impl Into<String>, binder: B, extract: K) -> Self
    where
        B: Binder,
        K: Fn(&GeneratedKey) -> Result<A>,
    {
        Self {
            sql: sql.into(),
            binder,
            extract,
        }
    }
}

/// An [`InsertGenKeyOp`] reading the key as an `i64`.
pub fn insert_gen_key_i64<B: Binder>(
    sql: impl Into<String>,
    binder: B,
) -> InsertGenKeyOp<B, fn(&GeneratedKey) -> Result<i64>> {
    InsertGenKeyOp::new(sql, binder, read_i64 as fn(&GeneratedKey) -> Result<i64>)
}

fn read_i64(key: &GeneratedKey) -> Result<i64> {
    key.get(1)
}

impl<A, B, K> DbOp for InsertGenKeyOp<B, K>
where
    B: Binder,
    K: Fn(&GeneratedKey) -> Result<A>,
{
    type Output = A;

    /// # Errors
    /// Returns `DbError::NoRowsInserted` if the statement affected no rows, and
    /// `DbError::NoGeneratedKeys` if it inserted without assigning a new rowid, as a
    /// `WITHOUT ROWID` table does.
    fn run(&self, conn: &mut Connection) -> Result<A> {
        let mut stmt = conn.prepare(&self.sql)?;
        self.binder.bind(&mut stmt)?;
        let before = stmt.last_insert_rowid();
        let count = stmt.execute()?;
        if count < 1 {
            return Err(DbError::NoRowsInserted);
        }
        if stmt.last_insert_rowid() == before {
            return Err(DbError::NoGeneratedKeys);
        }
        let key = GeneratedKey::new(stmt.last_insert_rowid());
        debug!(sql = %self.sql, rowid = key.rowid(), "row inserted");
        (self.extract)(&key)
    }
}

impl<B, K> std::fmt::Debug for InsertGenKeyOp<B, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsertGenKeyOp")
            .field("sql", &self.sql)
            .finish_non_exhaustive()
    }
}

/// Inserts one row per element and collects the generated keys, in input order.
///
/// Elements whose insert affected no rows, or left the last inserted rowid unchanged,
/// contribute no key. Empty input yields an empty
/// collection without preparing anything.
pub struct BatchInsertGenKeysOp<A, F, K, C> {
    sql: String,
    elements: Vec<A>,
    bind_one: F,
    extract: K,
    cbf: C,
}

impl<A, F, K, C> BatchInsertGenKeysOp<A, F, K, C> {
    pub fn new<T>(sql: impl Into<String>, elements: Vec<A>, bind_one: F, extract: K, cbf: C) -> Self
    where
        F: Fn(&A, &mut Statement<'_>) -> Result<()>,
        K: Fn(&GeneratedKey) -> Result<T>,
        C: CanBuild<T>,
    {
        Self {
            sql: sql.into(),
            elements,
            bind_one,
            extract,
            cbf,
        }
    }
}

/// A [`BatchInsertGenKeysOp`] collecting `i64` keys into a `Vec`.
pub fn batch_insert_gen_keys_vec<A, F>(
    sql: impl Into<String>,
    elements: Vec<A>,
    bind_one: F,
) -> BatchInsertGenKeysOp<A, F, fn(&GeneratedKey) -> Result<i64>, ToVec>
where
    F: Fn(&A, &mut Statement<'_>) -> Result<()>,
{
    BatchInsertGenKeysOp::new(
        sql,
        elements,
        bind_one,
        read_i64 as fn(&GeneratedKey) -> Result<i64>,
        ToVec,
    )
}

impl<A, T, F, K, C> DbOp for BatchInsertGenKeysOp<A, F, K, C>
where
    F: Fn(&A, &mut Statement<'_>) -> Result<()>,
    K: Fn(&GeneratedKey) -> Result<T>,
    C: CanBuild<T>,
{
    type Output = C::Output;

    /// # Errors
    /// Returns `DbError::NoGeneratedKeys` if no element produced a key.
    fn run(&self, conn: &mut Connection) -> Result<C::Output> {
        let mut buffer = self.cbf.create_buffer();
        if self.elements.is_empty() {
            return Ok(self.cbf.build(buffer));
        }

        let mut stmt = conn.prepare(&self.sql)?;
        let mut keys = Vec::with_capacity(self.elements.len());
        let mut last = stmt.last_insert_rowid();
        execute_batch(&mut stmt, &self.elements, &self.bind_one, |stmt, count| {
            let rowid = stmt.last_insert_rowid();
            if count > 0 && rowid != last {
                keys.push(GeneratedKey::new(rowid));
            }
            last = rowid;
        })?;
        if keys.is_empty() {
            return Err(DbError::NoGeneratedKeys);
        }

        debug!(sql = %self.sql, keys = keys.len(), "batch inserted");
        for key in &keys {
            self.cbf.add(&mut buffer, (self.extract)(key)?);
        }
        Ok(self.cbf.build(buffer))
    }
}

impl<A, F, K, C> std::fmt::Debug for BatchInsertGenKeysOp<A, F, K, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchInsertGenKeysOp")
            .field("sql", &self.sql)
            .field("elements", &self.elements.len())
            .finish_non_exhaustive()
    }
}
