use tracing::debug;

use crate::binder::Binder;
use crate::error::Result;
use crate::op::DbOp;
use crate::sqlite::Connection;

/// Binds and executes one statement, yielding the affected-row count.
#[derive(Debug, Clone)]
pub struct UpdateOp<B> {
    sql: String,
    binder: B,
}

impl<B: Binder> UpdateOp<B> {
    pub fn new(sql: impl Into<String>, binder: B) -> Self {
        Self {
            sql: sql.into(),
            binder,
        }
    }
}

impl<B: Binder> DbOp for UpdateOp<B> {
    type Output = usize;

    fn run(&self, conn: &mut Connection) -> Result<usize> {
        let mut stmt = conn.prepare(&self.sql)?;
        self.binder.bind(&mut stmt)?;
        let count = stmt.execute()?;
        debug!(sql = %self.sql, count, "update executed");
        Ok(count)
    }
}

/// A parameterless statement run for its effect, such as DDL.
#[derive(Debug, Clone)]
pub struct EffectOp {
    sql: String,
}

impl EffectOp {
    pub fn new(sql: impl Into<String>) -> Self {
        Self { sql: sql.into() }
    }
}

impl DbOp for EffectOp {
    type Output = ();

    fn run(&self, conn: &mut Connection) -> Result<()> {
        let mut stmt = conn.prepare(&self.sql)?;
        stmt.execute()?;
        Ok(())
    }
}
