use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, warn};

use crate::error::{DbError, Result};
use crate::op::DbOp;
use crate::sqlite::Connection;

/// The connection controls the transaction protocol needs.
pub trait TransactionControl {
    fn autocommit(&self) -> bool;

    /// # Errors
    /// Returns the backend error if the mode cannot be changed.
    fn set_autocommit(&mut self, autocommit: bool) -> Result<()>;

    /// # Errors
    /// Returns the backend error if the commit fails.
    fn commit(&mut self) -> Result<()>;

    /// # Errors
    /// Returns the backend error if the rollback fails.
    fn rollback(&mut self) -> Result<()>;
}

impl TransactionControl for Connection {
    fn autocommit(&self) -> bool {
        Connection::autocommit(self)
    }

    fn set_autocommit(&mut self, autocommit: bool) -> Result<()> {
        Connection::set_autocommit(self, autocommit)
    }

    fn commit(&mut self) -> Result<()> {
        Connection::commit(self)
    }

    fn rollback(&mut self) -> Result<()> {
        Connection::rollback(self)
    }
}

/// Run `body` as one transaction on `conn`.
///
/// Autocommit is switched off for the duration if it was on. Success commits; an error
/// rolls back and is returned as-is, or as `DbError::RollbackFailed` carrying both errors if
/// the rollback fails too. A panic rolls back, logging any rollback failure, and resumes
/// unwinding with the original payload.
///
/// Autocommit is restored afterwards: a failed restore becomes the error after a success,
/// and is logged after an error. When the rollback itself failed, autocommit stays off,
/// because turning it back on would commit whatever the transaction still holds. The
/// connection then rolls the leftover transaction back when it is released.
///
/// # Errors
/// The body's error, a commit error, or a restore error, as described above.
pub fn run_transactional<C, A, F>(conn: &mut C, body: F) -> Result<A>
where
    C: TransactionControl + ?Sized,
    F: FnOnce(&mut C) -> Result<A>,
{
    let was_autocommit = conn.autocommit();
    if was_autocommit {
        conn.set_autocommit(false)?;
    }

    let mut rollback_failed = false;
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(&mut *conn)));
    let result = match outcome {
        Ok(Ok(value)) => match conn.commit() {
            Ok(()) => {
                debug!("transaction committed");
                Ok(value)
            }
            Err(e) => Err(rollback_after(conn, e, &mut rollback_failed)),
        },
        Ok(Err(e)) => Err(rollback_after(conn, e, &mut rollback_failed)),
        Err(payload) => {
            match conn.rollback() {
                Ok(()) => {
                    debug!("transaction rolled back after a panic");
                    if was_autocommit {
                        if let Err(e) = conn.set_autocommit(true) {
                            error!(error = %e, "restoring autocommit failed while unwinding from a panic");
                        }
                    }
                }
                Err(e) => {
                    error!(error = %e, "rollback failed while unwinding from a panic; leaving autocommit off");
                }
            }
            panic::resume_unwind(payload);
        }
    };

    if !was_autocommit {
        return result;
    }
    if rollback_failed {
        warn!("rollback failed; leaving autocommit off so nothing is committed");
        return result;
    }
    match (result, conn.set_autocommit(true)) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(restore)) => Err(restore),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(restore)) => {
            warn!(error = %restore, "restoring autocommit failed after an earlier error");
            Err(e)
        }
    }
}

fn rollback_after<C: TransactionControl + ?Sized>(
    conn: &mut C,
    source: DbError,
    failed: &mut bool,
) -> DbError {
    match conn.rollback() {
        Ok(()) => {
            debug!(error = %source, "transaction rolled back");
            source
        }
        Err(rollback) => {
            *failed = true;
            DbError::RollbackFailed {
                source: Box::new(source),
                rollback: Box::new(rollback),
            }
        }
    }
}

/// See [`transactional`].
#[derive(Debug, Clone)]
pub struct Transactional<O> {
    op: O,
}

/// Wrap `op` so that running it runs [`run_transactional`] around it.
pub fn transactional<O: DbOp>(op: O) -> Transactional<O> {
    Transactional { op }
}

impl<O: DbOp> DbOp for Transactional<O> {
    type Output = O::Output;

    fn run(&self, conn: &mut Connection) -> Result<O::Output> {
        run_transactional(conn, |conn| self.op.run(conn))
    }
}
