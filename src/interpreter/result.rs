use crate::error::DbError;
use crate::op::DbOp;
use crate::sqlite::ConnectionSource;

use super::{Mode, interpret};

/// Runs operations on the calling thread and returns failures as the caller's error type.
///
/// Every `DbError` goes through `map_err`; panics are not caught.
pub struct ResultInterpreter<S, F> {
    source: S,
    map_err: F,
}

impl<S, F, E> ResultInterpreter<S, F>
where
    S: ConnectionSource,
    F: Fn(DbError) -> E,
{
    pub fn new(source: S, map_err: F) -> Self {
        Self { source, map_err }
    }

    /// Run `op` in autocommit mode.
    ///
    /// # Errors
    /// The mapped error from acquisition or from the operation.
    pub fn submit<O: DbOp + ?Sized>(&self, op: &O) -> Result<O::Output, E> {
        interpret(&self.source, op, Mode::Submit).map_err(&self.map_err)
    }

    /// Run `op` as one transaction.
    ///
    /// # Errors
    /// The mapped error from acquisition, the operation, or the transaction protocol.
    pub fn transact<O: DbOp + ?Sized>(&self, op: &O) -> Result<O::Output, E> {
        interpret(&self.source, op, Mode::Transact).map_err(&self.map_err)
    }
}

impl<S: std::fmt::Debug, F> std::fmt::Debug for ResultInterpreter<S, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultInterpreter")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
