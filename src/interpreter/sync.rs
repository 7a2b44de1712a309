use crate::error::Result;
use crate::op::DbOp;
use crate::sqlite::ConnectionSource;

use super::{Mode, interpret};

/// Runs operations on the calling thread.
#[derive(Debug, Clone)]
pub struct SyncInterpreter<S> {
    source: S,
}

impl<S: ConnectionSource> SyncInterpreter<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run `op` in autocommit mode.
    ///
    /// # Errors
    /// The original error from acquisition or from the operation.
    pub fn submit<O: DbOp + ?Sized>(&self, op: &O) -> Result<O::Output> {
        interpret(&self.source, op, Mode::Submit)
    }

    /// Run `op` as one transaction.
    ///
    /// # Errors
    /// The original error from acquisition, the operation, or the transaction protocol.
    pub fn transact<O: DbOp + ?Sized>(&self, op: &O) -> Result<O::Output> {
        interpret(&self.source, op, Mode::Transact)
    }
}
