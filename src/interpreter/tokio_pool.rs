use std::future::Future;
use std::panic;
use std::sync::Arc;

use tokio::runtime::Handle;

use crate::error::{DbError, Result};
use crate::op::DbOp;
use crate::sqlite::ConnectionSource;

use super::{Mode, interpret};

/// Runs operations on tokio's blocking pool.
///
/// Connection acquisition and the whole operation happen inside one `spawn_blocking` task, so
/// the awaiting task never blocks. Errors arrive unchanged; a panic in the operation is
/// resumed on the awaiting task.
#[derive(Debug)]
pub struct AsyncInterpreter<S> {
    source: Arc<S>,
    handle: Handle,
}

impl<S> Clone for AsyncInterpreter<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            handle: self.handle.clone(),
        }
    }
}

impl<S: ConnectionSource + 'static> AsyncInterpreter<S> {
    /// Create an interpreter on the current runtime.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    #[must_use]
    pub fn new(source: S) -> Self {
        Self::with_handle(source, Handle::current())
    }

    #[must_use]
    pub fn with_handle(source: S, handle: Handle) -> Self {
        Self {
            source: Arc::new(source),
            handle,
        }
    }

    /// Run `op` in autocommit mode on the blocking pool.
    pub fn submit<O>(&self, op: O) -> impl Future<Output = Result<O::Output>> + Send + 'static
    where
        O: DbOp + Send + 'static,
        O::Output: Send + 'static,
    {
        self.spawn(op, Mode::Submit)
    }

    /// Run `op` as one transaction on the blocking pool.
    pub fn transact<O>(&self, op: O) -> impl Future<Output = Result<O::Output>> + Send + 'static
    where
        O: DbOp + Send + 'static,
        O::Output: Send + 'static,
    {
        self.spawn(op, Mode::Transact)
    }

    fn spawn<O>(&self, op: O, mode: Mode) -> impl Future<Output = Result<O::Output>> + Send + 'static
    where
        O: DbOp + Send + 'static,
        O::Output: Send + 'static,
    {
        let source = Arc::clone(&self.source);
        let task = self
            .handle
            .spawn_blocking(move || interpret(&*source, &op, mode));
        async move {
            match task.await {
                Ok(result) => result,
                Err(e) if e.is_panic() => panic::resume_unwind(e.into_panic()),
                Err(_) => Err(DbError::Cancelled),
            }
        }
    }
}
