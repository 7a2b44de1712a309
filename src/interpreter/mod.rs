// Interpreters bind an operation to a connection from a `ConnectionSource`.
//
// - transaction: the commit/rollback/restore protocol shared by every `transact`
// - sync: runs on the calling thread
// - result: runs on the calling thread, mapping errors into the caller's type
// - tokio_pool: runs on tokio's blocking pool, returns a future
// - executor: runs on any `TaskExecutor`, returns a `DbFuture`

pub mod executor;
pub mod result;
pub mod sync;
pub mod tokio_pool;
pub mod transaction;

use tracing::trace;

use crate::error::Result;
use crate::op::DbOp;
use crate::sqlite::ConnectionSource;

pub use executor::{DbFuture, ExecutorInterpreter, Task, TaskExecutor, ThreadSpawner};
pub use result::ResultInterpreter;
pub use sync::SyncInterpreter;
pub use tokio_pool::AsyncInterpreter;
pub use transaction::{TransactionControl, Transactional, run_transactional, transactional};

/// How an interpretation treats transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Autocommit on; every statement commits by itself.
    Submit,
    /// The whole operation commits or rolls back as one.
    Transact,
}

/// Acquire a connection, run `op` under `mode`, and release the connection.
///
/// # Errors
/// Connection acquisition errors and whatever the operation or the transaction protocol
/// returns.
pub fn interpret<S, O>(source: &S, op: &O, mode: Mode) -> Result<O::Output>
where
    S: ConnectionSource + ?Sized,
    O: DbOp + ?Sized,
{
    let mut conn = source.connection()?;
    trace!(?mode, "interpreting operation");
    match mode {
        Mode::Submit => {
            conn.set_autocommit(true)?;
            op.run(&mut conn)
        }
        Mode::Transact => run_transactional(&mut conn, |conn| op.run(conn)),
    }
}
