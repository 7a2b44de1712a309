use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::warn;

use crate::error::{DbError, Result};
use crate::op::DbOp;
use crate::sqlite::ConnectionSource;

use super::{Mode, interpret};

/// A unit of work handed to an executor.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Anything that can run a task somewhere else.
pub trait TaskExecutor: Send + Sync {
    /// Schedule `task`. An executor that drops the task without running it resolves the
    /// corresponding [`DbFuture`] to `DbError::Cancelled`.
    ///
    /// # Errors
    /// Returns an error if the task could not be scheduled at all.
    fn execute(&self, task: Task) -> Result<()>;
}

impl TaskExecutor for Handle {
    fn execute(&self, task: Task) -> Result<()> {
        drop(self.spawn_blocking(task));
        Ok(())
    }
}

/// Runs every task on a fresh named OS thread.
#[derive(Debug, Clone)]
pub struct ThreadSpawner {
    name: String,
}

impl ThreadSpawner {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for ThreadSpawner {
    fn default() -> Self {
        Self::new("sql-ops-worker")
    }
}

impl TaskExecutor for ThreadSpawner {
    fn execute(&self, task: Task) -> Result<()> {
        thread::Builder::new()
            .name(self.name.clone())
            .spawn(task)
            .map(drop)
            .map_err(|err| DbError::ExecutionError(format!("failed to spawn worker thread: {err}")))
    }
}

type Outcome<A> = thread::Result<Result<A>>;

enum State<A> {
    Pending(oneshot::Receiver<Outcome<A>>),
    Failed(Option<DbError>),
}

/// The eventual result of an operation submitted through an [`ExecutorInterpreter`].
///
/// Await it from async code or [`wait`](DbFuture::wait) for it from a plain thread.
pub struct DbFuture<A> {
    state: State<A>,
}

impl<A> DbFuture<A> {
    fn pending(rx: oneshot::Receiver<Outcome<A>>) -> Self {
        Self {
            state: State::Pending(rx),
        }
    }

    fn failed(err: DbError) -> Self {
        Self {
            state: State::Failed(Some(err)),
        }
    }

    /// Block the current thread until the operation finishes.
    ///
    /// # Errors
    /// The operation's original error, or `DbError::Cancelled` if the task was dropped.
    ///
    /// # Panics
    /// Resumes a panic raised by the operation. Like any blocking wait, must not be called
    /// from inside an async runtime.
    pub fn wait(self) -> Result<A> {
        match self.state {
            State::Pending(mut rx) => settle(rx.blocking_recv()),
            State::Failed(err) => Err(err.unwrap_or(DbError::Cancelled)),
        }
    }
}

fn settle<A>(received: std::result::Result<Outcome<A>, oneshot::error::RecvError>) -> Result<A> {
    match received {
        Ok(Ok(result)) => result,
        Ok(Err(payload)) => panic::resume_unwind(payload),
        Err(_) => Err(DbError::Cancelled),
    }
}

impl<A> Future for DbFuture<A> {
    type Output = Result<A>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match &mut this.state {
            State::Pending(rx) => Pin::new(rx).poll(cx).map(settle),
            State::Failed(err) => Poll::Ready(Err(err.take().unwrap_or(DbError::Cancelled))),
        }
    }
}

impl<A> fmt::Debug for DbFuture<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            State::Pending(_) => "pending",
            State::Failed(_) => "failed",
        };
        f.debug_struct("DbFuture").field("state", &state).finish()
    }
}

/// Runs operations on a caller-supplied [`TaskExecutor`] and hands back [`DbFuture`]s.
pub struct ExecutorInterpreter<S, X> {
    source: Arc<S>,
    executor: X,
}

impl<S, X> ExecutorInterpreter<S, X>
where
    S: ConnectionSource + 'static,
    X: TaskExecutor,
{
    pub fn new(source: S, executor: X) -> Self {
        Self {
            source: Arc::new(source),
            executor,
        }
    }

    /// Run `op` in autocommit mode on the executor.
    pub fn submit<O>(&self, op: O) -> DbFuture<O::Output>
    where
        O: DbOp + Send + 'static,
        O::Output: Send + 'static,
    {
        self.spawn(op, Mode::Submit)
    }

    /// Run `op` as one transaction on the executor.
    pub fn transact<O>(&self, op: O) -> DbFuture<O::Output>
    where
        O: DbOp + Send + 'static,
        O::Output: Send + 'static,
    {
        self.spawn(op, Mode::Transact)
    }

    fn spawn<O>(&self, op: O, mode: Mode) -> DbFuture<O::Output>
    where
        O: DbOp + Send + 'static,
        O::Output: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let source = Arc::clone(&self.source);
        let task: Task = Box::new(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| interpret(&*source, &op, mode)));
            if tx.send(outcome).is_err() {
                warn!(?mode, "operation finished after its future was dropped");
            }
        });

        match self.executor.execute(task) {
            Ok(()) => DbFuture::pending(rx),
            Err(err) => DbFuture::failed(err),
        }
    }
}

impl<S, X: fmt::Debug> fmt::Debug for ExecutorInterpreter<S, X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorInterpreter")
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::{fail, unit};
    use crate::sqlite::Connection;

    fn source() -> impl ConnectionSource + 'static {
        Connection::open_in_memory
    }

    struct Dropping;

    impl TaskExecutor for Dropping {
        fn execute(&self, task: Task) -> Result<()> {
            drop(task);
            Ok(())
        }
    }

    struct Refusing;

    impl TaskExecutor for Refusing {
        fn execute(&self, _task: Task) -> Result<()> {
            Err(DbError::ExecutionError("queue full".into()))
        }
    }

    #[test]
    fn thread_spawner_delivers_result() {
        let interp = ExecutorInterpreter::new(source(), ThreadSpawner::default());
        assert_eq!(interp.submit(unit(3)).wait().unwrap(), 3);
        let err = interp
            .transact(fail::<i32, _>(|| DbError::EmptyResult))
            .wait()
            .unwrap_err();
        assert!(matches!(err, DbError::EmptyResult));
    }

    #[test]
    fn dropped_task_is_cancelled() {
        let interp = ExecutorInterpreter::new(source(), Dropping);
        assert!(matches!(
            interp.submit(unit(1)).wait(),
            Err(DbError::Cancelled)
        ));
    }

    #[test]
    fn refused_task_reports_executor_error() {
        let interp = ExecutorInterpreter::new(source(), Refusing);
        assert!(matches!(
            interp.submit(unit(1)).wait(),
            Err(DbError::ExecutionError(m)) if m == "queue full"
        ));
    }

    #[test]
    fn panic_is_resumed_on_wait() {
        let interp = ExecutorInterpreter::new(source(), ThreadSpawner::default());
        let op = crate::op::from_fn(|_| -> Result<()> { panic!("fatal in task") });
        let payload = panic::catch_unwind(AssertUnwindSafe(|| interp.submit(op).wait())).unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"fatal in task"));
    }
}
