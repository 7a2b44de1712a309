//! Convenient imports for common functionality.
//!
//! `use sql_ops::prelude::*;` brings in the operation trait, every operation constructor, the
//! combinators and the interpreters.

pub use crate::binder::{
    BatchResult, Binder, NoBinder, Params, binder_fn, iterable_binder, sum_batch_counts,
};
pub use crate::collect::{CanBuild, Collecting, ToVec};
pub use crate::combinators::{chunks, sequence, sequence_with, to_chunks, to_result, unique};
pub use crate::error::DbError;
pub use crate::interpreter::{
    AsyncInterpreter, DbFuture, ExecutorInterpreter, Mode, ResultInterpreter, SyncInterpreter,
    Task, TaskExecutor, ThreadSpawner, TransactionControl, interpret, run_transactional,
    transactional,
};
pub use crate::op::{BoxDbOp, DbOp, fail, from_fn, unit};
pub use crate::ops::{
    AggregateOp, BatchDeleteOptimized, BatchInsertGenKeysOp, BatchUpdateOp, EffectOp,
    ExplainReport, FoldOp, InsertGenKeyOp, QueryObserver, SelectOp, TracingObserver, UpdateOp,
    batch_insert_gen_keys_vec, insert_gen_key_i64, select_vec,
};
pub use crate::sql::{StatementKind, placeholder_rows, placeholders, statement_kind};
pub use crate::sqlite::{
    Connection, ConnectionSource, GeneratedKey, SqliteOptions, SqliteOptionsBuilder, SqlitePool,
    SqliteSource, Statement,
};
