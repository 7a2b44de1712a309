// Concrete operations over a single connection.
//
// - select: row-set and fold queries, plus the shared query path
// - aggregate: single integer result queries
// - explain: plan reports and the observer they go to
// - update: single statement mutations and DDL
// - insert: inserts returning generated keys
// - batch: batched updates with the autocommit guard
// - delete: chunked composite-key deletes

pub mod aggregate;
pub mod batch;
pub mod delete;
pub mod explain;
pub mod insert;
pub mod select;
pub mod update;

pub use aggregate::AggregateOp;
pub use batch::BatchUpdateOp;
pub use delete::BatchDeleteOptimized;
pub use explain::{ExplainReport, QueryObserver, TracingObserver};
pub use insert::{BatchInsertGenKeysOp, InsertGenKeyOp, batch_insert_gen_keys_vec, insert_gen_key_i64};
pub use select::{FoldOp, SelectOp, select_vec};
pub use update::{EffectOp, UpdateOp};
