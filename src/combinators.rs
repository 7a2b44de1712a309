//! Operations built from other operations: cardinality checks, sequencing, chunking and
//! error materialization.

use std::slice::Chunks;

use crate::collect::{CanBuild, ToVec};
use crate::error::{DbError, Result};
use crate::op::DbOp;
use crate::sqlite::Connection;

/// See [`unique`].
#[derive(Debug, Clone)]
pub struct Unique<O> {
    op: O,
}

/// Collapse a collection-valued operation to at most one element.
///
/// Zero elements yield `None` and one yields `Some`. More than one is a
/// `DbError::NotUnique` failure: a lookup by key that matches several rows is a bug in the
/// query, not a result.
pub fn unique<O>(op: O) -> Unique<O>
where
    O: DbOp,
    O::Output: IntoIterator,
{
    Unique { op }
}

impl<O> DbOp for Unique<O>
where
    O: DbOp,
    O::Output: IntoIterator,
{
    type Output = Option<<O::Output as IntoIterator>::Item>;

    fn run(&self, conn: &mut Connection) -> Result<Self::Output> {
        let mut it = self.op.run(conn)?.into_iter();
        let Some(first) = it.next() else {
            return Ok(None);
        };
        if it.next().is_some() {
            return Err(DbError::NotUnique);
        }
        Ok(Some(first))
    }
}

/// See [`sequence`].
#[derive(Debug, Clone)]
pub struct Sequence<O, C> {
    ops: Vec<O>,
    cbf: C,
}

/// Run `ops` one after another on the same connection and collect their results in order.
/// The first failure stops the sequence.
pub fn sequence<O: DbOp>(ops: Vec<O>) -> Sequence<O, ToVec> {
    Sequence { ops, cbf: ToVec }
}

/// [`sequence`] collecting with a caller-chosen strategy.
pub fn sequence_with<O, C>(ops: Vec<O>, cbf: C) -> Sequence<O, C>
where
    O: DbOp,
    C: CanBuild<O::Output>,
{
    Sequence { ops, cbf }
}

impl<O, C> DbOp for Sequence<O, C>
where
    O: DbOp,
    C: CanBuild<O::Output>,
{
    type Output = C::Output;

    fn run(&self, conn: &mut Connection) -> Result<C::Output> {
        let mut buffer = self.cbf.create_buffer();
        for op in &self.ops {
            self.cbf.add(&mut buffer, op.run(conn)?);
        }
        Ok(self.cbf.build(buffer))
    }
}

/// Split `elements` into ordered chunks of at most `size`. Empty input gives no chunks.
///
/// # Errors
/// Returns `DbError::InvalidChunkSize` if `size` is zero.
pub fn chunks<A>(elements: &[A], size: usize) -> Result<Chunks<'_, A>> {
    if size < 1 {
        return Err(DbError::InvalidChunkSize(size));
    }
    Ok(elements.chunks(size))
}

/// Run `per_chunk` over every chunk of `elements` on `conn` and sum the counts.
pub(crate) fn run_chunks<A, F>(
    conn: &mut Connection,
    elements: &[A],
    size: usize,
    mut per_chunk: F,
) -> Result<usize>
where
    F: FnMut(&[A], &mut Connection) -> Result<usize>,
{
    let mut total = 0;
    for chunk in chunks(elements, size)? {
        total += per_chunk(chunk, conn)?;
    }
    Ok(total)
}

/// See [`to_chunks`].
pub struct ToChunks<A, F> {
    elements: Vec<A>,
    chunk_size: usize,
    build: F,
}

/// One logical operation over a collection too large for a single statement.
///
/// `build` makes the operation for each chunk of at most `chunk_size` elements; the chunks
/// run in order on one connection and their counts are summed. With no elements `build` is
/// never called and the result is 0. A zero `chunk_size` fails when the operation runs.
pub fn to_chunks<A, O, F>(elements: Vec<A>, chunk_size: usize, build: F) -> ToChunks<A, F>
where
    O: DbOp<Output = usize>,
    F: Fn(&[A]) -> O,
{
    ToChunks {
        elements,
        chunk_size,
        build,
    }
}

impl<A, O, F> DbOp for ToChunks<A, F>
where
    O: DbOp<Output = usize>,
    F: Fn(&[A]) -> O,
{
    type Output = usize;

    fn run(&self, conn: &mut Connection) -> Result<usize> {
        run_chunks(conn, &self.elements, self.chunk_size, |chunk, conn| {
            (self.build)(chunk).run(conn)
        })
    }
}

impl<A, F> std::fmt::Debug for ToChunks<A, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToChunks")
            .field("elements", &self.elements.len())
            .field("chunk_size", &self.chunk_size)
            .finish_non_exhaustive()
    }
}

/// See [`to_result`].
#[derive(Debug, Clone)]
pub struct ToResult<O, F> {
    op: O,
    map_err: F,
}

/// Materialize failures of `op` as a value: `Ok(Ok(a))` on success, `Ok(Err(map_err(e)))`
/// on failure. Panics are not caught.
pub fn to_result<O, E, F>(op: O, map_err: F) -> ToResult<O, F>
where
    O: DbOp,
    F: Fn(DbError) -> E,
{
    ToResult { op, map_err }
}

impl<O, E, F> DbOp for ToResult<O, F>
where
    O: DbOp,
    F: Fn(DbError) -> E,
{
    type Output = std::result::Result<O::Output, E>;

    fn run(&self, conn: &mut Connection) -> Result<Self::Output> {
        Ok(self.op.run(conn).map_err(&self.map_err))
    }
}
