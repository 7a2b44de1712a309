use crate::error::Result;
use crate::sqlite::Connection;

use super::DbOp;

/// See [`unit`](super::unit).
#[derive(Debug, Clone)]
pub struct UnitOp<A> {
    value: A,
}

impl<A> UnitOp<A> {
    pub(crate) fn new(value: A) -> Self {
        Self { value }
    }
}

impl<A: Clone> DbOp for UnitOp<A> {
    type Output = A;

    fn run(&self, _conn: &mut Connection) -> Result<A> {
        Ok(self.value.clone())
    }
}

/// See [`from_fn`](super::from_fn).
#[derive(Clone)]
pub struct FromFn<F> {
    f: F,
}

impl<F> FromFn<F> {
    pub(crate) fn new(f: F) -> Self {
        Self { f }
    }
}

impl<A, F> DbOp for FromFn<F>
where
    F: Fn(&mut Connection) -> Result<A>,
{
    type Output = A;

    fn run(&self, conn: &mut Connection) -> Result<A> {
        (self.f)(conn)
    }
}

/// See [`DbOp::map`].
#[derive(Clone)]
pub struct Map<O, F> {
    op: O,
    f: F,
}

impl<O, F> Map<O, F> {
    pub(crate) fn new(op: O, f: F) -> Self {
        Self { op, f }
    }
}

impl<O, F, B> DbOp for Map<O, F>
where
    O: DbOp,
    F: Fn(O::Output) -> B,
{
    type Output = B;

    fn run(&self, conn: &mut Connection) -> Result<B> {
        self.op.run(conn).map(&self.f)
    }
}

/// See [`DbOp::try_map`].
#[derive(Clone)]
pub struct TryMap<O, F> {
    op: O,
    f: F,
}

impl<O, F> TryMap<O, F> {
    pub(crate) fn new(op: O, f: F) -> Self {
        Self { op, f }
    }
}

impl<O, F, B> DbOp for TryMap<O, F>
where
    O: DbOp,
    F: Fn(O::Output) -> Result<B>,
{
    type Output = B;

    fn run(&self, conn: &mut Connection) -> Result<B> {
        (self.f)(self.op.run(conn)?)
    }
}

/// See [`DbOp::bind`].
#[derive(Clone)]
pub struct Bind<O, F> {
    op: O,
    f: F,
}

impl<O, F> Bind<O, F> {
    pub(crate) fn new(op: O, f: F) -> Self {
        Self { op, f }
    }
}

impl<O, F, P> DbOp for Bind<O, F>
where
    O: DbOp,
    P: DbOp,
    F: Fn(O::Output) -> P,
{
    type Output = P::Output;

    fn run(&self, conn: &mut Connection) -> Result<P::Output> {
        let first = self.op.run(conn)?;
        (self.f)(first).run(conn)
    }
}
