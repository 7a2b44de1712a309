//! The operation algebra.
//!
//! A [`DbOp`] describes work to run against one [`Connection`]. Building one performs no I/O;
//! only [`DbOp::run`], normally called by an interpreter, touches the database. Operations are
//! immutable once built, so the same value can be interpreted any number of times.
//!
//! ```rust
//! use sql_ops::prelude::*;
//!
//! # fn demo() -> Result<(), DbError> {
//! let count = AggregateOp::new("SELECT COUNT(*) FROM users", NoBinder);
//! let summary = count.map(|n| format!("{n} users"));
//!
//! let mut conn = Connection::open_in_memory()?;
//! conn.execute_script("CREATE TABLE users (id INTEGER PRIMARY KEY)")?;
//! assert_eq!(summary.run(&mut conn)?, "0 users");
//! # Ok(()) }
//! # demo().unwrap();
//! ```

mod adapters;

use std::sync::Arc;

use crate::error::{DbError, Result};
use crate::sqlite::Connection;

pub use adapters::{Bind, FromFn, Map, TryMap, UnitOp};

/// A deferred unit of database work yielding `Output`.
pub trait DbOp {
    type Output;

    /// Run the operation against `conn`.
    ///
    /// # Errors
    /// Whatever the innermost step reports; nothing is wrapped on the way out.
    fn run(&self, conn: &mut Connection) -> Result<Self::Output>;

    /// Transform the result once the operation has run.
    fn map<B, F>(self, f: F) -> Map<Self, F>
    where
        Self: Sized,
        F: Fn(Self::Output) -> B,
    {
        Map::new(self, f)
    }

    /// Transform the result with a function that may fail; its error propagates exactly like
    /// an error from `run`.
    fn try_map<B, F>(self, f: F) -> TryMap<Self, F>
    where
        Self: Sized,
        F: Fn(Self::Output) -> Result<B>,
    {
        TryMap::new(self, f)
    }

    /// Feed the result into `f` and run the operation it returns on the same connection.
    fn bind<O, F>(self, f: F) -> Bind<Self, F>
    where
        Self: Sized,
        O: DbOp,
        F: Fn(Self::Output) -> O,
    {
        Bind::new(self, f)
    }

    fn boxed<'a>(self) -> BoxDbOp<'a, Self::Output>
    where
        Self: Sized + Send + Sync + 'a,
    {
        Box::new(self)
    }
}

/// A type-erased operation, for heterogeneous collections and dynamic composition.
pub type BoxDbOp<'a, A> = Box<dyn DbOp<Output = A> + Send + Sync + 'a>;

impl<O: DbOp + ?Sized> DbOp for Box<O> {
    type Output = O::Output;

    fn run(&self, conn: &mut Connection) -> Result<Self::Output> {
        (**self).run(conn)
    }
}

impl<O: DbOp + ?Sized> DbOp for Arc<O> {
    type Output = O::Output;

    fn run(&self, conn: &mut Connection) -> Result<Self::Output> {
        (**self).run(conn)
    }
}

impl<O: DbOp + ?Sized> DbOp for &O {
    type Output = O::Output;

    fn run(&self, conn: &mut Connection) -> Result<Self::Output> {
        (**self).run(conn)
    }
}

/// An operation that performs no I/O and yields a clone of `value`.
pub fn unit<A: Clone>(value: A) -> UnitOp<A> {
    UnitOp::new(value)
}

/// An operation from a closure over the connection.
pub fn from_fn<A, F>(f: F) -> FromFn<F>
where
    F: Fn(&mut Connection) -> Result<A>,
{
    FromFn::new(f)
}

/// An operation that always fails with the error `make_error` produces.
pub fn fail<A, F>(make_error: F) -> FromFn<impl Fn(&mut Connection) -> Result<A>>
where
    F: Fn() -> DbError,
{
    FromFn::new(move |_: &mut Connection| Err(make_error()))
}
