//! Parameter binders and batch execution.
//!
//! A [`Binder`] writes input values into a prepared [`Statement`] and nothing else; executing
//! the statement belongs to the operation that owns the binder.

use rusqlite::types::Value;
use serde_json::Value as JsonValue;

use crate::error::{DbError, Result};
use crate::sqlite::Statement;

/// The driver processed a batch element but cannot say how many rows it touched.
pub const SUCCESS_NO_INFO: i64 = -2;

/// The driver reports a batch element as failed.
pub const EXECUTE_FAILED: i64 = -3;

/// Total rows affected by a batch, or `None` when the driver did not report per-element counts.
pub type BatchResult = Option<usize>;

/// Writes parameter values into a prepared statement.
pub trait Binder: Send + Sync {
    /// # Errors
    /// Returns `DbError::SqliteError` if a position is out of range or a value cannot be bound.
    fn bind(&self, stmt: &mut Statement<'_>) -> Result<()>;
}

impl<F> Binder for F
where
    F: Fn(&mut Statement<'_>) -> Result<()> + Send + Sync,
{
    fn bind(&self, stmt: &mut Statement<'_>) -> Result<()> {
        self(stmt)
    }
}

/// Pin a closure to the binder signature so its argument type need not be spelled out.
///
/// ```rust
/// use sql_ops::prelude::*;
///
/// let op = UpdateOp::new(
///     "UPDATE users SET name = ? WHERE id = ?",
///     binder_fn(|stmt| {
///         stmt.bind(1, "ann")?;
///         stmt.bind(2, 7)
///     }),
/// );
/// # let _ = op;
/// ```
pub fn binder_fn<F>(f: F) -> F
where
    F: Fn(&mut Statement<'_>) -> Result<()> + Send + Sync,
{
    f
}

/// Binds nothing, for statements without parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBinder;

impl Binder for NoBinder {
    fn bind(&self, _stmt: &mut Statement<'_>) -> Result<()> {
        Ok(())
    }
}

/// Positional parameter list, bound at positions 1..=n.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(pub Vec<Value>);

impl Params {
    #[must_use]
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    /// Convert JSON values into `SQLite` values.
    ///
    /// Booleans become integers, arrays and objects are stored as their JSON text.
    #[must_use]
    pub fn from_json(values: &[JsonValue]) -> Self {
        Self(values.iter().map(json_to_sqlite_value).collect())
    }

    #[must_use]
    pub fn as_values(&self) -> &[Value] {
        &self.0
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl Binder for Params {
    fn bind(&self, stmt: &mut Statement<'_>) -> Result<()> {
        for (idx, value) in self.0.iter().enumerate() {
            stmt.bind(idx + 1, value)?;
        }
        Ok(())
    }
}

fn json_to_sqlite_value(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Integer(i64::from(*b)),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => n
                .as_f64()
                .map_or_else(|| Value::Text(n.to_string()), Value::Real),
        },
        JsonValue::String(s) => Value::Text(s.clone()),
        other => Value::Text(other.to_string()),
    }
}

/// Binds every element of a collection into one statement at ascending positions.
///
/// See [`iterable_binder`].
pub struct IterableBinder<A, F> {
    elements: Vec<A>,
    bind_one: F,
}

/// Build a binder that binds each element with `bind_one(position, stmt, element)`, starting
/// at position 1. `bind_one` returns the next free position.
///
/// ```rust
/// use sql_ops::prelude::*;
///
/// // (a, b) pairs for `... WHERE (a, b) IN (VALUES (?, ?), (?, ?))`
/// let binder = iterable_binder(vec![(1, "x"), (2, "y")], |pos, stmt, (a, b)| {
///     stmt.bind(pos, a)?;
///     stmt.bind(pos + 1, b)?;
///     Ok(pos + 2)
/// });
/// # let _ = binder;
/// ```
pub fn iterable_binder<A, F>(elements: Vec<A>, bind_one: F) -> IterableBinder<A, F>
where
    F: Fn(usize, &mut Statement<'_>, &A) -> Result<usize>,
{
    IterableBinder { elements, bind_one }
}

impl<A, F> Binder for IterableBinder<A, F>
where
    A: Send + Sync,
    F: Fn(usize, &mut Statement<'_>, &A) -> Result<usize> + Send + Sync,
{
    fn bind(&self, stmt: &mut Statement<'_>) -> Result<()> {
        bind_all(stmt, &self.elements, &self.bind_one).map(|_| ())
    }
}

/// Bind `elements` from position 1 and return the next free position.
pub(crate) fn bind_all<A, F>(stmt: &mut Statement<'_>, elements: &[A], bind_one: &F) -> Result<usize>
where
    F: Fn(usize, &mut Statement<'_>, &A) -> Result<usize>,
{
    let mut position = 1;
    for element in elements {
        position = bind_one(position, stmt, element)?;
    }
    Ok(position)
}

/// Run `stmt` once per element, binding each with `bind_one`, and return the per-element
/// driver codes. `after` sees the statement and the row count right after each execution.
pub(crate) fn execute_batch<A, F, G>(
    stmt: &mut Statement<'_>,
    elements: &[A],
    bind_one: &F,
    mut after: G,
) -> Result<Vec<i64>>
where
    F: Fn(&A, &mut Statement<'_>) -> Result<()>,
    G: FnMut(&Statement<'_>, usize),
{
    let mut codes = Vec::with_capacity(elements.len());
    for element in elements {
        bind_one(element, stmt)?;
        let count = stmt.execute()?;
        after(stmt, count);
        codes.push(i64::try_from(count).unwrap_or(i64::MAX));
    }
    Ok(codes)
}

/// Reduce per-element batch codes to a [`BatchResult`].
///
/// Non-negative codes are summed. The first [`SUCCESS_NO_INFO`] makes the whole result `None`.
///
/// # Errors
/// Returns `DbError::BatchFailedWithoutError` for [`EXECUTE_FAILED`] and
/// `DbError::UnrecognizedBatchCode` for any other negative code.
pub fn sum_batch_counts(codes: &[i64]) -> Result<BatchResult> {
    let mut total: usize = 0;
    for &code in codes {
        match code {
            c if c >= 0 => total += usize::try_from(c).unwrap_or(usize::MAX),
            SUCCESS_NO_INFO => return Ok(None),
            EXECUTE_FAILED => return Err(DbError::BatchFailedWithoutError),
            other => return Err(DbError::UnrecognizedBatchCode(other)),
        }
    }
    Ok(Some(total))
}
