//! Small helpers over raw SQL text.
//!
//! Nothing here parses SQL. [`statement_kind`] only looks at the first few characters and is a
//! hint, not a classification: a statement that starts with a comment or a `WITH` clause comes
//! back as [`StatementKind::Unknown`].

use crate::error::{DbError, Result};

const SNIFF_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Unknown,
}

/// Guess the kind of a statement from its first ten trimmed, lower-cased characters.
///
/// ```rust
/// use sql_ops::sql::{StatementKind, statement_kind};
///
/// assert_eq!(statement_kind("  INSERT INTO t VALUES (?)"), StatementKind::Insert);
/// assert_eq!(statement_kind("WITH x AS (SELECT 1) DELETE FROM t"), StatementKind::Unknown);
/// ```
#[must_use]
pub fn statement_kind(sql: &str) -> StatementKind {
    let head: String = sql
        .trim()
        .chars()
        .take(SNIFF_LEN)
        .flat_map(char::to_lowercase)
        .collect();

    if head.starts_with("select") {
        StatementKind::Select
    } else if head.starts_with("insert") {
        StatementKind::Insert
    } else if head.starts_with("update") {
        StatementKind::Update
    } else if head.starts_with("delete") {
        StatementKind::Delete
    } else {
        StatementKind::Unknown
    }
}

/// `?, ?, ?` with `count` placeholders.
///
/// # Errors
/// Returns `DbError::ExecutionError` if `count` is zero.
pub fn placeholders(count: usize) -> Result<String> {
    let mut out = String::new();
    push_placeholders(&mut out, count)?;
    Ok(out)
}

/// `(?, ?), (?, ?)` with `rows` groups of `columns` placeholders each.
///
/// # Errors
/// Returns `DbError::ExecutionError` if `rows` or `columns` is zero.
pub fn placeholder_rows(rows: usize, columns: usize) -> Result<String> {
    if rows == 0 {
        return Err(DbError::ExecutionError(
            "placeholder rows require at least one row".into(),
        ));
    }
    let mut out = String::new();
    for row in 0..rows {
        if row > 0 {
            out.push_str(", ");
        }
        out.push('(');
        push_placeholders(&mut out, columns)?;
        out.push(')');
    }
    Ok(out)
}

fn push_placeholders(out: &mut String, count: usize) -> Result<()> {
    if count == 0 {
        return Err(DbError::ExecutionError(
            "placeholders require a count of at least one".into(),
        ));
    }
    for i in 0..count {
        if i > 0 {
            out.push_str(", ");
        }
        out.push('?');
    }
    Ok(())
}
