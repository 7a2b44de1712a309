mod common;

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::{count, sync_db, text};
use sql_ops::prelude::*;

fn insert_chunk(chunk: &[&'static str]) -> impl DbOp<Output = usize> + use<> {
    BatchUpdateOp::new(
        "INSERT INTO foo (description) VALUES (?)",
        chunk.to_vec(),
        |d, stmt| stmt.bind(1, d),
    )
    .map(|inserted| inserted.unwrap_or(0))
}

#[test]
fn chunked_insert_covers_every_element() -> Result<(), Box<dyn std::error::Error>> {
    let db = sync_db("chunked_insert");
    let built = AtomicUsize::new(0);
    let words = vec!["a", "b", "c", "d", "e", "f", "g"];

    let op = to_chunks(words, 3, |chunk: &[&'static str]| {
        built.fetch_add(1, Ordering::SeqCst);
        insert_chunk(chunk)
    });
    assert_eq!(db.transact(&op)?, 7);
    assert_eq!(built.load(Ordering::SeqCst), 3);
    assert_eq!(db.submit(&count("foo"))?, 7);
    Ok(())
}

#[test]
fn empty_input_never_builds_a_chunk() {
    let db = sync_db("chunks_empty");
    let built = AtomicUsize::new(0);

    let op = to_chunks(Vec::<i64>::new(), 5, |_: &[i64]| {
        built.fetch_add(1, Ordering::SeqCst);
        UpdateOp::new("INSERT INTO foo (description) VALUES ('never')", NoBinder)
    });
    assert_eq!(db.submit(&op).unwrap(), 0);
    assert_eq!(built.load(Ordering::SeqCst), 0);
}

#[test]
fn failing_chunk_fails_the_whole_operation() {
    let db = sync_db("chunks_failure");

    let op = to_chunks(vec![1_i64, 2, 3, 4], 2, |chunk: &[i64]| {
        let first = chunk[0];
        let insert = UpdateOp::new("INSERT INTO foo (description) VALUES ('ok')", NoBinder);
        insert.try_map(move |n| {
            if first == 3 {
                Err(DbError::Other(format!("chunk starting at {first} rejected")))
            } else {
                Ok(n)
            }
        })
    });

    let err = db.transact(&op).unwrap_err();
    assert_eq!(err.to_string(), "Other database error: chunk starting at 3 rejected");
    // the first chunk was rolled back with the second
    assert_eq!(db.submit(&count("foo")).unwrap(), 0);
}

#[test]
fn zero_chunk_size_is_rejected_at_run_time() {
    let db = sync_db("chunks_zero");
    let op = to_chunks(vec!["x"], 0, |chunk: &[&'static str]| insert_chunk(chunk));
    let err = db.submit(&op).unwrap_err();
    assert_eq!(err.to_string(), "chunkSize must be >=1, got 0");
}

#[test]
fn sequence_runs_in_order_on_one_connection() -> Result<(), Box<dyn std::error::Error>> {
    let db = sync_db("sequence");

    let steps: Vec<BoxDbOp<'static, i64>> = ["first", "second", "third"]
        .into_iter()
        .map(|d| {
            UpdateOp::new("INSERT INTO foo (description) VALUES (?)", text(d))
                .bind(|_| count("foo"))
                .boxed()
        })
        .collect();
    assert_eq!(db.transact(&sequence(steps))?, vec![1, 2, 3]);

    let lookups = ["third", "first", "first"]
        .into_iter()
        .map(|d| AggregateOp::new("SELECT id FROM foo WHERE description = ?", text(d)))
        .collect();
    let ids = db.submit(&sequence_with(lookups, Collecting::<BTreeSet<i64>>::new()))?;
    assert_eq!(ids.into_iter().collect::<Vec<_>>(), [1, 3]);

    let empty: Vec<AggregateOp<NoBinder>> = Vec::new();
    assert!(db.submit(&sequence(empty))?.is_empty());
    Ok(())
}

#[test]
fn to_result_lets_callers_branch_on_failure() -> Result<(), Box<dyn std::error::Error>> {
    let db = sync_db("to_result");
    db.submit(&UpdateOp::new("INSERT INTO foo (description) VALUES ('only')", NoBinder))?;

    let lookup = |d: &str| {
        to_result(
            AggregateOp::new("SELECT id FROM foo WHERE description = ?", text(d)),
            |e| e.is_contract_violation(),
        )
    };
    assert_eq!(db.submit(&lookup("only"))?, Ok(1));
    assert_eq!(db.submit(&lookup("missing"))?, Err(true));

    // a materialized failure does not abort the surrounding transaction
    let fallback = lookup("missing").bind(|found| match found {
        Ok(id) => unit(id).boxed(),
        Err(_) => insert_gen_key_i64("INSERT INTO foo (description) VALUES ('missing')", NoBinder)
            .boxed(),
    });
    assert_eq!(db.transact(&fallback)?, 2);
    assert_eq!(db.submit(&count("foo"))?, 2);
    Ok(())
}
