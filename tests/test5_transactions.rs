mod common;

use std::panic::{self, AssertUnwindSafe};

use common::{count, source, sync_db, text, SCHEMA};
use sql_ops::prelude::*;

/// Inserts parents, then one child per generated parent key.
fn family(
    names: Vec<&'static str>,
    child: &'static str,
) -> impl DbOp<Output = Option<usize>> + Send + Sync + use<> {
    batch_insert_gen_keys_vec(
        "INSERT INTO foo (description) VALUES (?)",
        names,
        |name, stmt| stmt.bind(1, name),
    )
    .bind(move |keys| {
        let children: Vec<(i64, &'static str)> = keys.into_iter().map(|k| (k, child)).collect();
        BatchUpdateOp::new(
            "INSERT INTO bar (foo_id, description) VALUES (?, ?)",
            children,
            |(foo_id, d), stmt| {
                stmt.bind(1, foo_id)?;
                stmt.bind(2, d)
            },
        )
    })
}

#[test]
fn parents_and_children_commit_together() -> Result<(), Box<dyn std::error::Error>> {
    let db = sync_db("family_commit");

    let inserted = db.transact(&family(vec!["Pesho", "Gosho", "Dragan"], "child"))?;
    assert_eq!(inserted, Some(3));
    assert_eq!(db.submit(&count("foo"))?, 3);

    let pairs = db.submit(&select_vec(
        "SELECT foo.description, bar.foo_id FROM foo JOIN bar ON bar.foo_id = foo.id ORDER BY foo.id",
        NoBinder,
        |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
    ))?;
    assert_eq!(
        pairs,
        [
            ("Pesho".to_string(), 1),
            ("Gosho".to_string(), 2),
            ("Dragan".to_string(), 3)
        ]
    );
    Ok(())
}

#[test]
fn failure_after_writes_rolls_everything_back() {
    let db = sync_db("family_rollback");

    let op = family(vec!["Pesho", "Gosho", "Dragan"], "child")
        .bind(|_| fail::<(), _>(|| DbError::Other("children rejected".into())));
    let err = db.transact(&op).unwrap_err();
    assert_eq!(err.to_string(), "Other database error: children rejected");

    assert_eq!(db.submit(&count("foo")).unwrap(), 0);
    assert_eq!(db.submit(&count("bar")).unwrap(), 0);
}

#[test]
fn driver_errors_roll_back_and_arrive_unchanged() {
    let db = sync_db("constraint_rollback");

    let op = UpdateOp::new("INSERT INTO foo (description) VALUES ('kept?')", NoBinder)
        .bind(|_| UpdateOp::new("INSERT INTO bar (foo_id, description) VALUES (1, NULL)", NoBinder));
    let err = db.transact(&op).unwrap_err();
    assert!(matches!(err, DbError::SqliteError(_)));
    assert!(err.to_string().contains("NOT NULL"));
    assert_eq!(db.submit(&count("foo")).unwrap(), 0);
}

#[test]
fn submit_commits_each_statement_on_its_own() {
    let db = sync_db("submit_autocommit");

    let op = UpdateOp::new("INSERT INTO foo (description) VALUES (?)", text("kept"))
        .bind(|_| fail::<(), _>(|| DbError::Other("late failure".into())));
    assert!(db.submit(&op).is_err());
    assert_eq!(db.submit(&count("foo")).unwrap(), 1);
}

#[test]
fn panics_roll_back_and_propagate() {
    let db = sync_db("panic_rollback");

    let op = UpdateOp::new("INSERT INTO foo (description) VALUES ('doomed')", NoBinder)
        .bind(|_| from_fn(|_: &mut Connection| -> sql_ops::error::Result<()> { panic!("boom") }));
    let caught = panic::catch_unwind(AssertUnwindSafe(|| db.transact(&op)));
    let payload = caught.unwrap_err();
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"boom"));

    assert_eq!(db.submit(&count("foo")).unwrap(), 0);
}

#[test]
fn raw_driver_writes_roll_back_with_the_transaction() {
    let db = sync_db("raw_rollback");

    let op = from_fn(|conn: &mut Connection| {
        conn.raw()?
            .execute("INSERT INTO foo (description) VALUES ('raw')", [])?;
        Ok(())
    })
    .bind(|()| fail::<(), _>(|| DbError::Other("after raw write".into())));
    let err = db.transact(&op).unwrap_err();
    assert_eq!(err.to_string(), "Other database error: after raw write");
    assert_eq!(db.submit(&count("foo")).unwrap(), 0);
}

#[test]
fn transactional_restores_the_callers_mode() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = source("restore_mode").connection()?;
    conn.execute_script(SCHEMA)?;

    let insert = transactional(UpdateOp::new(
        "INSERT INTO foo (description) VALUES ('a')",
        NoBinder,
    ));
    assert_eq!(insert.run(&mut conn)?, 1);
    assert!(conn.autocommit());
    assert!(!conn.in_transaction());

    let failing = transactional(fail::<(), _>(|| DbError::EmptyResult));
    assert!(failing.run(&mut conn).is_err());
    assert!(conn.autocommit());

    // a caller already managing the transaction keeps control of it
    conn.set_autocommit(false)?;
    insert.run(&mut conn)?;
    assert!(!conn.autocommit());
    conn.rollback()?;
    conn.set_autocommit(true)?;

    assert_eq!(count("foo").run(&mut conn)?, 2);
    Ok(())
}

#[test]
fn nested_transactional_commits_at_its_own_boundary() {
    let db = sync_db("nested");

    let inner = transactional(UpdateOp::new(
        "INSERT INTO foo (description) VALUES ('inner')",
        NoBinder,
    ));
    let op = inner.bind(|_| fail::<(), _>(|| DbError::Other("outer failed".into())));
    assert!(db.transact(&op).is_err());
    // no savepoints: the inner commit ends the outer transaction
    assert_eq!(db.submit(&count("foo")).unwrap(), 1);
}

#[derive(Debug, PartialEq)]
enum AppError {
    Missing,
    Database(String),
}

#[test]
fn result_interpreter_maps_errors() {
    let db = sync_db("result_interpreter");
    let app = ResultInterpreter::new(db.source().clone(), |e: DbError| {
        if e.is_contract_violation() {
            AppError::Missing
        } else {
            AppError::Database(e.to_string())
        }
    });

    let lookup = AggregateOp::new("SELECT id FROM foo WHERE description = ?", text("x"));
    assert_eq!(app.submit(&lookup), Err(AppError::Missing));

    assert_eq!(
        app.transact(&UpdateOp::new("INSERT INTO foo (description) VALUES (?)", text("x"))),
        Ok(1)
    );
    assert_eq!(app.submit(&lookup), Ok(1));

    let broken = EffectOp::new("DROP TABLE nope");
    assert!(matches!(app.submit(&broken), Err(AppError::Database(_))));
}
