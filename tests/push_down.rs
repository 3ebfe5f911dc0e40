use aeroquery::{engine::Engine, planner::PlannerOptions};
use tempfile::TempDir;

fn setup() -> (TempDir, Engine) {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = Engine::open(dir.path()).unwrap();
    engine.execute_sql("CREATE TABLE t1 (a INT, b TEXT)").unwrap();
    engine.execute_sql("CREATE TABLE t2 (c INT, d TEXT)").unwrap();
    for (a, b) in [(1, "p"), (2, "q"), (3, "p")] {
        engine.execute_sql(&format!("INSERT INTO t1 VALUES ({}, '{}')", a, b)).unwrap();
    }
    for (c, d) in [(2, "m"), (3, "n"), (3, "o"), (5, "m")] {
        engine.execute_sql(&format!("INSERT INTO t2 VALUES ({}, '{}')", c, d)).unwrap();
    }
    (dir, engine)
}

const QUERIES: &[&str] = &[
    "SELECT * FROM t1, t2 WHERE a >= 2 AND a = c",
    "SELECT b, d FROM t1, t2 WHERE b = 'p' AND d = 'm' OR d = 'n'",
    "SELECT * FROM t1, t2 WHERE a = 1 OR c = 5",
    "SELECT a FROM t1 WHERE a <> 2 AND b = 'p'",
    "SELECT * FROM t2, t1 WHERE t1.a < t2.c AND c > 2",
];

#[test]
fn push_down_never_changes_results() {
    let (_dir, mut engine) = setup();
    for sql in QUERIES {
        engine.set_options(PlannerOptions { push_down: true });
        let pushed = engine.execute_sql(sql).unwrap();
        engine.set_options(PlannerOptions { push_down: false });
        let residual = engine.execute_sql(sql).unwrap();
        assert_eq!(pushed, residual, "results differ for {}", sql);
    }
}

#[test]
fn single_table_clauses_sit_on_their_scan() {
    let (_dir, engine) = setup();
    assert_eq!(
        engine.explain_sql("SELECT * FROM t1, t2 WHERE a >= 2 AND a = c AND d = 'm'").unwrap(),
        "Selection (t1.a = t2.c)\n\
         \x20 SimpleJoin\n\
         \x20   Selection (t1.a >= 2)\n\
         \x20     FileScan t1\n\
         \x20   Selection (t2.d = 'm')\n\
         \x20     FileScan t2\n"
    );
}

#[test]
fn mixed_or_clause_stays_residual() {
    let (_dir, engine) = setup();
    let plan = engine.explain_sql("SELECT * FROM t1, t2 WHERE a = 1 OR c = 5").unwrap();
    assert!(plan.starts_with("Selection (t1.a = 1 OR t2.c = 5)\n  SimpleJoin\n"));
}

#[test]
fn several_clauses_on_one_table_nest() {
    let (_dir, engine) = setup();
    assert_eq!(
        engine.explain_sql("SELECT a FROM t1 WHERE a <> 2 AND b = 'p'").unwrap(),
        "Projection [t1.a]\n  Selection (t1.b = 'p')\n    Selection (t1.a <> 2)\n      FileScan t1\n"
    );
}

#[test]
fn disabled_push_down_applies_everything_after_the_join() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = Engine::with_options(dir.path(), PlannerOptions { push_down: false }).unwrap();
    engine.execute_sql("CREATE TABLE t1 (a INT)").unwrap();
    engine.execute_sql("CREATE TABLE t2 (c INT)").unwrap();
    engine.execute_sql("INSERT INTO t1 VALUES (1)").unwrap();
    engine.execute_sql("INSERT INTO t2 VALUES (2)").unwrap();
    engine.execute_sql("INSERT INTO t2 VALUES (3)").unwrap();
    assert_eq!(
        engine.explain_sql("SELECT * FROM t1, t2 WHERE a = 1 AND c = 2").unwrap(),
        "Selection (t2.c = 2)\n  Selection (t1.a = 1)\n    SimpleJoin\n      FileScan t1\n      FileScan t2\n"
    );
}
