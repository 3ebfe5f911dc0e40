use aeroquery::{
    engine::Engine,
    error::{DbError, ErrorKind},
    planner::{Plan, PlannerOptions},
    sql::parser::parse_statement,
    storage::{ColumnValue, Tuple},
};
use tempfile::TempDir;

fn setup() -> (TempDir, Engine) {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = Engine::open(dir.path()).unwrap();
    engine.execute_sql("CREATE TABLE T (a INT, b TEXT)").unwrap();
    for (a, b) in [(1, "x"), (2, "y"), (3, "x"), (4, "z")] {
        engine.execute_sql(&format!("INSERT INTO T VALUES ({}, '{}')", a, b)).unwrap();
    }
    (dir, engine)
}

fn ints(rows: &[Tuple], field: usize) -> Vec<i32> {
    rows.iter()
        .map(|t| match t.field(field) {
            Some(ColumnValue::Integer(i)) => *i,
            other => panic!("expected integer, got {:?}", other),
        })
        .collect()
}

#[test]
fn or_clause_returns_rows_in_scan_order_with_and_without_push_down() {
    let (_dir, mut engine) = setup();
    let rows = engine.execute_sql("SELECT a FROM T WHERE a = 1 OR a = 2").unwrap().into_rows();
    assert_eq!(rows, vec![Tuple::new(vec![ColumnValue::Integer(1)]), Tuple::new(vec![ColumnValue::Integer(2)])]);

    engine.set_options(PlannerOptions { push_down: false });
    let residual = engine.execute_sql("SELECT a FROM T WHERE a = 1 OR a = 2").unwrap().into_rows();
    assert_eq!(rows, residual);
}

#[test]
fn cnf_semantics() {
    let (_dir, mut engine) = setup();
    let rows = engine
        .execute_sql("SELECT * FROM T WHERE a = 1 OR a = 3 OR a = 4 AND b = 'x'")
        .unwrap()
        .into_rows();
    assert_eq!(ints(&rows, 0), vec![1, 3]);

    let rows = engine
        .execute_sql("SELECT * FROM T WHERE (a > 1) AND (b = 'x' OR b = 'z')")
        .unwrap()
        .into_rows();
    assert_eq!(ints(&rows, 0), vec![3, 4]);

    let rows = engine.execute_sql("SELECT * FROM T").unwrap().into_rows();
    assert_eq!(rows.len(), 4);
}

#[test]
fn full_projection_round_trips() {
    let (_dir, mut engine) = setup();
    let star = engine.execute_sql("SELECT * FROM T").unwrap();
    let listed = engine.execute_sql("SELECT a, b FROM T").unwrap();
    assert_eq!(star.result_set().unwrap().rows, listed.result_set().unwrap().rows);
    assert_eq!(star.result_set().unwrap().schema, listed.result_set().unwrap().schema);

    let swapped = engine.execute_sql("SELECT b, T.a FROM T WHERE a = 2").unwrap().into_rows();
    assert_eq!(
        swapped,
        vec![Tuple::new(vec![ColumnValue::Text("y".into()), ColumnValue::Integer(2)])]
    );
}

#[test]
fn result_display_has_header_and_count() {
    let (_dir, mut engine) = setup();
    let out = engine.execute_sql("SELECT a, b FROM T WHERE a = 4").unwrap();
    assert_eq!(out.to_string(), "T.a | T.b\n4 | z\n(1 rows)");
}

#[test]
fn order_by_is_accepted_as_pass_through() {
    let (_dir, engine) = setup();
    let stmt = parse_statement("SELECT a FROM T ORDER BY a DESC").unwrap();
    match Plan::build(stmt, &engine.catalog).unwrap() {
        Plan::Select(select) => {
            assert_eq!(select.sort_keys().len(), 1);
            assert!(select.sort_keys()[0].descending);
        }
        _ => panic!("expected a select plan"),
    }
}

#[test]
fn validation_errors() {
    let (_dir, mut engine) = setup();
    let err = engine.execute_sql("SELECT zz FROM T").unwrap_err();
    assert!(matches!(err, DbError::UnresolvedProjection(_)));
    assert_eq!(err.kind(), ErrorKind::Schema);

    let err = engine.execute_sql("SELECT * FROM T WHERE b > 3").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);

    let err = engine.execute_sql("SELECT * FROM T, Missing").unwrap_err();
    assert!(matches!(err, DbError::TableNotFound(ref t) if t == "Missing"));

    let err = engine.execute_sql("SELECT * FROM T WHERE U.a = 1").unwrap_err();
    assert!(matches!(err, DbError::UnresolvedPredicate(_)));
}

#[test]
fn qualified_names_disambiguate_joined_columns() {
    let (_dir, mut engine) = setup();
    engine.execute_sql("CREATE TABLE U (a INT, c TEXT)").unwrap();
    engine.execute_sql("INSERT INTO U VALUES (3, 'u3')").unwrap();
    engine.execute_sql("INSERT INTO U VALUES (4, 'u4')").unwrap();

    let rows = engine
        .execute_sql("SELECT T.b, U.c FROM T, U WHERE T.a = U.a")
        .unwrap()
        .into_rows();
    assert_eq!(
        rows,
        vec![
            Tuple::new(vec![ColumnValue::Text("x".into()), ColumnValue::Text("u3".into())]),
            Tuple::new(vec![ColumnValue::Text("z".into()), ColumnValue::Text("u4".into())]),
        ]
    );

    // Bare `a` resolves to the first listed table.
    let rows = engine.execute_sql("SELECT c FROM T, U WHERE a = 1").unwrap().into_rows();
    assert_eq!(rows.len(), 2);
}
