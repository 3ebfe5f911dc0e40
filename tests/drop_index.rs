use aeroquery::{engine::Engine, error::DbError};
use tempfile::TempDir;

fn setup() -> (TempDir, Engine) {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::open(dir.path()).unwrap();
    (dir, engine)
}

#[test]
fn drop_index_basic() {
    let (dir, mut engine) = setup();
    engine.execute_sql("CREATE TABLE t (id INT, name TEXT)").unwrap();
    engine.execute_sql("CREATE INDEX idx1 ON t (name)").unwrap();
    engine.execute_sql("CREATE INDEX idx2 ON t (id)").unwrap();
    let names: Vec<String> = engine.catalog.all_indexes().into_iter().map(|i| i.index_name).collect();
    assert_eq!(names, vec!["idx1".to_string(), "idx2".to_string()]);
    assert!(dir.path().join("idx1.idx").exists());

    let out = engine.execute_sql("DROP INDEX idx1").unwrap();
    assert_eq!(out.to_string(), "Index idx1 dropped");
    let names: Vec<String> = engine.catalog.all_indexes().into_iter().map(|i| i.index_name).collect();
    assert_eq!(names, vec!["idx2".to_string()]);
    assert!(!dir.path().join("idx1.idx").exists());
}

#[test]
fn drop_missing_index_fails() {
    let (_dir, mut engine) = setup();
    assert!(matches!(engine.execute_sql("DROP INDEX nope"), Err(DbError::IndexNotFound(_))));
}

#[test]
fn column_can_be_reindexed_after_drop() {
    let (_dir, mut engine) = setup();
    engine.execute_sql("CREATE TABLE t (id INT, name TEXT)").unwrap();
    for i in 1..=3 {
        engine.execute_sql(&format!("INSERT INTO t VALUES ({}, 'u{}')", i, i)).unwrap();
    }
    engine.execute_sql("CREATE INDEX idx1 ON t (name)").unwrap();
    engine.execute_sql("DROP INDEX idx1").unwrap();

    // Mutations after the drop no longer touch the old index.
    engine.execute_sql("INSERT INTO t VALUES (4, 'u2')").unwrap();
    engine.execute_sql("DELETE FROM t WHERE id = 1").unwrap();

    engine.execute_sql("CREATE INDEX idx1b ON t (name)").unwrap();
    let entries = engine.catalog.index_mut("idx1b").unwrap().entries().unwrap();
    assert_eq!(entries.len(), 3);
}

#[test]
fn drop_table_cleans_indexes() {
    let (dir, mut engine) = setup();
    engine.execute_sql("CREATE TABLE t (id INT, name TEXT)").unwrap();
    engine.execute_sql("CREATE INDEX idx1 ON t (name)").unwrap();
    engine.execute_sql("CREATE INDEX idx2 ON t (id)").unwrap();
    assert_eq!(engine.catalog.all_indexes().len(), 2);

    engine.execute_sql("DROP TABLE t").unwrap();
    assert!(engine.catalog.all_indexes().is_empty());
    assert!(!dir.path().join("idx1.idx").exists());
    assert!(!dir.path().join("t.tbl").exists());
    assert!(matches!(engine.execute_sql("SELECT * FROM t"), Err(DbError::TableNotFound(_))));

    engine.execute_sql("CREATE TABLE t (id INT, name TEXT)").unwrap();
    engine.execute_sql("CREATE INDEX idx1 ON t (name)").unwrap();
    assert_eq!(engine.catalog.row_count_estimate("t").unwrap(), 0);
}

#[test]
fn descriptor_survives_failed_structure_deletion() {
    let (dir, mut engine) = setup();
    engine.execute_sql("CREATE TABLE t (id INT, name TEXT)").unwrap();
    engine.execute_sql("CREATE INDEX idx1 ON t (name)").unwrap();
    std::fs::remove_file(dir.path().join("idx1.idx")).unwrap();

    let err = engine.execute_sql("DROP INDEX idx1").unwrap_err();
    assert!(matches!(err, DbError::Io(_)));
    assert!(engine.catalog.index_exists("idx1"));
    assert_eq!(engine.catalog.indexes_of("t").len(), 1);
}
