use aeroquery::{engine::Engine, storage::Rid};
use tempfile::TempDir;

fn setup() -> (TempDir, Engine) {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = Engine::open(dir.path()).unwrap();
    engine.execute_sql("CREATE TABLE inv (sku INT, name TEXT, price FLOAT)").unwrap();
    engine.execute_sql("CREATE INDEX by_sku ON inv (sku)").unwrap();
    engine.execute_sql("CREATE INDEX by_name ON inv (name)").unwrap();
    engine.execute_sql("CREATE INDEX by_price ON inv (price)").unwrap();
    (dir, engine)
}

/// Every index of `table` holds exactly one entry per live record.
fn assert_consistent(engine: &mut Engine, table: &str, after: &str) {
    let schema = engine.catalog.schema_of(table).unwrap();
    let rows = engine.catalog.scan_table(table).unwrap();
    for desc in engine.catalog.indexes_of(table) {
        let field = schema.field_number(&desc.column_name).unwrap();
        let mut expected: Vec<(String, Rid)> = rows
            .iter()
            .map(|(rid, t)| (t.field(field).unwrap().to_string(), *rid))
            .collect();
        let mut actual: Vec<(String, Rid)> = engine
            .catalog
            .index_mut(&desc.index_name)
            .unwrap()
            .entries()
            .unwrap()
            .into_iter()
            .map(|(k, rid)| (k.value().to_string(), rid))
            .collect();
        expected.sort();
        actual.sort();
        assert_eq!(actual, expected, "index {} after {}", desc.index_name, after);
    }
}

#[test]
fn indexes_track_a_mixed_workload() {
    let (_dir, mut engine) = setup();
    let statements = [
        "INSERT INTO inv VALUES (1, 'bolt', 0.5)",
        "INSERT INTO inv VALUES (2, 'nut', 0.25)",
        "INSERT INTO inv VALUES (3, 'bolt', 0.75)",
        "INSERT INTO inv VALUES (4, 'washer', 0.1)",
        "UPDATE inv SET price = 0.6 WHERE name = 'bolt'",
        "DELETE FROM inv WHERE sku = 2",
        "INSERT INTO inv VALUES (5, 'nut', 0.3)",
        "UPDATE inv SET sku = 10, name = 'screw' WHERE sku = 1 OR sku = 4",
        "DELETE FROM inv WHERE price < 0.2",
        "UPDATE inv SET name = 'nut' WHERE sku > 100",
        "INSERT INTO inv VALUES (6, 'bolt', 0.6)",
        "DELETE FROM inv WHERE name = 'bolt' AND price = 0.6",
        "UPDATE inv SET price = 1",
    ];
    for sql in statements {
        engine.execute_sql(sql).unwrap();
        assert_consistent(&mut engine, "inv", sql);
    }
    let rows = engine.catalog.scan_table("inv").unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(engine.catalog.row_count_estimate("inv").unwrap(), 2);
}

#[test]
fn slots_freed_by_delete_are_reused_consistently() {
    let (_dir, mut engine) = setup();
    for i in 0..20 {
        engine
            .execute_sql(&format!("INSERT INTO inv VALUES ({}, 'item{}', {}.5)", i, i % 3, i))
            .unwrap();
    }
    engine.execute_sql("DELETE FROM inv WHERE name = 'item1'").unwrap();
    assert_consistent(&mut engine, "inv", "delete");
    for i in 100..110 {
        engine
            .execute_sql(&format!("INSERT INTO inv VALUES ({}, 'again', 2)", i))
            .unwrap();
    }
    assert_consistent(&mut engine, "inv", "reinsert");
    engine.execute_sql("UPDATE inv SET name = 'item0' WHERE name = 'again'").unwrap();
    assert_consistent(&mut engine, "inv", "update");
}
