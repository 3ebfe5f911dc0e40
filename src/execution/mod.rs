pub mod executor;
pub mod join;
pub mod predicate;
pub mod projection;
pub mod scan;
pub mod selection;

pub use executor::{Executor, OperatorState};
pub use join::SimpleJoin;
pub use predicate::BoundPredicate;
pub use projection::Projection;
pub use scan::FileScan;
pub use selection::Selection;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::sql::ast::{CompareOp, Literal, Predicate};
    use crate::storage::heap::{HeapFile, SharedHeap};
    use crate::storage::row::{ColumnType, ColumnValue, Tuple};
    use crate::storage::schema::Schema;

    fn table(dir: &std::path::Path, name: &str, values: &[i32]) -> (SharedHeap, Schema) {
        let heap = HeapFile::create(name, &dir.join(format!("{}.tbl", name))).unwrap().shared();
        for v in values {
            heap.borrow_mut()
                .insert_record(&Tuple::new(vec![ColumnValue::Integer(*v)]).serialize())
                .unwrap();
        }
        (heap, Schema::for_table(name, vec![("v".into(), ColumnType::Integer)]))
    }

    #[test]
    fn nested_pipeline_produces_cross_product_and_closes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let (h1, s1) = table(dir.path(), "l", &[1, 2, 3]);
        let (h2, s2) = table(dir.path(), "r", &[10, 20]);

        let left = Selection::new(
            Box::new(FileScan::open("l", h1.clone(), s1)),
            &[Predicate::column_literal("v", CompareOp::Ne, Literal::Integer(2))],
        )
        .unwrap();
        let join = SimpleJoin::new(Box::new(left), Box::new(FileScan::open("r", h2.clone(), s2)));
        let mut root = Projection::new(Box::new(join), vec![1, 0]);

        let rows = root.execute().unwrap();
        let pairs: Vec<(i32, i32)> = rows
            .iter()
            .map(|t| match (t.field(0), t.field(1)) {
                (Some(ColumnValue::Integer(a)), Some(ColumnValue::Integer(b))) => (*a, *b),
                _ => panic!("unexpected row {}", t),
            })
            .collect();
        assert_eq!(pairs, vec![(10, 1), (20, 1), (10, 3), (20, 3)]);
        assert_eq!(root.state(), OperatorState::Exhausted);
        assert_eq!(root.schema().column(0).unwrap().qualified_name(), "r.v");

        let mut plan = String::new();
        root.explain(0, &mut plan);
        assert_eq!(
            plan,
            "Projection [r.v, l.v]\n  SimpleJoin\n    Selection (v <> 2)\n      FileScan l\n    FileScan r\n"
        );

        root.close();
        root.close();
        assert_eq!(h1.borrow().open_scans(), 0);
        assert_eq!(h2.borrow().open_scans(), 0);
        assert!(matches!(root.next(), Err(DbError::OperatorClosed)));
    }

    #[test]
    fn join_with_empty_inner_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let (h1, s1) = table(dir.path(), "l", &[1, 2]);
        let (h2, s2) = table(dir.path(), "r", &[]);
        let mut join = SimpleJoin::new(
            Box::new(FileScan::open("l", h1, s1)),
            Box::new(FileScan::open("r", h2, s2)),
        );
        assert!(join.execute().unwrap().is_empty());
        join.restart().unwrap();
        assert_eq!(join.state(), OperatorState::Unopened);
    }
}
