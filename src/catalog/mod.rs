use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::{DbError, DbResult};
use crate::execution::{Executor, FileScan, Selection};
use crate::index::HashIndex;
use crate::sql::ast::{CompareOp, Literal, Predicate};
use crate::storage::heap::{HeapFile, HeapScan, Rid, SharedHeap};
use crate::storage::row::{ColumnType, ColumnValue, Tuple};
use crate::storage::schema::Schema;

/// Name of the catalog-owned relation holding per-table row counts.
pub const RELCAT: &str = "relcat";
const REL_NAME: &str = "relName";
const REC_COUNT: &str = "recCount";

/// In-memory representation of a table's metadata.
pub struct TableInfo {
    pub name: String,
    pub schema: Schema,
    heap: SharedHeap,
}

impl TableInfo {
    pub fn heap(&self) -> SharedHeap {
        self.heap.clone()
    }
}

/// Binds one index to a (table, column) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDesc {
    pub index_name: String,
    pub table_name: String,
    pub column_name: String,
}

struct IndexEntry {
    desc: IndexDesc,
    index: HashIndex,
}

/// Tables, index descriptors and relation statistics for one data directory.
///
/// Passed explicitly to every plan. Metadata lives in memory; only the
/// relation statistics are themselves a heap relation (`relcat`).
pub struct Catalog {
    dir: PathBuf,
    tables: HashMap<String, TableInfo>,
    // Creation order, so listing is deterministic.
    table_order: Vec<String>,
    indexes: Vec<IndexEntry>,
    relcat: SharedHeap,
    relcat_schema: Schema,
}

impl Catalog {
    /// Create a fresh catalog in `dir`, creating the directory if needed.
    pub fn create(dir: &Path) -> DbResult<Self> {
        fs::create_dir_all(dir)?;
        let relcat = HeapFile::create(RELCAT, &dir.join(format!("{}.tbl", RELCAT)))?.shared();
        let relcat_schema = Schema::for_table(
            RELCAT,
            vec![(REL_NAME.into(), ColumnType::Text), (REC_COUNT.into(), ColumnType::Integer)],
        );
        info!("catalog created in {}", dir.display());
        Ok(Catalog {
            dir: dir.to_path_buf(),
            tables: HashMap::new(),
            table_order: Vec::new(),
            indexes: Vec::new(),
            relcat,
            relcat_schema,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn table_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.tbl", name))
    }

    pub fn index_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.idx", name))
    }

    pub fn create_table(&mut self, name: &str, columns: Vec<(String, ColumnType)>) -> DbResult<()> {
        if self.table_exists(name) || name == RELCAT {
            return Err(DbError::TableExists(name.to_string()));
        }
        let heap = HeapFile::create(name, &self.table_path(name))?.shared();
        let stats = Tuple::new(vec![ColumnValue::Text(name.to_string()), ColumnValue::Integer(0)]);
        self.relcat.borrow_mut().insert_record(&stats.serialize())?;
        self.tables.insert(
            name.to_string(),
            TableInfo { name: name.to_string(), schema: Schema::for_table(name, columns), heap },
        );
        self.table_order.push(name.to_string());
        debug!("catalog: table {} registered", name);
        Ok(())
    }

    /// Remove the table's heap file, statistics row and metadata. Indexes on
    /// the table must have been dropped first.
    pub fn drop_table(&mut self, name: &str) -> DbResult<()> {
        let info = self
            .tables
            .get(name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))?;
        info.heap.borrow_mut().delete_file()?;
        if let Some((rid, _)) = self.find_stats(name)? {
            self.relcat.borrow_mut().delete_record(rid)?;
        }
        self.tables.remove(name);
        self.table_order.retain(|t| t != name);
        debug!("catalog: table {} removed", name);
        Ok(())
    }

    pub fn table_exists(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn table_names(&self) -> &[String] {
        &self.table_order
    }

    pub fn get_table(&self, name: &str) -> DbResult<&TableInfo> {
        self.tables
            .get(name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    pub fn schema_of(&self, name: &str) -> DbResult<Schema> {
        Ok(self.get_table(name)?.schema.clone())
    }

    pub fn heap_file(&self, name: &str) -> DbResult<SharedHeap> {
        Ok(self.get_table(name)?.heap())
    }

    /// Descriptors of every index on `table`, in creation order.
    pub fn indexes_of(&self, table: &str) -> Vec<IndexDesc> {
        self.indexes
            .iter()
            .filter(|e| e.desc.table_name == table)
            .map(|e| e.desc.clone())
            .collect()
    }

    pub fn all_indexes(&self) -> Vec<IndexDesc> {
        self.indexes.iter().map(|e| e.desc.clone()).collect()
    }

    pub fn index_exists(&self, name: &str) -> bool {
        self.indexes.iter().any(|e| e.desc.index_name == name)
    }

    pub fn find_index(&self, table: &str, column: &str) -> Option<IndexDesc> {
        self.indexes
            .iter()
            .find(|e| e.desc.table_name == table && e.desc.column_name == column)
            .map(|e| e.desc.clone())
    }

    /// Register a fully built index under its descriptor.
    pub fn create_index(&mut self, desc: IndexDesc, index: HashIndex) -> DbResult<()> {
        if self.index_exists(&desc.index_name) {
            return Err(DbError::IndexExists(desc.index_name));
        }
        if let Some(existing) = self.find_index(&desc.table_name, &desc.column_name) {
            return Err(DbError::ColumnAlreadyIndexed {
                table: desc.table_name,
                column: desc.column_name,
                index: existing.index_name,
            });
        }
        debug!("catalog: index {} registered on {}({})", desc.index_name, desc.table_name, desc.column_name);
        self.indexes.push(IndexEntry { desc, index });
        Ok(())
    }

    pub fn index_mut(&mut self, name: &str) -> DbResult<&mut HashIndex> {
        self.indexes
            .iter_mut()
            .find(|e| e.desc.index_name == name)
            .map(|e| &mut e.index)
            .ok_or_else(|| DbError::IndexNotFound(name.to_string()))
    }

    /// Forget the descriptor. The caller deletes the structure beforehand.
    pub fn drop_index(&mut self, name: &str) -> DbResult<IndexDesc> {
        let pos = self
            .indexes
            .iter()
            .position(|e| e.desc.index_name == name)
            .ok_or_else(|| DbError::IndexNotFound(name.to_string()))?;
        let entry = self.indexes.remove(pos);
        debug!("catalog: index {} removed", name);
        Ok(entry.desc)
    }

    /// Estimated row count of `table`, read from `relcat` through a
    /// `Selection(relName = table)` over a scan of the relation.
    pub fn row_count_estimate(&self, table: &str) -> DbResult<usize> {
        let scan = FileScan::open(RELCAT, self.relcat.clone(), self.relcat_schema.clone());
        let key = Predicate::column_literal(REL_NAME, CompareOp::Eq, Literal::Text(table.to_string()));
        let mut select = Selection::new(Box::new(scan), &[key])?;
        let row = select.next();
        select.close();
        let count = match row? {
            Some(t) => match t.field(1) {
                Some(ColumnValue::Integer(n)) => (*n).max(0) as usize,
                _ => return Err(DbError::Corrupt(format!("bad statistics row for {}", table))),
            },
            None => return Err(DbError::TableNotFound(table.to_string())),
        };
        Ok(count)
    }

    /// Shift the row count of `table` by `delta`.
    pub fn adjust_row_count(&mut self, table: &str, delta: i64) -> DbResult<()> {
        let (rid, mut stats) = self
            .find_stats(table)?
            .ok_or_else(|| DbError::TableNotFound(table.to_string()))?;
        let current = match stats.field(1) {
            Some(ColumnValue::Integer(n)) => i64::from(*n),
            _ => return Err(DbError::Corrupt(format!("bad statistics row for {}", table))),
        };
        let updated = (current + delta).clamp(0, i64::from(i32::MAX)) as i32;
        stats.set_field(1, ColumnValue::Integer(updated));
        self.relcat.borrow_mut().update_record(rid, &stats.serialize())?;
        Ok(())
    }

    fn find_stats(&self, table: &str) -> DbResult<Option<(Rid, Tuple)>> {
        let mut scan = HeapScan::open(self.relcat.clone());
        while let Some(t) = scan.next_tuple()? {
            if matches!(t.field(0), Some(ColumnValue::Text(name)) if name == table) {
                let found = scan.last_rid().map(|rid| (rid, t));
                scan.close();
                return Ok(found);
            }
        }
        scan.close();
        Ok(None)
    }

    /// Every live record of `table` with its RID, in scan order.
    pub fn scan_table(&self, table: &str) -> DbResult<Vec<(Rid, Tuple)>> {
        let mut scan = HeapScan::open(self.heap_file(table)?);
        let mut rows = Vec::new();
        while let Some(t) = scan.next_tuple()? {
            if let Some(rid) = scan.last_rid() {
                rows.push((rid, t));
            }
        }
        scan.close();
        Ok(rows)
    }

    /// Scans still open over any table or the statistics relation.
    pub fn open_scan_count(&self) -> usize {
        self.tables.values().map(|t| t.heap.borrow().open_scans()).sum::<usize>()
            + self.relcat.borrow().open_scans()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols() -> Vec<(String, ColumnType)> {
        vec![("a".into(), ColumnType::Integer), ("b".into(), ColumnType::Text)]
    }

    #[test]
    fn row_counts_live_in_relcat() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = Catalog::create(dir.path()).unwrap();
        catalog.create_table("t1", cols()).unwrap();
        catalog.create_table("t2", cols()).unwrap();
        assert!(matches!(catalog.create_table("t1", cols()), Err(DbError::TableExists(_))));
        assert!(matches!(catalog.create_table(RELCAT, cols()), Err(DbError::TableExists(_))));

        catalog.adjust_row_count("t1", 3).unwrap();
        catalog.adjust_row_count("t2", 1).unwrap();
        catalog.adjust_row_count("t1", -1).unwrap();
        assert_eq!(catalog.row_count_estimate("t1").unwrap(), 2);
        assert_eq!(catalog.row_count_estimate("t2").unwrap(), 1);
        assert!(matches!(catalog.row_count_estimate("zz"), Err(DbError::TableNotFound(_))));
        assert_eq!(catalog.open_scan_count(), 0);

        catalog.drop_table("t1").unwrap();
        assert!(!catalog.table_exists("t1"));
        assert!(!dir.path().join("t1.tbl").exists());
        assert!(matches!(catalog.row_count_estimate("t1"), Err(DbError::TableNotFound(_))));
        assert_eq!(catalog.table_names(), &["t2".to_string()]);
    }

    #[test]
    fn index_descriptors_are_unique_per_name_and_column() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = Catalog::create(dir.path()).unwrap();
        catalog.create_table("t", cols()).unwrap();
        let desc = |name: &str, col: &str| IndexDesc {
            index_name: name.into(),
            table_name: "t".into(),
            column_name: col.into(),
        };
        let ix = HashIndex::create("ia", &catalog.index_path("ia")).unwrap();
        catalog.create_index(desc("ia", "a"), ix).unwrap();

        let ix = HashIndex::create("ib", &catalog.index_path("ib")).unwrap();
        assert!(matches!(
            catalog.create_index(desc("ib", "a"), ix),
            Err(DbError::ColumnAlreadyIndexed { .. })
        ));
        assert_eq!(catalog.find_index("t", "a").unwrap().index_name, "ia");
        assert!(catalog.index_mut("ib").is_err());

        catalog.drop_index("ia").unwrap();
        assert!(catalog.indexes_of("t").is_empty());
        assert!(matches!(catalog.drop_index("ia"), Err(DbError::IndexNotFound(_))));
    }
}
