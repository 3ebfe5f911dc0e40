use log::debug;

use crate::catalog::Catalog;
use crate::error::DbResult;
use crate::index::SearchKey;
use crate::planner::{check, collect_matches};
use crate::sql::ast::{Cnf, clause_to_string};
use crate::storage::schema::Schema;

pub struct DeletePlan {
    table_name: String,
    schema: Schema,
    predicates: Cnf,
}

impl DeletePlan {
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn build(table_name: String, predicates: Cnf, catalog: &Catalog) -> DbResult<Self> {
        check::table_exists(catalog, &table_name)?;
        let schema = catalog.schema_of(&table_name)?;
        check::predicates(&predicates, &schema)?;
        Ok(DeletePlan { table_name, schema, predicates })
    }

    /// Two passes: the scan is finished and closed before the first record
    /// is removed. Index entries are removed using the pre-delete tuple.
    pub fn execute(self, catalog: &mut Catalog) -> DbResult<usize> {
        let matches = collect_matches(catalog, &self.table_name, &self.schema, &self.predicates)?;
        let indexes = catalog.indexes_of(&self.table_name);
        let heap = catalog.heap_file(&self.table_name)?;
        for (rid, tuple) in &matches {
            for desc in &indexes {
                let key = SearchKey::from_tuple(tuple, &self.schema, &desc.column_name)?;
                catalog.index_mut(&desc.index_name)?.delete_entry(&key, *rid)?;
            }
            heap.borrow_mut().delete_record(*rid)?;
        }
        catalog.adjust_row_count(&self.table_name, -(matches.len() as i64))?;
        debug!("delete from {}: {} rows removed", self.table_name, matches.len());
        Ok(matches.len())
    }

    pub fn explain(&self) -> String {
        let mut out = format!("Delete from {}\n", self.table_name);
        for clause in &self.predicates {
            out.push_str(&format!("  Selection ({})\n", clause_to_string(clause)));
        }
        out.push_str(&format!("  FileScan {}\n", self.table_name));
        out
    }
}
