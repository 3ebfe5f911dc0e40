use log::debug;

use crate::catalog::Catalog;
use crate::error::DbResult;
use crate::index::SearchKey;
use crate::planner::{check, collect_matches};
use crate::sql::ast::{Cnf, Literal, clause_to_string};
use crate::storage::row::ColumnValue;
use crate::storage::schema::Schema;

pub struct UpdatePlan {
    table_name: String,
    schema: Schema,
    assignments: Vec<(usize, ColumnValue)>,
    predicates: Cnf,
}

impl UpdatePlan {
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn build(
        table_name: String,
        columns: Vec<String>,
        values: Vec<Literal>,
        predicates: Cnf,
        catalog: &Catalog,
    ) -> DbResult<Self> {
        // Targets and values are checked before the WHERE clause.
        let schema = catalog.schema_of(&table_name)?;
        let assignments = check::update_values(&schema, &columns, &values)?;
        check::assignments_fit(catalog, &table_name, &schema, &assignments)?;
        check::predicates(&predicates, &schema)?;
        Ok(UpdatePlan { table_name, schema, assignments, predicates })
    }

    /// Collect matches and compute every new row first, then rewrite each
    /// record under its RID. Every index of the table trades its old-key
    /// entry for the new-key entry, whether or not its column was assigned.
    pub fn execute(self, catalog: &mut Catalog) -> DbResult<usize> {
        let matches = collect_matches(catalog, &self.table_name, &self.schema, &self.predicates)?;
        let mut rewrites = Vec::with_capacity(matches.len());
        for (rid, old) in matches {
            let mut new = old.clone();
            for (idx, value) in &self.assignments {
                new.set_field(*idx, value.clone());
            }
            check::fits_storage(catalog, &self.table_name, &self.schema, &new)?;
            rewrites.push((rid, old, new));
        }

        let indexes = catalog.indexes_of(&self.table_name);
        let heap = catalog.heap_file(&self.table_name)?;
        for (rid, old, new) in &rewrites {
            heap.borrow_mut().update_record(*rid, &new.serialize())?;
            for desc in &indexes {
                let old_key = SearchKey::from_tuple(old, &self.schema, &desc.column_name)?;
                let new_key = SearchKey::from_tuple(new, &self.schema, &desc.column_name)?;
                let index = catalog.index_mut(&desc.index_name)?;
                index.delete_entry(&old_key, *rid)?;
                index.insert_entry(&new_key, *rid)?;
            }
        }
        debug!("update {}: {} rows changed", self.table_name, rewrites.len());
        Ok(rewrites.len())
    }

    pub fn explain(&self) -> String {
        let sets: Vec<String> = self
            .assignments
            .iter()
            .filter_map(|(idx, v)| self.schema.column(*idx).map(|c| format!("{} = {}", c.name, v)))
            .collect();
        let mut out = format!("Update {} set {}\n", self.table_name, sets.join(", "));
        for clause in &self.predicates {
            out.push_str(&format!("  Selection ({})\n", clause_to_string(clause)));
        }
        out.push_str(&format!("  FileScan {}\n", self.table_name));
        out
    }
}
