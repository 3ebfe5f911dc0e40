use log::debug;

use crate::catalog::Catalog;
use crate::error::DbResult;
use crate::index::SearchKey;
use crate::planner::check;
use crate::sql::ast::Literal;
use crate::storage::row::Tuple;
use crate::storage::schema::Schema;

pub struct InsertPlan {
    table_name: String,
    schema: Schema,
    tuple: Tuple,
}

impl InsertPlan {
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn build(table_name: String, values: Vec<Literal>, catalog: &Catalog) -> DbResult<Self> {
        check::table_exists(catalog, &table_name)?;
        let schema = catalog.schema_of(&table_name)?;
        let tuple = check::insert_values(&schema, &values)?;
        check::fits_storage(catalog, &table_name, &schema, &tuple)?;
        Ok(InsertPlan { table_name, schema, tuple })
    }

    /// Store first, then every index of the table.
    pub fn execute(self, catalog: &mut Catalog) -> DbResult<usize> {
        // Indexes may have been added since build.
        check::fits_storage(catalog, &self.table_name, &self.schema, &self.tuple)?;
        let heap = catalog.heap_file(&self.table_name)?;
        let rid = heap.borrow_mut().insert_record(&self.tuple.serialize())?;
        for desc in catalog.indexes_of(&self.table_name) {
            let key = SearchKey::from_tuple(&self.tuple, &self.schema, &desc.column_name)?;
            catalog.index_mut(&desc.index_name)?.insert_entry(&key, rid)?;
        }
        catalog.adjust_row_count(&self.table_name, 1)?;
        debug!("insert into {}: stored at {}", self.table_name, rid);
        Ok(1)
    }

    pub fn explain(&self) -> String {
        format!("Insert into {} ({})\n", self.table_name, self.tuple)
    }
}
