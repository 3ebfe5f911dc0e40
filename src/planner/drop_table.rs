use log::debug;

use crate::catalog::Catalog;
use crate::error::DbResult;
use crate::planner::check;

pub struct DropTablePlan {
    table_name: String,
}

impl DropTablePlan {
    pub fn build(table_name: String, catalog: &Catalog) -> DbResult<Self> {
        check::table_exists(catalog, &table_name)?;
        Ok(DropTablePlan { table_name })
    }

    /// Indexes go first, each structure before its descriptor, then the table.
    pub fn execute(self, catalog: &mut Catalog) -> DbResult<String> {
        for desc in catalog.indexes_of(&self.table_name) {
            catalog.index_mut(&desc.index_name)?.delete_structure()?;
            catalog.drop_index(&desc.index_name)?;
            debug!("drop table {}: index {} dropped", self.table_name, desc.index_name);
        }
        catalog.drop_table(&self.table_name)?;
        Ok(format!("Table {} dropped", self.table_name))
    }

    pub fn explain(&self) -> String {
        format!("DropTable {}\n", self.table_name)
    }
}
