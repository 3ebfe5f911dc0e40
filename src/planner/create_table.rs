use std::collections::HashSet;

use crate::catalog::Catalog;
use crate::error::{DbError, DbResult};
use crate::storage::row::ColumnType;

pub struct CreateTablePlan {
    table_name: String,
    columns: Vec<(String, ColumnType)>,
}

impl CreateTablePlan {
    pub fn build(
        table_name: String,
        columns: Vec<(String, ColumnType)>,
        catalog: &Catalog,
    ) -> DbResult<Self> {
        if catalog.table_exists(&table_name) {
            return Err(DbError::TableExists(table_name));
        }
        let mut seen = HashSet::new();
        for (name, _) in &columns {
            if !seen.insert(name.as_str()) {
                return Err(DbError::DuplicateColumn(name.clone()));
            }
        }
        Ok(CreateTablePlan { table_name, columns })
    }

    pub fn execute(self, catalog: &mut Catalog) -> DbResult<String> {
        catalog.create_table(&self.table_name, self.columns)?;
        Ok(format!("Table {} created", self.table_name))
    }

    pub fn explain(&self) -> String {
        let cols: Vec<String> = self.columns.iter().map(|(n, t)| format!("{} {}", n, t)).collect();
        format!("CreateTable {} ({})\n", self.table_name, cols.join(", "))
    }
}
