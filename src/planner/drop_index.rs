use crate::catalog::Catalog;
use crate::error::{DbError, DbResult};

pub struct DropIndexPlan {
    index_name: String,
}

impl DropIndexPlan {
    pub fn build(index_name: String, catalog: &Catalog) -> DbResult<Self> {
        if !catalog.index_exists(&index_name) {
            return Err(DbError::IndexNotFound(index_name));
        }
        Ok(DropIndexPlan { index_name })
    }

    /// The descriptor stays registered if deleting the structure fails.
    pub fn execute(self, catalog: &mut Catalog) -> DbResult<String> {
        catalog.index_mut(&self.index_name)?.delete_structure()?;
        catalog.drop_index(&self.index_name)?;
        Ok(format!("Index {} dropped", self.index_name))
    }

    pub fn explain(&self) -> String {
        format!("DropIndex {}\n", self.index_name)
    }
}
