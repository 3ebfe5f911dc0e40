use std::fs;
use std::io;

use log::{debug, warn};

use crate::catalog::{Catalog, IndexDesc};
use crate::error::{DbError, DbResult};
use crate::execution::{Executor, FileScan};
use crate::index::{HashIndex, SearchKey};
use crate::planner::check;

pub struct CreateIndexPlan {
    desc: IndexDesc,
}

impl CreateIndexPlan {
    pub fn build(
        index_name: String,
        table_name: String,
        column_name: String,
        catalog: &Catalog,
    ) -> DbResult<Self> {
        check::table_exists(catalog, &table_name)?;
        if catalog.index_exists(&index_name) {
            return Err(DbError::IndexExists(index_name));
        }
        check::column_exists(&catalog.schema_of(&table_name)?, &column_name)?;
        if let Some(existing) = catalog.find_index(&table_name, &column_name) {
            return Err(DbError::ColumnAlreadyIndexed {
                table: table_name,
                column: column_name,
                index: existing.index_name,
            });
        }
        Ok(CreateIndexPlan { desc: IndexDesc { index_name, table_name, column_name } })
    }

    /// Build the whole index from a table scan; register it only once the
    /// build succeeded.
    pub fn execute(self, catalog: &mut Catalog) -> DbResult<String> {
        let name = self.desc.index_name.clone();
        let path = catalog.index_path(&name);
        let mut index = match HashIndex::create(&name, &path) {
            Ok(index) => index,
            Err(e) => {
                match fs::remove_file(&path) {
                    Err(cleanup) if cleanup.kind() != io::ErrorKind::NotFound => {
                        warn!("create index {}: could not remove {}: {}", name, path.display(), cleanup);
                    }
                    _ => {}
                }
                return Err(e);
            }
        };
        let entries = match bulk_load(catalog, &self.desc, &mut index) {
            Ok(n) => n,
            Err(e) => {
                warn!("create index {}: build failed, removing partial structure: {}", name, e);
                if let Err(cleanup) = index.delete_structure() {
                    warn!("create index {}: partial structure left behind: {}", name, cleanup);
                }
                return Err(e);
            }
        };
        let summary = format!(
            "Index {} created on {}({}) with {} entries",
            name, self.desc.table_name, self.desc.column_name, entries
        );
        catalog.create_index(self.desc, index)?;
        Ok(summary)
    }

    pub fn explain(&self) -> String {
        format!(
            "CreateIndex {} on {}({})\n  FileScan {}\n",
            self.desc.index_name, self.desc.table_name, self.desc.column_name, self.desc.table_name
        )
    }
}

fn bulk_load(catalog: &Catalog, desc: &IndexDesc, index: &mut HashIndex) -> DbResult<usize> {
    let schema = catalog.schema_of(&desc.table_name)?;
    let field = check::column_exists(&schema, &desc.column_name)?;
    let mut scan = FileScan::open(&desc.table_name, catalog.heap_file(&desc.table_name)?, schema);
    let loaded = load_from(&mut scan, field, index);
    scan.close();
    let loaded = loaded?;
    debug!("index {}: loaded {} entries", desc.index_name, loaded);
    Ok(loaded)
}

fn load_from(scan: &mut FileScan, field: usize, index: &mut HashIndex) -> DbResult<usize> {
    let mut count = 0;
    while let Some(tuple) = scan.next()? {
        let rid = scan
            .last_rid()
            .ok_or_else(|| DbError::Corrupt("scan returned a row without a RID".into()))?;
        let value = tuple
            .field(field)
            .cloned()
            .ok_or_else(|| DbError::Corrupt(format!("row has no field {}", field)))?;
        index.insert_entry(&SearchKey::new(value), rid)?;
        count += 1;
    }
    Ok(count)
}
