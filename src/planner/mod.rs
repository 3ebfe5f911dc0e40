//! Statement plans.
//!
//! `Plan::build` validates a statement against the catalog and fixes the
//! access strategy without mutating anything. `Plan::execute` consumes the
//! plan and performs the data movement; only storage faults can fail it.

pub mod check;
pub mod create_index;
pub mod create_table;
pub mod delete;
pub mod drop_index;
pub mod drop_table;
pub mod insert;
pub mod select;
pub mod update;

use std::fmt;

use log::info;

use crate::catalog::Catalog;
use crate::error::{DbError, DbResult};
use crate::execution::predicate::{bind_cnf, matches_cnf};
use crate::execution::{BoundPredicate, Executor, FileScan};
use crate::sql::ast::{Cnf, Statement};
use crate::storage::heap::Rid;
use crate::storage::row::Tuple;
use crate::storage::schema::Schema;

pub use create_index::CreateIndexPlan;
pub use create_table::CreateTablePlan;
pub use delete::DeletePlan;
pub use drop_index::DropIndexPlan;
pub use drop_table::DropTablePlan;
pub use insert::InsertPlan;
pub use select::SelectPlan;
pub use update::UpdatePlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerOptions {
    /// Apply single-table clauses directly above their table's scan.
    pub push_down: bool,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        PlannerOptions { push_down: true }
    }
}

pub enum Plan {
    CreateTable(CreateTablePlan),
    DropTable(DropTablePlan),
    CreateIndex(CreateIndexPlan),
    DropIndex(DropIndexPlan),
    Insert(InsertPlan),
    Delete(DeletePlan),
    Update(UpdatePlan),
    Select(SelectPlan),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub schema: Schema,
    pub rows: Vec<Tuple>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutput {
    Affected { rows: usize, summary: String },
    Ddl(String),
    Rows(ResultSet),
}

impl PlanOutput {
    pub fn affected(&self) -> Option<usize> {
        match self {
            PlanOutput::Affected { rows, .. } => Some(*rows),
            _ => None,
        }
    }

    pub fn result_set(&self) -> Option<&ResultSet> {
        match self {
            PlanOutput::Rows(rs) => Some(rs),
            _ => None,
        }
    }

    pub fn into_rows(self) -> Vec<Tuple> {
        match self {
            PlanOutput::Rows(rs) => rs.rows,
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for PlanOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanOutput::Affected { summary, .. } => write!(f, "{}", summary),
            PlanOutput::Ddl(msg) => write!(f, "{}", msg),
            PlanOutput::Rows(rs) => {
                let header: Vec<String> = rs.schema.columns().iter().map(|c| c.qualified_name()).collect();
                writeln!(f, "{}", header.join(" | "))?;
                for row in &rs.rows {
                    writeln!(f, "{}", row)?;
                }
                write!(f, "({} rows)", rs.rows.len())
            }
        }
    }
}

fn affected(rows: usize, verb: &str, table: &str) -> PlanOutput {
    let noun = if rows == 1 { "row" } else { "rows" };
    PlanOutput::Affected { rows, summary: format!("{} {} {} {}", rows, noun, verb, table) }
}

impl Plan {
    pub fn build(stmt: Statement, catalog: &Catalog) -> DbResult<Plan> {
        Plan::build_with(stmt, catalog, &PlannerOptions::default())
    }

    pub fn build_with(stmt: Statement, catalog: &Catalog, options: &PlannerOptions) -> DbResult<Plan> {
        info!("planning {}", stmt.kind());
        let plan = match stmt {
            Statement::CreateTable { table_name, columns } => {
                Plan::CreateTable(CreateTablePlan::build(table_name, columns, catalog)?)
            }
            Statement::DropTable { table_name } => {
                Plan::DropTable(DropTablePlan::build(table_name, catalog)?)
            }
            Statement::CreateIndex { index_name, table_name, column_name } => Plan::CreateIndex(
                CreateIndexPlan::build(index_name, table_name, column_name, catalog)?,
            ),
            Statement::DropIndex { index_name } => {
                Plan::DropIndex(DropIndexPlan::build(index_name, catalog)?)
            }
            Statement::Insert { table_name, values } => {
                Plan::Insert(InsertPlan::build(table_name, values, catalog)?)
            }
            Statement::Delete { table_name, predicates } => {
                Plan::Delete(DeletePlan::build(table_name, predicates, catalog)?)
            }
            Statement::Update { table_name, columns, values, predicates } => Plan::Update(
                UpdatePlan::build(table_name, columns, values, predicates, catalog)?,
            ),
            Statement::Select { columns, tables, predicates, order_by } => Plan::Select(
                SelectPlan::build(columns, tables, predicates, order_by, catalog, options)?,
            ),
        };
        Ok(plan)
    }

    pub fn execute(self, catalog: &mut Catalog) -> DbResult<PlanOutput> {
        let output = match self {
            Plan::CreateTable(p) => PlanOutput::Ddl(p.execute(catalog)?),
            Plan::DropTable(p) => PlanOutput::Ddl(p.execute(catalog)?),
            Plan::CreateIndex(p) => PlanOutput::Ddl(p.execute(catalog)?),
            Plan::DropIndex(p) => PlanOutput::Ddl(p.execute(catalog)?),
            Plan::Insert(p) => {
                let table = p.table_name().to_string();
                affected(p.execute(catalog)?, "inserted into table", &table)
            }
            Plan::Delete(p) => {
                let table = p.table_name().to_string();
                affected(p.execute(catalog)?, "deleted from table", &table)
            }
            Plan::Update(p) => {
                let table = p.table_name().to_string();
                affected(p.execute(catalog)?, "updated in table", &table)
            }
            Plan::Select(p) => PlanOutput::Rows(p.execute()?),
        };
        info!("{}", match &output {
            PlanOutput::Rows(rs) => format!("{} rows selected", rs.rows.len()),
            other => other.to_string(),
        });
        Ok(output)
    }

    pub fn explain(&self) -> String {
        match self {
            Plan::CreateTable(p) => p.explain(),
            Plan::DropTable(p) => p.explain(),
            Plan::CreateIndex(p) => p.explain(),
            Plan::DropIndex(p) => p.explain(),
            Plan::Insert(p) => p.explain(),
            Plan::Delete(p) => p.explain(),
            Plan::Update(p) => p.explain(),
            Plan::Select(p) => p.explain(),
        }
    }
}

/// First pass of DELETE and UPDATE: every matching record with its RID.
/// The scan is closed before returning, on success and on failure.
pub(crate) fn collect_matches(
    catalog: &Catalog,
    table: &str,
    schema: &Schema,
    predicates: &Cnf,
) -> DbResult<Vec<(Rid, Tuple)>> {
    let cnf = bind_cnf(predicates, schema)?;
    let mut scan = FileScan::open(table, catalog.heap_file(table)?, schema.clone());
    let collected = collect_from(&mut scan, &cnf);
    scan.close();
    collected
}

fn collect_from(
    scan: &mut FileScan,
    cnf: &[Vec<BoundPredicate>],
) -> DbResult<Vec<(Rid, Tuple)>> {
    let mut matches = Vec::new();
    while let Some(tuple) = scan.next()? {
        if matches_cnf(cnf, &tuple) {
            let rid = scan
                .last_rid()
                .ok_or_else(|| DbError::Corrupt("scan returned a row without a RID".into()))?;
            matches.push((rid, tuple));
        }
    }
    Ok(matches)
}
