use log::debug;

use crate::catalog::Catalog;
use crate::error::{DbError, DbResult};
use crate::execution::predicate::check_cnf;
use crate::execution::{Executor, FileScan, OperatorState, Projection, Selection, SimpleJoin};
use crate::planner::{PlannerOptions, ResultSet};
use crate::sql::ast::{Clause, Cnf, SortKey};
use crate::storage::schema::Schema;

/// Operator tree for one SELECT, fully built and validated.
pub struct SelectPlan {
    root: Box<dyn Executor>,
    sort_keys: Vec<SortKey>,
}

fn resolve_projection(schema: &Schema, column: &str) -> DbResult<String> {
    schema
        .field_number(column)
        .and_then(|i| schema.column(i))
        .map(|c| c.qualified_name())
        .ok_or_else(|| DbError::UnresolvedProjection(column.to_string()))
}

impl SelectPlan {
    pub fn build(
        columns: Vec<String>,
        tables: Vec<String>,
        predicates: Cnf,
        sort_keys: Vec<SortKey>,
        catalog: &Catalog,
        options: &PlannerOptions,
    ) -> DbResult<Self> {
        if tables.is_empty() {
            return Err(DbError::ParseError("SELECT requires at least one table".into()));
        }
        let schemas = tables
            .iter()
            .map(|t| catalog.schema_of(t))
            .collect::<DbResult<Vec<_>>>()?;
        let combined = schemas.iter().fold(Schema::empty(), |acc, s| Schema::join(&acc, s));

        // Names are rewritten to table.column so they stay unambiguous once
        // the join reorders the columns.
        let projection = columns
            .iter()
            .map(|c| resolve_projection(&combined, c))
            .collect::<DbResult<Vec<_>>>()?;
        check_cnf(&predicates, &combined)?;
        let clauses: Vec<Clause> = predicates
            .iter()
            .map(|clause| clause.iter().map(|p| p.qualify(&combined)).collect())
            .collect();

        // One scan per table, wrapped by every clause that only needs that table.
        let mut pushed = vec![false; clauses.len()];
        let mut access: Vec<Box<dyn Executor>> = Vec::with_capacity(tables.len());
        for (table, schema) in tables.iter().zip(&schemas) {
            let mut node: Box<dyn Executor> =
                Box::new(FileScan::open(table, catalog.heap_file(table)?, schema.clone()));
            if options.push_down {
                for (i, clause) in clauses.iter().enumerate() {
                    if !pushed[i] && clause.iter().all(|p| p.is_valid_for(schema)) {
                        node = Box::new(Selection::new(node, clause)?);
                        pushed[i] = true;
                        debug!("select: clause {} pushed to {}", i, table);
                    }
                }
            }
            access.push(node);
        }

        // Greedy orientation: the previous table's count against the next one;
        // the smaller side drives the join.
        let mut access = access.into_iter();
        let mut root = access
            .next()
            .ok_or_else(|| DbError::ParseError("SELECT requires at least one table".into()))?;
        for (i, next) in access.enumerate() {
            let prev_count = catalog.row_count_estimate(&tables[i])?;
            let next_count = catalog.row_count_estimate(&tables[i + 1])?;
            root = if prev_count < next_count {
                Box::new(SimpleJoin::new(root, next))
            } else {
                Box::new(SimpleJoin::new(next, root))
            };
            debug!("select: join step {} ({} vs {} rows)", i + 1, prev_count, next_count);
        }

        for (i, clause) in clauses.iter().enumerate() {
            if !pushed[i] {
                root = Box::new(Selection::new(root, clause)?);
            }
        }

        if !projection.is_empty() {
            let fields = projection
                .iter()
                .map(|c| {
                    root.schema()
                        .field_number(c)
                        .ok_or_else(|| DbError::UnresolvedProjection(c.clone()))
                })
                .collect::<DbResult<Vec<_>>>()?;
            root = Box::new(Projection::new(root, fields));
        }

        Ok(SelectPlan { root, sort_keys })
    }

    /// Accepted but not applied to the output.
    pub fn sort_keys(&self) -> &[SortKey] {
        &self.sort_keys
    }

    pub fn schema(&self) -> &Schema {
        self.root.schema()
    }

    pub fn state(&self) -> OperatorState {
        self.root.state()
    }

    /// Drain the pipeline, then close it whether or not draining failed.
    pub fn execute(mut self) -> DbResult<ResultSet> {
        let rows = self.root.execute();
        self.root.close();
        Ok(ResultSet { schema: self.root.schema().clone(), rows: rows? })
    }

    pub fn explain(&self) -> String {
        let mut out = String::new();
        self.root.explain(0, &mut out);
        out
    }
}
