use std::path::Path;

use log::debug;

use crate::catalog::Catalog;
use crate::error::DbResult;
use crate::planner::{Plan, PlanOutput, PlannerOptions};
use crate::sql::ast::Statement;
use crate::sql::parser::parse_statement;

/// Parse, plan and run statements against one catalog.
pub struct Engine {
    pub catalog: Catalog,
    options: PlannerOptions,
}

impl Engine {
    pub fn open(dir: &Path) -> DbResult<Self> {
        Engine::with_options(dir, PlannerOptions::default())
    }

    pub fn with_options(dir: &Path, options: PlannerOptions) -> DbResult<Self> {
        Ok(Engine { catalog: Catalog::create(dir)?, options })
    }

    pub fn options(&self) -> PlannerOptions {
        self.options
    }

    pub fn set_options(&mut self, options: PlannerOptions) {
        self.options = options;
    }

    /// Validate and plan without running anything.
    pub fn plan(&self, stmt: Statement) -> DbResult<Plan> {
        Plan::build_with(stmt, &self.catalog, &self.options)
    }

    pub fn execute(&mut self, stmt: Statement) -> DbResult<PlanOutput> {
        let plan = self.plan(stmt)?;
        plan.execute(&mut self.catalog)
    }

    pub fn execute_sql(&mut self, sql: &str) -> DbResult<PlanOutput> {
        debug!("sql: {}", sql);
        let stmt = parse_statement(sql)?;
        self.execute(stmt)
    }

    pub fn explain_sql(&self, sql: &str) -> DbResult<String> {
        let plan = self.plan(parse_statement(sql)?)?;
        Ok(plan.explain())
    }
}
