// src/execution/projection.rs
use crate::error::DbResult;
use crate::execution::executor::{Executor, OperatorState, explain_line};
use crate::storage::row::Tuple;
use crate::storage::schema::Schema;

pub struct Projection {
    child: Box<dyn Executor>,
    fields: Vec<usize>,
    schema: Schema,
    state: OperatorState,
}

impl Projection {
    /// `fields` are positions in the child's schema.
    pub fn new(child: Box<dyn Executor>, fields: Vec<usize>) -> Self {
        let schema = child.schema().project(&fields);
        Projection { child, fields, schema, state: OperatorState::Unopened }
    }
}

impl Executor for Projection {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn next(&mut self) -> DbResult<Option<Tuple>> {
        if !self.state.can_pull()? {
            return Ok(None);
        }
        let row = self.child.next()?.map(|t| t.project(&self.fields));
        self.state = OperatorState::after_pull(&row);
        Ok(row)
    }

    fn restart(&mut self) -> DbResult<()> {
        self.state.can_restart()?;
        self.child.restart()?;
        self.state = OperatorState::Unopened;
        Ok(())
    }

    fn close(&mut self) {
        self.child.close();
        self.state = OperatorState::Closed;
    }

    fn state(&self) -> OperatorState {
        self.state
    }

    fn explain(&self, depth: usize, out: &mut String) {
        let names: Vec<String> = self.schema.columns().iter().map(|c| c.qualified_name()).collect();
        explain_line(depth, &format!("Projection [{}]", names.join(", ")), out);
        self.child.explain(depth + 1, out);
    }
}
