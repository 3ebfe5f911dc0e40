// src/execution/join.rs
use crate::error::DbResult;
use crate::execution::executor::{Executor, OperatorState, explain_line};
use crate::storage::row::Tuple;
use crate::storage::schema::Schema;

/// Nested-loop join without a condition. For each outer row the inner side
/// is restarted and run to exhaustion. Output columns are outer then inner.
pub struct SimpleJoin {
    outer: Box<dyn Executor>,
    inner: Box<dyn Executor>,
    schema: Schema,
    current_outer: Option<Tuple>,
    state: OperatorState,
}

impl SimpleJoin {
    pub fn new(outer: Box<dyn Executor>, inner: Box<dyn Executor>) -> Self {
        let schema = Schema::join(outer.schema(), inner.schema());
        SimpleJoin { outer, inner, schema, current_outer: None, state: OperatorState::Unopened }
    }
}

impl Executor for SimpleJoin {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn next(&mut self) -> DbResult<Option<Tuple>> {
        if !self.state.can_pull()? {
            return Ok(None);
        }
        loop {
            let outer_row = match self.current_outer.take() {
                Some(row) => row,
                None => match self.outer.next()? {
                    Some(row) => {
                        self.inner.restart()?;
                        row
                    }
                    None => {
                        self.state = OperatorState::Exhausted;
                        return Ok(None);
                    }
                },
            };
            if let Some(inner_row) = self.inner.next()? {
                let joined = Tuple::join(&outer_row, &inner_row);
                self.current_outer = Some(outer_row);
                self.state = OperatorState::Positioned;
                return Ok(Some(joined));
            }
        }
    }

    fn restart(&mut self) -> DbResult<()> {
        self.state.can_restart()?;
        self.outer.restart()?;
        self.current_outer = None;
        self.state = OperatorState::Unopened;
        Ok(())
    }

    fn close(&mut self) {
        self.outer.close();
        self.inner.close();
        self.current_outer = None;
        self.state = OperatorState::Closed;
    }

    fn state(&self) -> OperatorState {
        self.state
    }

    fn explain(&self, depth: usize, out: &mut String) {
        explain_line(depth, "SimpleJoin", out);
        self.outer.explain(depth + 1, out);
        self.inner.explain(depth + 1, out);
    }
}
