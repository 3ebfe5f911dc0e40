// src/execution/selection.rs
use crate::error::DbResult;
use crate::execution::executor::{Executor, OperatorState, explain_line};
use crate::execution::predicate::{BoundPredicate, bind_clause, matches_clause};
use crate::sql::ast::{Predicate, clause_to_string};
use crate::storage::row::Tuple;
use crate::storage::schema::Schema;

/// Passes through the child rows that satisfy one OR-clause.
/// Several clauses are applied by nesting selections.
pub struct Selection {
    child: Box<dyn Executor>,
    clause: Vec<BoundPredicate>,
    text: String,
    state: OperatorState,
}

impl Selection {
    pub fn new(child: Box<dyn Executor>, clause: &[Predicate]) -> DbResult<Self> {
        let bound = bind_clause(clause, child.schema())?;
        Ok(Selection {
            child,
            clause: bound,
            text: clause_to_string(clause),
            state: OperatorState::Unopened,
        })
    }
}

impl Executor for Selection {
    fn schema(&self) -> &Schema {
        self.child.schema()
    }

    fn next(&mut self) -> DbResult<Option<Tuple>> {
        if !self.state.can_pull()? {
            return Ok(None);
        }
        while let Some(row) = self.child.next()? {
            if matches_clause(&self.clause, &row) {
                self.state = OperatorState::Positioned;
                return Ok(Some(row));
            }
        }
        self.state = OperatorState::Exhausted;
        Ok(None)
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
        explain_line(depth, &format!("Selection ({})", self.text), out);
        self.child.explain(depth + 1, out);
    }
}
