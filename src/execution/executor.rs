// src/execution/executor.rs
use crate::error::{DbError, DbResult};
use crate::storage::row::Tuple;
use crate::storage::schema::Schema;

/// Lifecycle of a pull operator.
///
/// `Unopened -> Positioned | Exhausted` on the first pull, `Exhausted` stays
/// put until `restart` or `close`, and `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorState {
    Unopened,
    Positioned,
    Exhausted,
    Closed,
}

impl OperatorState {
    /// Whether a pull should reach the child at all.
    pub fn can_pull(self) -> DbResult<bool> {
        match self {
            OperatorState::Closed => Err(DbError::OperatorClosed),
            OperatorState::Exhausted => Ok(false),
            OperatorState::Unopened | OperatorState::Positioned => Ok(true),
        }
    }

    pub fn after_pull(row: &Option<Tuple>) -> Self {
        if row.is_some() {
            OperatorState::Positioned
        } else {
            OperatorState::Exhausted
        }
    }

    pub fn can_restart(self) -> DbResult<()> {
        if self == OperatorState::Closed {
            Err(DbError::OperatorClosed)
        } else {
            Ok(())
        }
    }
}

/// A node of the operator tree. Rows are pulled one at a time from the root.
pub trait Executor {
    fn schema(&self) -> &Schema;

    /// Next row, or `None` once exhausted. Errors with `OperatorClosed` after `close`.
    fn next(&mut self) -> DbResult<Option<Tuple>>;

    /// Reposition before the first row.
    fn restart(&mut self) -> DbResult<()>;

    /// Release this node and all of its children. Idempotent.
    fn close(&mut self);

    fn state(&self) -> OperatorState;

    fn explain(&self, depth: usize, out: &mut String);

    /// Pull every remaining row.
    fn execute(&mut self) -> DbResult<Vec<Tuple>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next()? {
            rows.push(row);
        }
        Ok(rows)
    }
}

pub(crate) fn explain_line(depth: usize, text: &str, out: &mut String) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(text);
    out.push('\n');
}
