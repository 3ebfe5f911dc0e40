// src/execution/scan.rs
use crate::error::DbResult;
use crate::execution::executor::{Executor, OperatorState, explain_line};
use crate::storage::heap::{HeapScan, Rid, SharedHeap};
use crate::storage::row::Tuple;
use crate::storage::schema::Schema;

/// Sequential scan over one table's heap file.
pub struct FileScan {
    table: String,
    schema: Schema,
    scan: HeapScan,
    state: OperatorState,
}

impl FileScan {
    pub fn open(table: &str, heap: SharedHeap, schema: Schema) -> Self {
        FileScan {
            table: table.to_string(),
            schema,
            scan: HeapScan::open(heap),
            state: OperatorState::Unopened,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// RID of the row most recently returned by `next`.
    pub fn last_rid(&self) -> Option<Rid> {
        self.scan.last_rid()
    }
}

impl Executor for FileScan {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn next(&mut self) -> DbResult<Option<Tuple>> {
        if !self.state.can_pull()? {
            return Ok(None);
        }
        let row = self.scan.next_tuple()?;
        self.state = OperatorState::after_pull(&row);
        Ok(row)
    }

    fn restart(&mut self) -> DbResult<()> {
        self.state.can_restart()?;
        self.scan.restart();
        self.state = OperatorState::Unopened;
        Ok(())
    }

    fn close(&mut self) {
        self.scan.close();
        self.state = OperatorState::Closed;
    }

    fn state(&self) -> OperatorState {
        self.state
    }

    fn explain(&self, depth: usize, out: &mut String) {
        explain_line(depth, &format!("FileScan {}", self.table), out);
    }
}
