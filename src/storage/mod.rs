pub mod heap;
pub mod page;
pub mod pager;
pub mod row;
pub mod schema;

pub use heap::{HeapFile, HeapScan, MAX_TUPLE_SIZE, Rid};
pub use row::{ColumnType, ColumnValue, Tuple};
pub use schema::{Column, Schema};
