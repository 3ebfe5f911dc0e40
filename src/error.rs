use thiserror::Error;
use std::io;

use crate::storage::heap::Rid;
use crate::storage::row::ColumnType;

/// Which stage of the pipeline an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A table, column or index is missing, or already exists.
    Reference,
    /// A literal, operand or value does not match the expected type or arity.
    Type,
    /// A predicate or projection column cannot be resolved.
    Schema,
    /// The statement text could not be parsed.
    Parse,
    /// A fault raised by the record store or an index while executing.
    Execution,
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("table '{0}' not found")]
    TableNotFound(String),
    #[error("table '{0}' already exists")]
    TableExists(String),
    #[error("column '{0}' not found")]
    ColumnNotFound(String),
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),
    #[error("index '{0}' not found")]
    IndexNotFound(String),
    #[error("index '{0}' already exists")]
    IndexExists(String),
    #[error("column '{table}.{column}' is already indexed by '{index}'")]
    ColumnAlreadyIndexed {
        table: String,
        column: String,
        index: String,
    },
    #[error("value {value} does not match type {expected} of column '{column}'")]
    TypeMismatch {
        column: String,
        expected: ColumnType,
        value: String,
    },
    #[error("expected {expected} values, got {found}")]
    ArityMismatch { expected: usize, found: usize },
    #[error("operands of predicate '{0}' are not comparable")]
    PredicateTypeMismatch(String),
    #[error("predicate column '{0}' cannot be resolved")]
    UnresolvedPredicate(String),
    #[error("projection column '{0}' does not exist")]
    UnresolvedProjection(String),
    #[error("record {0} not found")]
    RecordNotFound(Rid),
    #[error("record of {0} bytes does not fit in a page")]
    RecordTooLarge(usize),
    #[error("entry for {rid} not found in index '{index}'")]
    IndexEntryNotFound { index: String, rid: Rid },
    #[error("index '{0}' has been deleted")]
    IndexDeleted(String),
    #[error("operator pulled after close")]
    OperatorClosed,
    #[error("corrupt data: {0}")]
    Corrupt(String),
    #[error("parse error: {0}")]
    ParseError(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl DbError {
    pub fn kind(&self) -> ErrorKind {
        use DbError::*;
        match self {
            TableNotFound(_)
            | TableExists(_)
            | ColumnNotFound(_)
            | DuplicateColumn(_)
            | IndexNotFound(_)
            | IndexExists(_)
            | ColumnAlreadyIndexed { .. } => ErrorKind::Reference,
            TypeMismatch { .. } | ArityMismatch { .. } | PredicateTypeMismatch(_) => ErrorKind::Type,
            UnresolvedPredicate(_) | UnresolvedProjection(_) => ErrorKind::Schema,
            ParseError(_) => ErrorKind::Parse,
            RecordNotFound(_)
            | RecordTooLarge(_)
            | IndexEntryNotFound { .. }
            | IndexDeleted(_)
            | OperatorClosed
            | Corrupt(_)
            | Io(_) => ErrorKind::Execution,
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;
