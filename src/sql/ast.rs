// src/sql/ast.rs
use std::fmt;

use chrono::NaiveDate;

use crate::storage::row::{ColumnType, ColumnValue, DATE_FORMAT};

/// A literal as written in the statement, before it meets a column type.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i32),
    Float(f64),
    Text(String),
}

impl Literal {
    pub fn natural_type(&self) -> ColumnType {
        match self {
            Literal::Integer(_) => ColumnType::Integer,
            Literal::Float(_) => ColumnType::Float,
            Literal::Text(_) => ColumnType::Text,
        }
    }

    pub fn to_value(&self) -> ColumnValue {
        match self {
            Literal::Integer(i) => ColumnValue::Integer(*i),
            Literal::Float(f) => ColumnValue::Float(*f),
            Literal::Text(s) => ColumnValue::Text(s.clone()),
        }
    }

    /// Convert to a value of column type `ty`, if the literal can be stored there.
    pub fn coerce(&self, ty: ColumnType) -> Option<ColumnValue> {
        match (self, ty) {
            (Literal::Integer(i), ColumnType::Integer) => Some(ColumnValue::Integer(*i)),
            (Literal::Integer(i), ColumnType::Float) => Some(ColumnValue::Float(*i as f64)),
            (Literal::Float(f), ColumnType::Float) => Some(ColumnValue::Float(*f)),
            (Literal::Text(s), ColumnType::Text) => Some(ColumnValue::Text(s.clone())),
            (Literal::Text(s), ColumnType::Date) => NaiveDate::parse_from_str(s, DATE_FORMAT)
                .ok()
                .map(ColumnValue::Date),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(i) => write!(f, "{}", i),
            Literal::Float(x) => write!(f, "{}", x),
            Literal::Text(s) => write!(f, "'{}'", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Column(String),
    Literal(Literal),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Column(c) => write!(f, "{}", c),
            Operand::Literal(l) => write!(f, "{}", l),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// A single comparison, `left op right`. Binding and evaluation live in
/// `execution::predicate`.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub op: CompareOp,
    pub left: Operand,
    pub right: Operand,
}

impl Predicate {
    pub fn new(op: CompareOp, left: Operand, right: Operand) -> Self {
        Predicate { op, left, right }
    }

    /// Shorthand for `column op literal`.
    pub fn column_literal(column: &str, op: CompareOp, value: Literal) -> Self {
        Predicate::new(op, Operand::Column(column.to_string()), Operand::Literal(value))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.op.as_str(), self.right)
    }
}

/// Predicates OR-ed together.
pub type Clause = Vec<Predicate>;

/// Clauses AND-ed together (conjunctive normal form). Empty matches every row.
pub type Cnf = Vec<Clause>;

pub fn clause_to_string(clause: &[Predicate]) -> String {
    clause.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(" OR ")
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub column: String,
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable {
        table_name: String,
        columns: Vec<(String, ColumnType)>,
    },
    DropTable {
        table_name: String,
    },
    CreateIndex {
        index_name: String,
        table_name: String,
        column_name: String,
    },
    DropIndex {
        index_name: String,
    },
    Insert {
        table_name: String,
        values: Vec<Literal>,
    },
    Delete {
        table_name: String,
        predicates: Cnf,
    },
    Update {
        table_name: String,
        columns: Vec<String>,
        values: Vec<Literal>,
        predicates: Cnf,
    },
    Select {
        /// Empty means every column (`SELECT *`).
        columns: Vec<String>,
        tables: Vec<String>,
        predicates: Cnf,
        order_by: Vec<SortKey>,
    },
}

impl Statement {
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::CreateTable { .. } => "CREATE TABLE",
            Statement::DropTable { .. } => "DROP TABLE",
            Statement::CreateIndex { .. } => "CREATE INDEX",
            Statement::DropIndex { .. } => "DROP INDEX",
            Statement::Insert { .. } => "INSERT",
            Statement::Delete { .. } => "DELETE",
            Statement::Update { .. } => "UPDATE",
            Statement::Select { .. } => "SELECT",
        }
    }
}
