// src/execution/predicate.rs
use std::cmp::Ordering;

use crate::error::{DbError, DbResult};
use crate::sql::ast::{CompareOp, Operand, Predicate};
use crate::storage::row::{ColumnType, ColumnValue, Tuple};
use crate::storage::schema::Schema;

/// Operand resolved against one schema: a field position or a typed constant.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundOperand {
    Field(usize),
    Value(ColumnValue),
}

impl BoundOperand {
    fn resolve<'a>(&'a self, tuple: &'a Tuple) -> Option<&'a ColumnValue> {
        match self {
            BoundOperand::Field(idx) => tuple.field(*idx),
            BoundOperand::Value(v) => Some(v),
        }
    }
}

/// A predicate whose column references and literal types were resolved once,
/// so evaluation per row is a pair of lookups and one comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundPredicate {
    pub op: CompareOp,
    pub left: BoundOperand,
    pub right: BoundOperand,
}

fn holds(op: CompareOp, ord: Ordering) -> bool {
    match op {
        CompareOp::Eq => ord == Ordering::Equal,
        CompareOp::Ne => ord != Ordering::Equal,
        CompareOp::Lt => ord == Ordering::Less,
        CompareOp::Le => ord != Ordering::Greater,
        CompareOp::Gt => ord == Ordering::Greater,
        CompareOp::Ge => ord != Ordering::Less,
    }
}

impl BoundPredicate {
    pub fn evaluate(&self, tuple: &Tuple) -> bool {
        match (self.left.resolve(tuple), self.right.resolve(tuple)) {
            (Some(l), Some(r)) => l.compare(r).is_some_and(|ord| holds(self.op, ord)),
            _ => false,
        }
    }
}

fn column_type(schema: &Schema, name: &str) -> DbResult<ColumnType> {
    schema
        .field_type(name)
        .ok_or_else(|| DbError::UnresolvedPredicate(name.to_string()))
}

impl Predicate {
    /// Type-check against `schema`: every column must resolve and the two
    /// operands must be comparable.
    pub fn check(&self, schema: &Schema) -> DbResult<()> {
        let comparable = match (&self.left, &self.right) {
            (Operand::Column(l), Operand::Column(r)) => {
                column_type(schema, l)?.comparable_with(column_type(schema, r)?)
            }
            (Operand::Column(c), Operand::Literal(lit))
            | (Operand::Literal(lit), Operand::Column(c)) => {
                let ty = column_type(schema, c)?;
                lit.coerce(ty).is_some() || (ty.is_numeric() && lit.natural_type().is_numeric())
            }
            (Operand::Literal(a), Operand::Literal(b)) => {
                a.natural_type().comparable_with(b.natural_type())
            }
        };
        if comparable {
            Ok(())
        } else {
            Err(DbError::PredicateTypeMismatch(self.to_string()))
        }
    }

    pub fn is_valid_for(&self, schema: &Schema) -> bool {
        self.check(schema).is_ok()
    }

    /// Rewrite column references to `table.column` as resolved in `schema`.
    /// References that do not resolve are left untouched.
    pub fn qualify(&self, schema: &Schema) -> Predicate {
        let rewrite = |operand: &Operand| match operand {
            Operand::Column(name) => match schema.field_number(name).and_then(|i| schema.column(i)) {
                Some(col) => Operand::Column(col.qualified_name()),
                None => operand.clone(),
            },
            Operand::Literal(_) => operand.clone(),
        };
        Predicate::new(self.op, rewrite(&self.left), rewrite(&self.right))
    }

    pub fn bind(&self, schema: &Schema) -> DbResult<BoundPredicate> {
        self.check(schema)?;
        Ok(BoundPredicate {
            op: self.op,
            left: bind_operand(&self.left, &self.right, schema)?,
            right: bind_operand(&self.right, &self.left, schema)?,
        })
    }
}

/// A literal takes the type of the column it is compared with when it can.
fn bind_operand(operand: &Operand, other: &Operand, schema: &Schema) -> DbResult<BoundOperand> {
    match operand {
        Operand::Column(name) => schema
            .field_number(name)
            .map(BoundOperand::Field)
            .ok_or_else(|| DbError::UnresolvedPredicate(name.clone())),
        Operand::Literal(lit) => {
            let coerced = match other {
                Operand::Column(c) => schema.field_type(c).and_then(|ty| lit.coerce(ty)),
                Operand::Literal(_) => None,
            };
            Ok(BoundOperand::Value(coerced.unwrap_or_else(|| lit.to_value())))
        }
    }
}

pub fn check_cnf(cnf: &[Vec<Predicate>], schema: &Schema) -> DbResult<()> {
    cnf.iter().flatten().try_for_each(|p| p.check(schema))
}

pub fn bind_clause(clause: &[Predicate], schema: &Schema) -> DbResult<Vec<BoundPredicate>> {
    clause.iter().map(|p| p.bind(schema)).collect()
}

pub fn bind_cnf(cnf: &[Vec<Predicate>], schema: &Schema) -> DbResult<Vec<Vec<BoundPredicate>>> {
    cnf.iter().map(|clause| bind_clause(clause, schema)).collect()
}

/// OR over the clause. An empty clause is never satisfied.
pub fn matches_clause(clause: &[BoundPredicate], tuple: &Tuple) -> bool {
    clause.iter().any(|p| p.evaluate(tuple))
}

/// AND over the clauses. No clauses at all matches every tuple.
pub fn matches_cnf(cnf: &[Vec<BoundPredicate>], tuple: &Tuple) -> bool {
    cnf.iter().all(|clause| matches_clause(clause, tuple))
}
