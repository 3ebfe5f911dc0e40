// src/planner/check.rs
//! Validation shared by the plan builders. Everything here runs before any
//! side effect of the statement.

use crate::catalog::Catalog;
use crate::error::{DbError, DbResult};
use crate::execution::predicate::check_cnf;
use crate::index::SearchKey;
use crate::sql::ast::{Cnf, Literal};
use crate::storage::heap::MAX_TUPLE_SIZE;
use crate::storage::row::{ColumnValue, Tuple};
use crate::storage::schema::{Column, Schema};

pub fn table_exists(catalog: &Catalog, table: &str) -> DbResult<()> {
    if catalog.table_exists(table) {
        Ok(())
    } else {
        Err(DbError::TableNotFound(table.to_string()))
    }
}

pub fn column_exists(schema: &Schema, column: &str) -> DbResult<usize> {
    schema
        .field_number(column)
        .ok_or_else(|| DbError::ColumnNotFound(column.to_string()))
}

fn coerce(column: &Column, literal: &Literal) -> DbResult<ColumnValue> {
    literal.coerce(column.ty).ok_or_else(|| DbError::TypeMismatch {
        column: column.name.clone(),
        expected: column.ty,
        value: literal.to_string(),
    })
}

/// Build the tuple an INSERT stores: arity first, then per-column types.
pub fn insert_values(schema: &Schema, values: &[Literal]) -> DbResult<Tuple> {
    if values.len() != schema.len() {
        return Err(DbError::ArityMismatch { expected: schema.len(), found: values.len() });
    }
    let fields = schema
        .columns()
        .iter()
        .zip(values)
        .map(|(col, lit)| coerce(col, lit))
        .collect::<DbResult<Vec<_>>>()?;
    Ok(Tuple::new(fields))
}

/// Resolve every SET target and type its value against that target column.
pub fn update_values(
    schema: &Schema,
    columns: &[String],
    values: &[Literal],
) -> DbResult<Vec<(usize, ColumnValue)>> {
    if columns.len() != values.len() {
        return Err(DbError::ArityMismatch { expected: columns.len(), found: values.len() });
    }
    let targets = columns
        .iter()
        .map(|c| column_exists(schema, c))
        .collect::<DbResult<Vec<_>>>()?;
    targets
        .into_iter()
        .zip(values)
        .map(|(idx, lit)| {
            let col = schema
                .column(idx)
                .ok_or_else(|| DbError::ColumnNotFound(idx.to_string()))?;
            Ok((idx, coerce(col, lit)?))
        })
        .collect()
}

/// The stored record and every index entry of `tuple` must fit on a page.
pub fn fits_storage(catalog: &Catalog, table: &str, schema: &Schema, tuple: &Tuple) -> DbResult<()> {
    let size = tuple.serialize().len();
    if size > MAX_TUPLE_SIZE {
        return Err(DbError::RecordTooLarge(size));
    }
    for desc in catalog.indexes_of(table) {
        SearchKey::from_tuple(tuple, schema, &desc.column_name)?.check_fits()?;
    }
    Ok(())
}

/// Assigned values that could never be stored, whatever row they land in.
pub fn assignments_fit(
    catalog: &Catalog,
    table: &str,
    schema: &Schema,
    assignments: &[(usize, ColumnValue)],
) -> DbResult<()> {
    let indexed: Vec<usize> = catalog
        .indexes_of(table)
        .iter()
        .filter_map(|desc| schema.field_number(&desc.column_name))
        .collect();
    for (idx, value) in assignments {
        let key = SearchKey::new(value.clone());
        // Two bytes of tuple header plus the value itself.
        if key.encode().len() + 2 > MAX_TUPLE_SIZE {
            return Err(DbError::RecordTooLarge(key.encode().len() + 2));
        }
        if indexed.contains(idx) {
            key.check_fits()?;
        }
    }
    Ok(())
}

pub fn predicates(cnf: &Cnf, schema: &Schema) -> DbResult<()> {
    check_cnf(cnf, schema)
}
