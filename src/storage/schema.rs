use std::fmt;

use crate::storage::row::ColumnType;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
    /// Owning table, used to resolve qualified `table.column` references.
    pub table: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Column { name: name.into(), ty, table: None }
    }

    pub fn qualified_name(&self) -> String {
        match &self.table {
            Some(t) => format!("{}.{}", t, self.name),
            None => self.name.clone(),
        }
    }

    fn matches(&self, reference: &str) -> bool {
        match reference.split_once('.') {
            Some((table, name)) => self.table.as_deref() == Some(table) && self.name == name,
            None => self.name == reference,
        }
    }
}

/// Ordered list of typed columns for a table or an intermediate result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Schema { columns }
    }

    pub fn empty() -> Self {
        Schema::default()
    }

    /// Build a table schema; every column is tagged with `table`.
    pub fn for_table(table: &str, columns: Vec<(String, ColumnType)>) -> Self {
        Schema {
            columns: columns
                .into_iter()
                .map(|(name, ty)| Column { name, ty, table: Some(table.to_string()) })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, idx: usize) -> Option<&Column> {
        self.columns.get(idx)
    }

    /// Position of the first column matching `reference`, which is either a
    /// bare column name or `table.column`.
    pub fn field_number(&self, reference: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.matches(reference))
    }

    pub fn field_type(&self, reference: &str) -> Option<ColumnType> {
        self.field_number(reference).map(|i| self.columns[i].ty)
    }

    /// Concatenate two schemas, left columns first.
    pub fn join(left: &Schema, right: &Schema) -> Schema {
        let mut columns = left.columns.clone();
        columns.extend(right.columns.iter().cloned());
        Schema { columns }
    }

    pub fn project(&self, fields: &[usize]) -> Schema {
        Schema {
            columns: fields.iter().filter_map(|&i| self.columns.get(i).cloned()).collect(),
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.ty))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t1() -> Schema {
        Schema::for_table("t1", vec![("a".into(), ColumnType::Integer), ("b".into(), ColumnType::Text)])
    }

    fn t2() -> Schema {
        Schema::for_table("t2", vec![("a".into(), ColumnType::Float)])
    }

    #[test]
    fn joined_schema_keeps_order_and_resolves_qualified_names() {
        let joined = Schema::join(&t1(), &t2());
        assert_eq!(joined.len(), 3);
        assert_eq!(joined.field_number("a"), Some(0));
        assert_eq!(joined.field_number("t2.a"), Some(2));
        assert_eq!(joined.field_number("t1.b"), Some(1));
        assert_eq!(joined.field_number("t2.b"), None);
        assert_eq!(joined.field_type("t2.a"), Some(ColumnType::Float));
    }

    #[test]
    fn reversed_join_changes_first_match() {
        let joined = Schema::join(&t2(), &t1());
        assert_eq!(joined.field_number("a"), Some(0));
        assert_eq!(joined.column(0).unwrap().qualified_name(), "t2.a");
        assert_eq!(joined.field_number("t1.a"), Some(1));
    }
}
