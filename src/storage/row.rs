use std::cmp::Ordering;
use std::fmt;

use chrono::{Datelike, NaiveDate};

use crate::error::{DbError, DbResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Text,
    Date,
}

impl ColumnType {
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "INTEGER" | "INT" => Some(ColumnType::Integer),
            "FLOAT" | "REAL" | "DOUBLE" => Some(ColumnType::Float),
            "TEXT" | "STRING" | "VARCHAR" => Some(ColumnType::Text),
            "DATE" => Some(ColumnType::Date),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Float => "FLOAT",
            ColumnType::Text => "TEXT",
            ColumnType::Date => "DATE",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    /// Whether values of the two types can be compared with each other.
    pub fn comparable_with(&self, other: ColumnType) -> bool {
        *self == other || (self.is_numeric() && other.is_numeric())
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed field value.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Integer(i32),
    Float(f64),
    Text(String),
    Date(NaiveDate),
}

const TAG_INTEGER: u8 = 0x01;
const TAG_FLOAT: u8 = 0x02;
const TAG_TEXT: u8 = 0x03;
const TAG_DATE: u8 = 0x04;

impl ColumnValue {
    pub fn column_type(&self) -> ColumnType {
        match self {
            ColumnValue::Integer(_) => ColumnType::Integer,
            ColumnValue::Float(_) => ColumnType::Float,
            ColumnValue::Text(_) => ColumnType::Text,
            ColumnValue::Date(_) => ColumnType::Date,
        }
    }

    /// Typed comparison. Integers and floats compare numerically; any other
    /// mix of types is incomparable.
    pub fn compare(&self, other: &ColumnValue) -> Option<Ordering> {
        use ColumnValue::*;
        match (self, other) {
            (Integer(a), Integer(b)) => Some(a.cmp(b)),
            (Float(a), Float(b)) => a.partial_cmp(b),
            (Integer(a), Float(b)) => (*a as f64).partial_cmp(b),
            (Float(a), Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Text(a), Text(b)) => Some(a.cmp(b)),
            (Date(a), Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Append the tagged binary form of this value to `buf`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        match self {
            ColumnValue::Integer(i) => {
                buf.push(TAG_INTEGER);
                buf.extend(&i.to_le_bytes());
            }
            ColumnValue::Float(f) => {
                buf.push(TAG_FLOAT);
                buf.extend(&f.to_bits().to_le_bytes());
            }
            ColumnValue::Text(s) => {
                buf.push(TAG_TEXT);
                buf.extend(&(s.len() as u32).to_le_bytes());
                buf.extend(s.as_bytes());
            }
            ColumnValue::Date(d) => {
                buf.push(TAG_DATE);
                buf.extend(&d.num_days_from_ce().to_le_bytes());
            }
        }
    }

    /// Decode one value starting at `*offset`, advancing it past the value.
    pub fn decode_from(bytes: &[u8], offset: &mut usize) -> DbResult<ColumnValue> {
        let tag = *bytes
            .get(*offset)
            .ok_or_else(|| DbError::Corrupt("unexpected end of value".into()))?;
        *offset += 1;
        let value = match tag {
            TAG_INTEGER => {
                let raw = take::<4>(bytes, offset)?;
                ColumnValue::Integer(i32::from_le_bytes(raw))
            }
            TAG_FLOAT => {
                let raw = take::<8>(bytes, offset)?;
                ColumnValue::Float(f64::from_bits(u64::from_le_bytes(raw)))
            }
            TAG_TEXT => {
                let len = u32::from_le_bytes(take::<4>(bytes, offset)?) as usize;
                let end = *offset + len;
                let raw = bytes
                    .get(*offset..end)
                    .ok_or_else(|| DbError::Corrupt("text runs past end of record".into()))?;
                *offset = end;
                ColumnValue::Text(String::from_utf8_lossy(raw).into_owned())
            }
            TAG_DATE => {
                // days since 0001-01-01
                let days = i32::from_le_bytes(take::<4>(bytes, offset)?);
                let d = NaiveDate::from_num_days_from_ce_opt(days)
                    .ok_or_else(|| DbError::Corrupt(format!("bad date {}", days)))?;
                ColumnValue::Date(d)
            }
            other => return Err(DbError::Corrupt(format!("unknown type tag {:#04x}", other))),
        };
        Ok(value)
    }
}

fn take<const N: usize>(bytes: &[u8], offset: &mut usize) -> DbResult<[u8; N]> {
    let raw: [u8; N] = bytes
        .get(*offset..*offset + N)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| DbError::Corrupt("unexpected end of record".into()))?;
    *offset += N;
    Ok(raw)
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnValue::Integer(i) => write!(f, "{}", i),
            ColumnValue::Float(x) => write!(f, "{}", x),
            ColumnValue::Text(s) => write!(f, "{}", s),
            ColumnValue::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
        }
    }
}

/// One materialized record. Fields are addressed by schema position.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple(pub Vec<ColumnValue>);

impl Tuple {
    pub fn new(values: Vec<ColumnValue>) -> Self {
        Tuple(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, idx: usize) -> Option<&ColumnValue> {
        self.0.get(idx)
    }

    pub fn set_field(&mut self, idx: usize, value: ColumnValue) {
        if let Some(slot) = self.0.get_mut(idx) {
            *slot = value;
        }
    }

    pub fn values(&self) -> &[ColumnValue] {
        &self.0
    }

    /// Concatenate two tuples, left fields first.
    pub fn join(left: &Tuple, right: &Tuple) -> Tuple {
        let mut values = Vec::with_capacity(left.len() + right.len());
        values.extend(left.0.iter().cloned());
        values.extend(right.0.iter().cloned());
        Tuple(values)
    }

    /// Keep only the fields at `fields`, in that order.
    pub fn project(&self, fields: &[usize]) -> Tuple {
        Tuple(fields.iter().map(|&i| self.0[i].clone()).collect())
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend(&(self.0.len() as u16).to_le_bytes());
        for col in &self.0 {
            col.encode_into(&mut buf);
        }
        buf
    }

    pub fn deserialize(bytes: &[u8]) -> DbResult<Tuple> {
        let mut offset = 0;
        let num_cols = u16::from_le_bytes(take::<2>(bytes, &mut offset)?) as usize;
        let mut cols = Vec::with_capacity(num_cols);
        for _ in 0..num_cols {
            cols.push(ColumnValue::decode_from(bytes, &mut offset)?);
        }
        Ok(Tuple(cols))
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|v| v.to_string()).collect();
        write!(f, "{}", parts.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuple_survives_storage_encoding() {
        let t = Tuple::new(vec![
            ColumnValue::Integer(-7),
            ColumnValue::Float(2.5),
            ColumnValue::Text("héllo".into()),
            ColumnValue::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()),
        ]);
        assert_eq!(Tuple::deserialize(&t.serialize()).unwrap(), t);
    }

    #[test]
    fn truncated_record_is_corrupt() {
        let t = Tuple::new(vec![ColumnValue::Text("abcdef".into())]);
        let bytes = t.serialize();
        let err = Tuple::deserialize(&bytes[..bytes.len() - 2]).unwrap_err();
        assert!(matches!(err, DbError::Corrupt(_)));
    }

    #[test]
    fn numeric_values_compare_across_types() {
        assert_eq!(
            ColumnValue::Integer(2).compare(&ColumnValue::Float(2.5)),
            Some(Ordering::Less)
        );
        assert_eq!(ColumnValue::Integer(1).compare(&ColumnValue::Text("1".into())), None);
    }
}
