#![forbid(unsafe_code)]

use std::fmt;
use std::sync::Arc;

/// Physical element type of a [`crate::Column`].
///
/// `Oid` is the position type: dense row/cell identifiers produced by selections and joins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Int8,
    Int16,
    Int32,
    #[default]
    Int64,
    Int128,
    Oid,
    Float32,
    Float64,
    String,
}

impl ColumnType {
    pub fn name(self) -> &'static str {
        match self {
            ColumnType::Int8 => "bte",
            ColumnType::Int16 => "sht",
            ColumnType::Int32 => "int",
            ColumnType::Int64 => "lng",
            ColumnType::Int128 => "hge",
            ColumnType::Oid => "oid",
            ColumnType::Float32 => "flt",
            ColumnType::Float64 => "dbl",
            ColumnType::String => "str",
        }
    }

    /// Fixed-width numeric types (everything except strings).
    pub fn is_numeric(self) -> bool {
        !matches!(self, ColumnType::String)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single scalar read from (or appended to) a column.
///
/// `Null` stands for the column type's nil sentinel; reading a nil cell always yields `Null`.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Int128(i128),
    Oid(u64),
    Float32(f32),
    Float64(f64),
    String(Arc<str>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The column type this value belongs to, or `None` for `Null` (which fits every type).
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Value::Null => None,
            Value::Int8(_) => Some(ColumnType::Int8),
            Value::Int16(_) => Some(ColumnType::Int16),
            Value::Int32(_) => Some(ColumnType::Int32),
            Value::Int64(_) => Some(ColumnType::Int64),
            Value::Int128(_) => Some(ColumnType::Int128),
            Value::Oid(_) => Some(ColumnType::Oid),
            Value::Float32(_) => Some(ColumnType::Float32),
            Value::Float64(_) => Some(ColumnType::Float64),
            Value::String(_) => Some(ColumnType::String),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("nil"),
            Value::Int8(v) => write!(f, "{v}"),
            Value::Int16(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Int128(v) => write!(f, "{v}"),
            Value::Oid(v) => write!(f, "{v}@0"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(Arc::from(value))
    }
}

impl From<Arc<str>> for Value {
    fn from(value: Arc<str>) -> Self {
        Value::String(value)
    }
}
