#![forbid(unsafe_code)]

use crate::native::NativeType;
use crate::stats::ColumnStats;
use crate::types::{ColumnType, Value};
use std::sync::Arc;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("unable to allocate a column of {requested} elements")]
    Allocation { requested: usize },

    #[error("type mismatch: expected {expected} value, got {actual}")]
    TypeMismatch {
        expected: ColumnType,
        actual: String,
    },

    #[error("unsupported arrow data type {0}")]
    UnsupportedArrowType(String),
}

/// Allocate an empty vector able to hold `capacity` elements without aborting on OOM.
pub fn try_allocate<T>(capacity: usize) -> StorageResult<Vec<T>> {
    let mut out = Vec::new();
    out.try_reserve_exact(capacity)
        .map_err(|_| StorageError::Allocation {
            requested: capacity,
        })?;
    Ok(out)
}

/// Typed element storage.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnData {
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Int128(Vec<i128>),
    Oid(Vec<u64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    String(Vec<Option<Arc<str>>>),
}

impl ColumnData {
    fn empty(column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Int8 => ColumnData::Int8(Vec::new()),
            ColumnType::Int16 => ColumnData::Int16(Vec::new()),
            ColumnType::Int32 => ColumnData::Int32(Vec::new()),
            ColumnType::Int64 => ColumnData::Int64(Vec::new()),
            ColumnType::Int128 => ColumnData::Int128(Vec::new()),
            ColumnType::Oid => ColumnData::Oid(Vec::new()),
            ColumnType::Float32 => ColumnData::Float32(Vec::new()),
            ColumnType::Float64 => ColumnData::Float64(Vec::new()),
            ColumnType::String => ColumnData::String(Vec::new()),
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            ColumnData::Int8(_) => ColumnType::Int8,
            ColumnData::Int16(_) => ColumnType::Int16,
            ColumnData::Int32(_) => ColumnType::Int32,
            ColumnData::Int64(_) => ColumnType::Int64,
            ColumnData::Int128(_) => ColumnType::Int128,
            ColumnData::Oid(_) => ColumnType::Oid,
            ColumnData::Float32(_) => ColumnType::Float32,
            ColumnData::Float64(_) => ColumnType::Float64,
            ColumnData::String(_) => ColumnType::String,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Int8(v) => v.len(),
            ColumnData::Int16(v) => v.len(),
            ColumnData::Int32(v) => v.len(),
            ColumnData::Int64(v) => v.len(),
            ColumnData::Int128(v) => v.len(),
            ColumnData::Oid(v) => v.len(),
            ColumnData::Float32(v) => v.len(),
            ColumnData::Float64(v) => v.len(),
            ColumnData::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, row: usize) -> Option<Value> {
        Some(match self {
            ColumnData::Int8(v) => v.get(row)?.to_value(),
            ColumnData::Int16(v) => v.get(row)?.to_value(),
            ColumnData::Int32(v) => v.get(row)?.to_value(),
            ColumnData::Int64(v) => v.get(row)?.to_value(),
            ColumnData::Int128(v) => v.get(row)?.to_value(),
            ColumnData::Oid(v) => v.get(row)?.to_value(),
            ColumnData::Float32(v) => v.get(row)?.to_value(),
            ColumnData::Float64(v) => v.get(row)?.to_value(),
            ColumnData::String(v) => v.get(row)?.clone().map(Value::String).unwrap_or(Value::Null),
        })
    }

    fn reserve(&mut self, additional: usize) -> StorageResult<()> {
        let res = match self {
            ColumnData::Int8(v) => v.try_reserve(additional),
            ColumnData::Int16(v) => v.try_reserve(additional),
            ColumnData::Int32(v) => v.try_reserve(additional),
            ColumnData::Int64(v) => v.try_reserve(additional),
            ColumnData::Int128(v) => v.try_reserve(additional),
            ColumnData::Oid(v) => v.try_reserve(additional),
            ColumnData::Float32(v) => v.try_reserve(additional),
            ColumnData::Float64(v) => v.try_reserve(additional),
            ColumnData::String(v) => v.try_reserve(additional),
        };
        res.map_err(|_| StorageError::Allocation {
            requested: self.len().saturating_add(additional),
        })
    }
}

/// Marks a column as the compact encoding of a regular dimension.
///
/// The encoding stores `element_repeats` copies of `min`, `group_repeats` copies of `max` and the
/// step. When `min == max` the boundary between the two runs cannot be recovered from the data,
/// so the element repeat count travels with the column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DimensionHint {
    pub element_repeats: u64,
}

/// An immutable, finalized column.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    data: ColumnData,
    stats: ColumnStats,
    dimension: Option<DimensionHint>,
}

impl Column {
    pub fn from_vec<T: NativeType>(values: Vec<T>) -> Self {
        let stats = ColumnStats::from_native(&values);
        Self {
            data: T::into_data(values),
            stats,
            dimension: None,
        }
    }

    pub fn from_strings(values: Vec<Option<Arc<str>>>) -> Self {
        let stats = ColumnStats::from_strings(&values);
        Self {
            data: ColumnData::String(values),
            stats,
            dimension: None,
        }
    }

    pub fn from_data(data: ColumnData) -> Self {
        match data {
            ColumnData::Int8(v) => Self::from_vec(v),
            ColumnData::Int16(v) => Self::from_vec(v),
            ColumnData::Int32(v) => Self::from_vec(v),
            ColumnData::Int64(v) => Self::from_vec(v),
            ColumnData::Int128(v) => Self::from_vec(v),
            ColumnData::Oid(v) => Self::from_vec(v),
            ColumnData::Float32(v) => Self::from_vec(v),
            ColumnData::Float64(v) => Self::from_vec(v),
            ColumnData::String(v) => Self::from_strings(v),
        }
    }

    pub fn empty(column_type: ColumnType) -> Self {
        Self::from_data(ColumnData::empty(column_type))
    }

    pub fn with_dimension_hint(mut self, hint: DimensionHint) -> Self {
        self.dimension = Some(hint);
        self
    }

    pub fn dimension_hint(&self) -> Option<DimensionHint> {
        self.dimension
    }

    /// Whether this column holds an encoded dimension rather than materialized values.
    pub fn is_dimension(&self) -> bool {
        self.dimension.is_some()
    }

    pub fn column_type(&self) -> ColumnType {
        self.data.column_type()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn stats(&self) -> &ColumnStats {
        &self.stats
    }

    pub fn is_sorted(&self) -> bool {
        self.stats.sorted
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn into_data(self) -> ColumnData {
        self.data
    }

    /// Typed view of the column; `None` when `T` is not the column's element type.
    pub fn values<T: NativeType>(&self) -> Option<&[T]> {
        T::slice(&self.data)
    }

    pub fn strings(&self) -> Option<&[Option<Arc<str>>]> {
        match &self.data {
            ColumnData::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn get(&self, row: usize) -> Value {
        self.data.get(row).unwrap_or(Value::Null)
    }
}

/// Incrementally builds a [`Column`]. Stats are derived once in [`ColumnBuilder::finish`].
#[derive(Debug)]
pub struct ColumnBuilder {
    data: ColumnData,
}

impl ColumnBuilder {
    pub fn new(column_type: ColumnType) -> Self {
        Self {
            data: ColumnData::empty(column_type),
        }
    }

    pub fn with_capacity(column_type: ColumnType, capacity: usize) -> StorageResult<Self> {
        let mut data = ColumnData::empty(column_type);
        data.reserve(capacity)?;
        Ok(Self { data })
    }

    pub fn column_type(&self) -> ColumnType {
        self.data.column_type()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn push<T: NativeType>(&mut self, value: T) -> StorageResult<()> {
        let expected = self.column_type();
        let values = T::vec_mut(&mut self.data).ok_or_else(|| StorageError::TypeMismatch {
            expected,
            actual: T::COLUMN_TYPE.to_string(),
        })?;
        values.try_reserve(1).map_err(|_| StorageError::Allocation {
            requested: values.len().saturating_add(1),
        })?;
        values.push(value);
        Ok(())
    }

    /// Append `count` copies of `value`.
    pub fn push_repeated(&mut self, value: &Value, count: usize) -> StorageResult<()> {
        self.data.reserve(count)?;
        for _ in 0..count {
            self.append(value)?;
        }
        Ok(())
    }

    pub fn append(&mut self, value: &Value) -> StorageResult<()> {
        let mismatch = |expected: ColumnType| StorageError::TypeMismatch {
            expected,
            actual: value
                .column_type()
                .map(|t| t.to_string())
                .unwrap_or_else(|| "nil".to_string()),
        };

        match self.column_type() {
            ColumnType::Int8 => {
                self.push(i8::from_value(value).ok_or_else(|| mismatch(ColumnType::Int8))?)
            }
            ColumnType::Int16 => {
                self.push(i16::from_value(value).ok_or_else(|| mismatch(ColumnType::Int16))?)
            }
            ColumnType::Int32 => {
                self.push(i32::from_value(value).ok_or_else(|| mismatch(ColumnType::Int32))?)
            }
            ColumnType::Int64 => {
                self.push(i64::from_value(value).ok_or_else(|| mismatch(ColumnType::Int64))?)
            }
            ColumnType::Int128 => {
                self.push(i128::from_value(value).ok_or_else(|| mismatch(ColumnType::Int128))?)
            }
            ColumnType::Oid => {
                self.push(u64::from_value(value).ok_or_else(|| mismatch(ColumnType::Oid))?)
            }
            ColumnType::Float32 => {
                self.push(f32::from_value(value).ok_or_else(|| mismatch(ColumnType::Float32))?)
            }
            ColumnType::Float64 => {
                self.push(f64::from_value(value).ok_or_else(|| mismatch(ColumnType::Float64))?)
            }
            ColumnType::String => {
                let s = match value {
                    Value::String(s) => Some(s.clone()),
                    Value::Null => None,
                    _ => return Err(mismatch(ColumnType::String)),
                };
                self.data.reserve(1)?;
                if let ColumnData::String(values) = &mut self.data {
                    values.push(s);
                }
                Ok(())
            }
        }
    }

    /// Append every value of `other` (which must have the same type).
    pub fn append_column(&mut self, other: &Column) -> StorageResult<()> {
        if other.column_type() != self.column_type() {
            return Err(StorageError::TypeMismatch {
                expected: self.column_type(),
                actual: other.column_type().to_string(),
            });
        }
        self.data.reserve(other.len())?;
        match (&mut self.data, other.data()) {
            (ColumnData::Int8(a), ColumnData::Int8(b)) => a.extend_from_slice(b),
            (ColumnData::Int16(a), ColumnData::Int16(b)) => a.extend_from_slice(b),
            (ColumnData::Int32(a), ColumnData::Int32(b)) => a.extend_from_slice(b),
            (ColumnData::Int64(a), ColumnData::Int64(b)) => a.extend_from_slice(b),
            (ColumnData::Int128(a), ColumnData::Int128(b)) => a.extend_from_slice(b),
            (ColumnData::Oid(a), ColumnData::Oid(b)) => a.extend_from_slice(b),
            (ColumnData::Float32(a), ColumnData::Float32(b)) => a.extend_from_slice(b),
            (ColumnData::Float64(a), ColumnData::Float64(b)) => a.extend_from_slice(b),
            (ColumnData::String(a), ColumnData::String(b)) => a.extend_from_slice(b),
            _ => unreachable!("column types checked above"),
        }
        Ok(())
    }

    pub fn finish(self) -> Column {
        Column::from_data(self.data)
    }
}
