#![forbid(unsafe_code)]

//! Arrow interoperability for [`Column`].
//!
//! Nil sentinels map to Arrow nulls in both directions. `Int128` columns travel as
//! `Decimal128` with Arrow's default precision/scale; only the raw integer is preserved.

use crate::column::{Column, ColumnData, StorageError, StorageResult};
use crate::native::NativeType;
use arrow_array::{
    Array, ArrayRef, Decimal128Array, Float32Array, Float64Array, Int16Array, Int32Array,
    Int64Array, Int8Array, StringArray, UInt64Array,
};
use arrow_schema::DataType;
use std::sync::Arc;

fn with_nulls<T: NativeType>(values: &[T]) -> Vec<Option<T>> {
    values
        .iter()
        .map(|&v| if v.is_nil() { None } else { Some(v) })
        .collect()
}

fn from_nullable<T: NativeType>(values: impl Iterator<Item = Option<T>>) -> Vec<T> {
    values.map(|v| v.unwrap_or(T::NIL)).collect()
}

impl Column {
    pub fn to_arrow(&self) -> ArrayRef {
        match self.data() {
            ColumnData::Int8(v) => Arc::new(Int8Array::from(with_nulls(v))),
            ColumnData::Int16(v) => Arc::new(Int16Array::from(with_nulls(v))),
            ColumnData::Int32(v) => Arc::new(Int32Array::from(with_nulls(v))),
            ColumnData::Int64(v) => Arc::new(Int64Array::from(with_nulls(v))),
            ColumnData::Int128(v) => Arc::new(Decimal128Array::from(with_nulls(v))),
            ColumnData::Oid(v) => Arc::new(UInt64Array::from(with_nulls(v))),
            ColumnData::Float32(v) => Arc::new(Float32Array::from(with_nulls(v))),
            ColumnData::Float64(v) => Arc::new(Float64Array::from(with_nulls(v))),
            ColumnData::String(v) => Arc::new(StringArray::from(
                v.iter().map(|s| s.as_deref()).collect::<Vec<Option<&str>>>(),
            )),
        }
    }

    pub fn from_arrow(array: &dyn Array) -> StorageResult<Self> {
        fn downcast<'a, A: 'static>(array: &'a dyn Array) -> StorageResult<&'a A> {
            array
                .as_any()
                .downcast_ref::<A>()
                .ok_or_else(|| StorageError::UnsupportedArrowType(array.data_type().to_string()))
        }

        let column = match array.data_type() {
            DataType::Int8 => Column::from_vec(from_nullable(downcast::<Int8Array>(array)?.iter())),
            DataType::Int16 => {
                Column::from_vec(from_nullable(downcast::<Int16Array>(array)?.iter()))
            }
            DataType::Int32 => {
                Column::from_vec(from_nullable(downcast::<Int32Array>(array)?.iter()))
            }
            DataType::Int64 => {
                Column::from_vec(from_nullable(downcast::<Int64Array>(array)?.iter()))
            }
            DataType::Decimal128(_, _) => {
                Column::from_vec(from_nullable(downcast::<Decimal128Array>(array)?.iter()))
            }
            DataType::UInt64 => {
                Column::from_vec(from_nullable(downcast::<UInt64Array>(array)?.iter()))
            }
            DataType::Float32 => {
                Column::from_vec(from_nullable(downcast::<Float32Array>(array)?.iter()))
            }
            DataType::Float64 => {
                Column::from_vec(from_nullable(downcast::<Float64Array>(array)?.iter()))
            }
            DataType::Utf8 => Column::from_strings(
                downcast::<StringArray>(array)?
                    .iter()
                    .map(|s| s.map(Arc::<str>::from))
                    .collect(),
            ),
            other => return Err(StorageError::UnsupportedArrowType(other.to_string())),
        };
        Ok(column)
    }
}
