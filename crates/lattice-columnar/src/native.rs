#![forbid(unsafe_code)]

use crate::column::ColumnData;
use crate::types::{ColumnType, Value};
use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::fmt;

/// A fixed-width element type that can back a [`crate::Column`].
///
/// Every native type reserves one bit pattern as its nil sentinel:
/// - signed integers use `MIN`
/// - `u64` (oid) uses `u64::MAX`
/// - floats use NaN
pub trait NativeType:
    Copy + PartialOrd + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    const COLUMN_TYPE: ColumnType;
    const NIL: Self;

    fn is_nil(self) -> bool;

    /// Total order used for stats. Nil sorts first, matching the kernel's nil-lowest convention.
    fn total_cmp(&self, other: &Self) -> Ordering;

    fn to_f64(self) -> f64;

    /// Nil maps to [`Value::Null`].
    fn to_value(self) -> Value;

    /// `Value::Null` maps to the nil sentinel. Returns `None` on a type mismatch.
    fn from_value(value: &Value) -> Option<Self>;

    /// Parse a textual default value (as given in a column definition).
    fn parse_default(text: &str) -> Option<Self>;

    fn slice(data: &ColumnData) -> Option<&[Self]>;

    fn vec_mut(data: &mut ColumnData) -> Option<&mut Vec<Self>>;

    fn into_data(values: Vec<Self>) -> ColumnData;
}

macro_rules! native_int {
    ($ty:ty, $variant:ident, $nil:expr) => {
        impl NativeType for $ty {
            const COLUMN_TYPE: ColumnType = ColumnType::$variant;
            const NIL: Self = $nil;

            fn is_nil(self) -> bool {
                self == $nil
            }

            fn total_cmp(&self, other: &Self) -> Ordering {
                match (self.is_nil(), other.is_nil()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    (false, false) => self.cmp(other),
                }
            }

            fn to_f64(self) -> f64 {
                self as f64
            }

            fn to_value(self) -> Value {
                if self.is_nil() {
                    Value::Null
                } else {
                    Value::$variant(self)
                }
            }

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(*v),
                    Value::Null => Some($nil),
                    _ => None,
                }
            }

            fn parse_default(text: &str) -> Option<Self> {
                text.trim().parse().ok()
            }

            fn slice(data: &ColumnData) -> Option<&[Self]> {
                match data {
                    ColumnData::$variant(values) => Some(values),
                    _ => None,
                }
            }

            fn vec_mut(data: &mut ColumnData) -> Option<&mut Vec<Self>> {
                match data {
                    ColumnData::$variant(values) => Some(values),
                    _ => None,
                }
            }

            fn into_data(values: Vec<Self>) -> ColumnData {
                ColumnData::$variant(values)
            }
        }
    };
}

macro_rules! native_float {
    ($ty:ty, $variant:ident) => {
        impl NativeType for $ty {
            const COLUMN_TYPE: ColumnType = ColumnType::$variant;
            const NIL: Self = <$ty>::NAN;

            fn is_nil(self) -> bool {
                self.is_nan()
            }

            fn total_cmp(&self, other: &Self) -> Ordering {
                // `OrderedFloat` places NaN last; nil has to sort first.
                match (self.is_nil(), other.is_nil()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    (false, false) => OrderedFloat(*self).cmp(&OrderedFloat(*other)),
                }
            }

            fn to_f64(self) -> f64 {
                self as f64
            }

            fn to_value(self) -> Value {
                if self.is_nil() {
                    Value::Null
                } else {
                    Value::$variant(self)
                }
            }

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(*v),
                    Value::Null => Some(<$ty>::NAN),
                    _ => None,
                }
            }

            fn parse_default(text: &str) -> Option<Self> {
                text.trim().parse().ok()
            }

            fn slice(data: &ColumnData) -> Option<&[Self]> {
                match data {
                    ColumnData::$variant(values) => Some(values),
                    _ => None,
                }
            }

            fn vec_mut(data: &mut ColumnData) -> Option<&mut Vec<Self>> {
                match data {
                    ColumnData::$variant(values) => Some(values),
                    _ => None,
                }
            }

            fn into_data(values: Vec<Self>) -> ColumnData {
                ColumnData::$variant(values)
            }
        }
    };
}

native_int!(i8, Int8, i8::MIN);
native_int!(i16, Int16, i16::MIN);
native_int!(i32, Int32, i32::MIN);
native_int!(i64, Int64, i64::MIN);
native_int!(i128, Int128, i128::MIN);
native_int!(u64, Oid, u64::MAX);
native_float!(f32, Float32);
native_float!(f64, Float64);
