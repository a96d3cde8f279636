#![forbid(unsafe_code)]

use crate::native::NativeType;
use crate::types::{ColumnType, Value};
use std::cmp::Ordering;
use std::sync::Arc;

/// Properties derived once when a column is finalized.
///
/// `sorted` / `rev_sorted` use the nil-lowest total order of [`NativeType::total_cmp`]; the
/// algebra relies on `sorted` to accept candidate lists without re-sorting them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColumnStats {
    pub column_type: ColumnType,
    pub null_count: u64,
    pub min: Option<Value>,
    pub max: Option<Value>,
    pub sorted: bool,
    pub rev_sorted: bool,
}

impl ColumnStats {
    pub(crate) fn from_native<T: NativeType>(values: &[T]) -> Self {
        let mut null_count: u64 = 0;
        let mut min: Option<T> = None;
        let mut max: Option<T> = None;
        let mut sorted = true;
        let mut rev_sorted = true;

        for (idx, &v) in values.iter().enumerate() {
            if idx > 0 {
                match values[idx - 1].total_cmp(&v) {
                    Ordering::Less => rev_sorted = false,
                    Ordering::Greater => sorted = false,
                    Ordering::Equal => {}
                }
            }
            if v.is_nil() {
                null_count += 1;
                continue;
            }
            if min.map_or(true, |m| v.total_cmp(&m) == Ordering::Less) {
                min = Some(v);
            }
            if max.map_or(true, |m| v.total_cmp(&m) == Ordering::Greater) {
                max = Some(v);
            }
        }

        Self {
            column_type: T::COLUMN_TYPE,
            null_count,
            min: min.map(NativeType::to_value),
            max: max.map(NativeType::to_value),
            sorted,
            rev_sorted,
        }
    }

    pub(crate) fn from_strings(values: &[Option<Arc<str>>]) -> Self {
        let mut null_count: u64 = 0;
        let mut min: Option<&Arc<str>> = None;
        let mut max: Option<&Arc<str>> = None;
        let mut sorted = true;
        let mut rev_sorted = true;

        for (idx, v) in values.iter().enumerate() {
            // `Option` already orders `None` first.
            if idx > 0 {
                match values[idx - 1].cmp(v) {
                    Ordering::Less => rev_sorted = false,
                    Ordering::Greater => sorted = false,
                    Ordering::Equal => {}
                }
            }
            let Some(s) = v else {
                null_count += 1;
                continue;
            };
            if min.map_or(true, |m| s < m) {
                min = Some(s);
            }
            if max.map_or(true, |m| s > m) {
                max = Some(s);
            }
        }

        Self {
            column_type: ColumnType::String,
            null_count,
            min: min.cloned().map(Value::String),
            max: max.cloned().map(Value::String),
            sorted,
            rev_sorted,
        }
    }
}
