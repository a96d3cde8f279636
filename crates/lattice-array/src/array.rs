//! Array descriptors: an ordered set of index dimensions, `dims[0]` varying fastest.

use std::sync::Arc;

use lattice_columnar::{try_allocate, Column, ColumnType, NativeType, StorageError, Value};

use crate::dimension::AnalyticDimension;
use crate::error::{storage, ArrayError, ArrayResult};
use crate::numeric::with_native_type;

/// The indices one dimension of an array contributes.
///
/// `Range` is an inclusive index range; `Indices` is an explicit ascending candidate list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexDimension {
    Range { min: u64, max: u64, step: u64 },
    Indices(Vec<u64>),
}

impl IndexDimension {
    /// Every index of a dimension holding `elements_num` elements.
    pub fn full(elements_num: u64) -> Self {
        IndexDimension::Range {
            min: 0,
            max: elements_num.saturating_sub(1),
            step: 1,
        }
    }

    pub fn elements_num(&self) -> u64 {
        match self {
            IndexDimension::Range { min, max, step } => {
                if max < min {
                    0
                } else {
                    (max - min) / (*step).max(1) + 1
                }
            }
            IndexDimension::Indices(indices) => indices.len() as u64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements_num() == 0
    }

    /// The indices in ascending order.
    pub fn indices(&self) -> Box<dyn Iterator<Item = u64> + '_> {
        match self {
            IndexDimension::Range { min, max, step } => {
                if max < min {
                    Box::new(std::iter::empty())
                } else {
                    Box::new((*min..=*max).step_by((*step).max(1) as usize))
                }
            }
            IndexDimension::Indices(indices) => Box::new(indices.iter().copied()),
        }
    }

    /// `index`-th entry of this dimension (not bounds checked for ranges).
    pub fn nth(&self, index: u64) -> Option<u64> {
        match self {
            IndexDimension::Range { min, step, .. } => {
                (index < self.elements_num()).then(|| min + index * (*step).max(1))
            }
            IndexDimension::Indices(indices) => {
                usize::try_from(index).ok().and_then(|i| indices.get(i)).copied()
            }
        }
    }

    /// Largest index this dimension references.
    pub fn last(&self) -> Option<u64> {
        self.elements_num()
            .checked_sub(1)
            .and_then(|last| self.nth(last))
    }
}

/// An N-dimensional array described by its index dimensions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Array {
    dims: Vec<IndexDimension>,
}

impl Array {
    /// Empty descriptor with room for `dims_count` dimensions.
    pub fn new(dims_count: usize) -> Self {
        Self {
            dims: Vec::with_capacity(dims_count),
        }
    }

    /// Full-range array over the given dimensions, in order.
    pub fn from_dimensions(dimensions: &[AnalyticDimension]) -> Self {
        let mut array = Self::new(dimensions.len());
        for dimension in dimensions {
            array.push(IndexDimension::full(dimension.elements_num()));
        }
        array
    }

    pub fn push(&mut self, dimension: IndexDimension) {
        self.dims.push(dimension);
    }

    pub fn dims(&self) -> &[IndexDimension] {
        &self.dims
    }

    pub fn dims_count(&self) -> usize {
        self.dims.len()
    }

    pub fn dim(&self, index: usize) -> Option<&IndexDimension> {
        self.dims.get(index)
    }

    pub(crate) fn dim_mut(&mut self, index: usize) -> Option<&mut IndexDimension> {
        self.dims.get_mut(index)
    }

    /// Deep copy in which every dimension covers all of its indices (`0..elements_num`, step 1).
    pub fn copy(&self) -> Self {
        Self {
            dims: self
                .dims
                .iter()
                .map(|dim| IndexDimension::full(dim.elements_num()))
                .collect(),
        }
    }

    /// Number of cells, the product of every dimension's element count (saturating).
    pub fn cells_num(&self) -> u64 {
        self.dims
            .iter()
            .fold(1u64, |acc, dim| acc.saturating_mul(dim.elements_num()))
    }

    /// Distance in positions between consecutive indices of dimension `dim`.
    pub fn jump_size(&self, dim: usize) -> u64 {
        self.dims[..dim.min(self.dims.len())]
            .iter()
            .fold(1u64, |acc, d| acc.saturating_mul(d.elements_num()))
    }
}

/// Allocate a measure column of `cells` entries, all set to `default` (or nil when absent).
///
/// Numeric defaults are parsed from text; string defaults are taken verbatim.
pub fn materialize_measure_column(
    column_type: ColumnType,
    cells: u64,
    default: Option<&str>,
) -> ArrayResult<Column> {
    const OPERATION: &str = "materialize_measure_column";
    let len = usize::try_from(cells).map_err(|_| {
        ArrayError::allocation(
            OPERATION,
            StorageError::Allocation {
                requested: usize::MAX,
            },
        )
    })?;
    log::debug!("{OPERATION}: {len} cells of {column_type}, default {default:?}");

    with_native_type!(
        column_type,
        |T| {
            let value = match default {
                Some(text) => T::parse_default(text).ok_or_else(|| {
                    ArrayError::general(
                        OPERATION,
                        format!("invalid default {text:?} for {column_type} column"),
                    )
                })?,
                None => T::NIL,
            };
            let mut values: Vec<T> = try_allocate(len).map_err(storage(OPERATION))?;
            values.resize(len, value);
            Ok(Column::from_vec(values))
        },
        |_other| {
            let value: Option<Arc<str>> = default.map(Arc::from);
            let mut values = try_allocate(len).map_err(storage(OPERATION))?;
            values.resize(len, value);
            Ok(Column::from_strings(values))
        }
    )
}

/// Default used when extending a measure column: the parsed text default or nil.
pub(crate) fn default_value(column_type: ColumnType, default: Option<&str>) -> Option<Value> {
    let Some(text) = default else {
        return Some(Value::Null);
    };
    with_native_type!(
        column_type,
        |T| T::parse_default(text).map(NativeType::to_value),
        |_other| Some(Value::from(text))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn two_by_three() -> Array {
        let mut array = Array::new(2);
        array.push(IndexDimension::full(3));
        array.push(IndexDimension::full(2));
        array
    }

    #[test]
    fn cells_and_jumps() {
        let array = two_by_three();
        assert_eq!(array.cells_num(), 6);
        assert_eq!(array.jump_size(0), 1);
        assert_eq!(array.jump_size(1), 3);
        assert_eq!(array.jump_size(2), 6);
        assert_eq!(Array::new(0).cells_num(), 1);
    }

    #[test]
    fn copy_normalizes_to_full_ranges() {
        let mut array = Array::new(2);
        array.push(IndexDimension::Range {
            min: 2,
            max: 8,
            step: 3,
        });
        array.push(IndexDimension::Indices(vec![1, 4]));
        let copy = array.copy();
        assert_eq!(copy.dims(), &[IndexDimension::full(3), IndexDimension::full(2)]);
    }

    #[test]
    fn index_dimension_iteration() {
        let range = IndexDimension::Range {
            min: 1,
            max: 7,
            step: 3,
        };
        assert_eq!(range.indices().collect::<Vec<_>>(), vec![1, 4, 7]);
        assert_eq!(range.nth(2), Some(7));
        assert_eq!(range.nth(3), None);
        assert_eq!(range.last(), Some(7));
        assert_eq!(IndexDimension::Indices(vec![]).last(), None);
        assert!(IndexDimension::Indices(vec![]).is_empty());
    }

    #[test]
    fn measure_column_defaults() {
        let column = materialize_measure_column(ColumnType::Int32, 3, Some(" 7")).unwrap();
        assert_eq!(column.values::<i32>().unwrap(), &[7, 7, 7]);

        let column = materialize_measure_column(ColumnType::Float64, 2, None).unwrap();
        assert_eq!(column.stats().null_count, 2);

        let column = materialize_measure_column(ColumnType::String, 2, Some("n/a")).unwrap();
        assert_eq!(column.get(1), Value::from("n/a"));
    }

    #[test]
    fn measure_column_rejects_bad_defaults() {
        let err = materialize_measure_column(ColumnType::Int8, 1, Some("x")).unwrap_err();
        assert!(matches!(err, ArrayError::General { .. }));
    }

    #[test]
    fn measure_column_allocation_failure() {
        let err = materialize_measure_column(ColumnType::Int64, u64::MAX / 4, None).unwrap_err();
        assert!(matches!(err, ArrayError::Allocation { .. }));
    }
}
