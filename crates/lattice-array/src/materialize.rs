//! Expanding encoded dimensions and projecting values over array cells.

use std::sync::Arc;

use lattice_columnar::{try_allocate, Column, ColumnBuilder, NativeType};

use crate::array::{default_value, Array, IndexDimension};
use crate::cells::{cell_positions, check_shape};
use crate::dimension::{AnalyticDimension, EncodedDimension};
use crate::error::{storage, ArrayError, ArrayResult};
use crate::numeric::with_native_type;
use crate::select::candidate_positions;

/// The full logical column of an encoded dimension. Other columns are returned as a copy.
pub fn materialize_dimension(column: &Column) -> ArrayResult<Column> {
    const OPERATION: &str = "materialize_dimension";
    if !column.is_dimension() {
        return Ok(column.clone());
    }
    with_native_type!(
        column.column_type(),
        |T| {
            let encoded = EncodedDimension::<T>::decode_for(OPERATION, column)?;
            let len = usize::try_from(encoded.logical_len())
                .map_err(|_| ArrayError::general(OPERATION, "dimension is too large"))?;
            let mut values: Vec<T> = try_allocate(len).map_err(storage(OPERATION))?;
            values.extend((0..encoded.logical_len()).map(|p| encoded.element_at(p)));
            log::debug!("{OPERATION}: expanded {} entries to {len}", column.len());
            Ok(Column::from_vec(values))
        },
        |other| Err(ArrayError::dimension_type(OPERATION, other))
    )
}

/// Logical size of `column`: `elements * element_repeats * group_repeats` for an encoded
/// dimension, the plain length otherwise.
pub fn dimension_size(column: &Column) -> ArrayResult<u64> {
    const OPERATION: &str = "dimension_size";
    if !column.is_dimension() {
        return Ok(column.len() as u64);
    }
    with_native_type!(
        column.column_type(),
        |T| Ok(EncodedDimension::<T>::decode_for(OPERATION, column)?.logical_len()),
        |other| Err(ArrayError::dimension_type(OPERATION, other))
    )
}

/// Number of distinct elements of an encoded dimension.
pub fn dimension_elements_num(column: &Column) -> ArrayResult<u64> {
    const OPERATION: &str = "dimension_elements_num";
    with_native_type!(
        column.column_type(),
        |T| Ok(EncodedDimension::<T>::decode_for(OPERATION, column)?.elements_num()),
        |other| Err(ArrayError::dimension_type(OPERATION, other))
    )
}

/// Value of `dimension` for every candidate cell, in [`crate::project_cells`] order.
pub fn dimension_cell_values(
    candidates: &Array,
    dimension: &AnalyticDimension,
    array: &Array,
) -> ArrayResult<Column> {
    const OPERATION: &str = "dimension_cell_values";
    check_shape(OPERATION, candidates, array)?;
    let dim_num = dimension.dim_num();
    let candidate = candidates.dim(dim_num).ok_or_else(|| {
        ArrayError::general(
            OPERATION,
            format!("dimension {dim_num} is not part of the array"),
        )
    })?;

    let expected = array.dims()[dim_num].elements_num();
    if dimension.elements_num() != expected {
        return Err(ArrayError::general(
            OPERATION,
            format!(
                "{dimension} does not match the {expected} indices of array dimension {dim_num}"
            ),
        ));
    }

    if candidates.cells_num() == 0 {
        return Ok(Column::empty(dimension.column_type()));
    }

    // Cells before `dim_num` repeat each value; cells after it repeat the whole sequence.
    let too_many = || ArrayError::general(OPERATION, "too many cells");
    let count = |dims: &[IndexDimension]| {
        dims.iter()
            .try_fold(1u64, |acc, d| acc.checked_mul(d.elements_num()))
            .ok_or_else(too_many)
    };
    let dims = candidates.dims();
    let inner = count(&dims[..dim_num])?;
    let outer = count(&dims[dim_num + 1..])?;
    let len = inner
        .checked_mul(candidate.elements_num())
        .and_then(|n| n.checked_mul(outer))
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(too_many)?;
    let inner = usize::try_from(inner).map_err(|_| too_many())?;

    with_native_type!(
        dimension.column_type(),
        |T| {
            let typed = dimension.typed_for::<T>(OPERATION)?;
            let mut values: Vec<T> = try_allocate(len).map_err(storage(OPERATION))?;
            for _ in 0..outer {
                for index in candidate.indices() {
                    let value = typed.element(index);
                    values.extend(std::iter::repeat(value).take(inner));
                }
            }
            Ok(Column::from_vec(values))
        },
        |other| Err(ArrayError::dimension_type(OPERATION, other))
    )
}

/// Gather `values` at `rows`; `None` rows produce nil.
fn gather<I>(operation: &'static str, values: &Column, rows: I, len: usize) -> ArrayResult<Column>
where
    I: Iterator<Item = Option<u64>>,
{
    let out_of_range = |row: u64| {
        ArrayError::general(
            operation,
            format!("row {row} outside a column of {} values", values.len()),
        )
    };
    with_native_type!(
        values.column_type(),
        |T| {
            let source = values
                .values::<T>()
                .ok_or_else(|| ArrayError::value_type(operation, values.column_type()))?;
            let mut out: Vec<T> = try_allocate(len).map_err(storage(operation))?;
            for row in rows {
                out.push(match row {
                    None => T::NIL,
                    Some(row) => *usize::try_from(row)
                        .ok()
                        .and_then(|r| source.get(r))
                        .ok_or_else(|| out_of_range(row))?,
                });
            }
            Ok(Column::from_vec(out))
        },
        |other| {
            let source = values
                .strings()
                .ok_or_else(|| ArrayError::value_type(operation, other))?;
            let mut out: Vec<Option<Arc<str>>> = try_allocate(len).map_err(storage(operation))?;
            for row in rows {
                out.push(match row {
                    None => None,
                    Some(row) => usize::try_from(row)
                        .ok()
                        .and_then(|r| source.get(r))
                        .ok_or_else(|| out_of_range(row))?
                        .clone(),
                });
            }
            Ok(Column::from_strings(out))
        }
    )
}

/// The measure `values` (aligned with `array`) restricted to the candidate cells.
pub fn project_measure(candidates: &Array, values: &Column, array: &Array) -> ArrayResult<Column> {
    const OPERATION: &str = "project_measure";
    let positions = cell_positions(OPERATION, candidates, array)?;
    gather(
        OPERATION,
        values,
        positions.iter().map(|p| Some(*p)),
        positions.len(),
    )
}

/// Pad a measure column with `default` (nil when absent) until it covers every cell of `array`.
pub fn extend_measure_column(
    values: &Column,
    array: &Array,
    default: Option<&str>,
) -> ArrayResult<Column> {
    const OPERATION: &str = "extend_measure_column";
    let cells = array.cells_num();
    let have = values.len() as u64;
    if have > cells {
        return Err(ArrayError::general(
            OPERATION,
            format!("{have} values exceed the {cells} cells of the array"),
        ));
    }
    let missing = usize::try_from(cells - have)
        .map_err(|_| ArrayError::general(OPERATION, "too many cells"))?;
    let fill = default_value(values.column_type(), default).ok_or_else(|| {
        ArrayError::general(
            OPERATION,
            format!("invalid default {default:?} for {} column", values.column_type()),
        )
    })?;
    log::debug!("{OPERATION}: appending {missing} cells of {fill}");

    let mut builder = ColumnBuilder::with_capacity(values.column_type(), values.len() + missing)
        .map_err(storage(OPERATION))?;
    builder.append_column(values).map_err(storage(OPERATION))?;
    builder
        .push_repeated(&fill, missing)
        .map_err(storage(OPERATION))?;
    Ok(builder.finish())
}

/// For every entry of `positions`, the value of `values` there when the position is in
/// `selected`, nil otherwise.
pub fn mbr_project(values: &Column, positions: &Column, selected: &Column) -> ArrayResult<Column> {
    const OPERATION: &str = "mbr_project";
    let positions = positions.values::<u64>().ok_or_else(|| {
        ArrayError::general(
            OPERATION,
            format!("positions must be oids, got {}", positions.column_type()),
        )
    })?;
    let selected = candidate_positions(OPERATION, Some(selected))?.unwrap_or(&[]);

    let rows = positions
        .iter()
        .map(|p| selected.binary_search(p).ok().map(|_| *p));
    gather(OPERATION, values, rows, positions.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::Dimension;
    use crate::numeric::DimValue;
    use lattice_columnar::{ColumnType, Value};
    use pretty_assertions::assert_eq;

    fn encoded<T: DimValue>(min: T, max: T, step: T, er: u64, gr: u64) -> Column {
        EncodedDimension::new(Dimension::new(min, max, step).unwrap(), er, gr)
            .unwrap()
            .encode()
            .unwrap()
    }

    #[test]
    fn materialize_expands_repeats() {
        let column = encoded(1i16, 3, 1, 2, 2);
        let out = materialize_dimension(&column).unwrap();
        assert_eq!(
            out.values::<i16>().unwrap(),
            &[1, 1, 2, 2, 3, 3, 1, 1, 2, 2, 3, 3]
        );
        assert!(!out.is_dimension());
        assert_eq!(dimension_size(&column).unwrap(), 12);
        assert_eq!(dimension_elements_num(&column).unwrap(), 3);

        let plain = Column::from_vec(vec![4i16, 5]);
        assert_eq!(materialize_dimension(&plain).unwrap(), plain);
        assert_eq!(dimension_size(&plain).unwrap(), 2);
    }

    #[test]
    fn cell_values_follow_cell_order() {
        let x = AnalyticDimension::new(0, 10i32, 30, 10).unwrap();
        let y = AnalyticDimension::new(1, 0.5f64, 1.0, 0.5).unwrap();
        let array = Array::from_dimensions(&[x.clone(), y.clone()]);

        let mut candidates = Array::new(2);
        candidates.push(IndexDimension::Indices(vec![0, 2]));
        candidates.push(IndexDimension::full(2));

        let xs = dimension_cell_values(&candidates, &x, &array).unwrap();
        assert_eq!(xs.values::<i32>().unwrap(), &[10, 30, 10, 30]);
        let ys = dimension_cell_values(&candidates, &y, &array).unwrap();
        assert_eq!(ys.values::<f64>().unwrap(), &[0.5, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn cell_values_need_a_matching_dimension() {
        let x = AnalyticDimension::new(0, 0i32, 2, 1).unwrap();
        let array = Array::from_dimensions(&[x]);
        let wider = AnalyticDimension::new(0, 0i32, 5, 1).unwrap();
        let err = dimension_cell_values(&array.copy(), &wider, &array).unwrap_err();
        assert!(matches!(err, ArrayError::General { .. }));
    }

    #[test]
    fn cell_values_of_an_empty_candidate_set() {
        let x = AnalyticDimension::new(0, 0i64, 3, 1).unwrap();
        let y = AnalyticDimension::new(1, 0i64, 1, 1).unwrap();
        let z = AnalyticDimension::new(2, 0i64, 3, 1).unwrap();
        let array = Array::from_dimensions(&[x, y.clone(), z]);

        let mut candidates = Array::new(3);
        candidates.push(IndexDimension::Indices(vec![]));
        candidates.push(IndexDimension::full(2));
        candidates.push(IndexDimension::full(4));
        let out = dimension_cell_values(&candidates, &y, &array).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.column_type(), ColumnType::Int64);
    }

    #[test]
    fn measures_project_over_candidates() {
        let x = AnalyticDimension::new(0, 0i32, 2, 1).unwrap();
        let y = AnalyticDimension::new(1, 0i32, 1, 1).unwrap();
        let array = Array::from_dimensions(&[x, y]);
        let measure = Column::from_vec(vec![1.5f32, 2.5, 3.5, 4.5, 5.5, 6.5]);

        let mut candidates = array.copy();
        candidates.push(IndexDimension::full(1));
        assert!(project_measure(&candidates, &measure, &array).is_err());

        let mut candidates = Array::new(2);
        candidates.push(IndexDimension::Indices(vec![1]));
        candidates.push(IndexDimension::full(2));
        let out = project_measure(&candidates, &measure, &array).unwrap();
        assert_eq!(out.values::<f32>().unwrap(), &[2.5, 5.5]);
    }

    #[test]
    fn extend_pads_with_default_or_nil() {
        let x = AnalyticDimension::new(0, 0i64, 3, 1).unwrap();
        let array = Array::from_dimensions(&[x]);

        let values = Column::from_vec(vec![9i64]);
        let out = extend_measure_column(&values, &array, Some("0")).unwrap();
        assert_eq!(out.values::<i64>().unwrap(), &[9, 0, 0, 0]);

        let out = extend_measure_column(&values, &array, None).unwrap();
        assert_eq!(out.stats().null_count, 3);

        let names = Column::from_strings(vec![Some(Arc::from("a"))]);
        let out = extend_measure_column(&names, &array, Some("?")).unwrap();
        assert_eq!(out.get(3), Value::from("?"));

        assert!(extend_measure_column(&values, &array, Some("zero")).is_err());
        let long = Column::from_vec(vec![0i64; 5]);
        assert!(extend_measure_column(&long, &array, None).is_err());
    }

    #[test]
    fn mbr_project_masks_unselected_positions() {
        let values = Column::from_vec(vec![10i32, 11, 12, 13, 14]);
        let positions = Column::from_vec(vec![0u64, 2, 3, 4]);
        let selected = Column::from_vec(vec![2u64, 4]);
        let out = mbr_project(&values, &positions, &selected).unwrap();
        assert_eq!(out.values::<i32>().unwrap(), &[i32::MIN, 12, i32::MIN, 14]);

        let strings = Column::from_strings(vec![Some(Arc::from("a")), Some(Arc::from("b"))]);
        let out = mbr_project(&strings, &Column::from_vec(vec![0u64, 1]), &selected).unwrap();
        assert_eq!(out.get(0), Value::Null);

        let out = mbr_project(&values, &Column::empty(ColumnType::Oid), &selected).unwrap();
        assert!(out.is_empty());
    }
}
