//! Group-by and per-group average over encoded dimensions.
//!
//! Grouping by a dimension never inspects the logical column: every distinct element is a group,
//! so the group ids form a dimension of their own with the same repeat counts.

use lattice_columnar::{try_allocate, Column, ColumnType, NativeType};

use crate::dimension::{Dimension, EncodedDimension};
use crate::error::{storage, ArrayError, ArrayResult};
use crate::numeric::with_native_type;

/// Output of [`group`].
#[derive(Clone, Debug, PartialEq)]
pub struct Grouping {
    /// Encoded oid dimension assigning a group id to every position.
    pub groups: Column,
    /// Position of the first occurrence of each group.
    pub extents: Column,
    /// Always empty; dimensions do not produce histograms.
    pub histogram: Column,
}

/// Group `dimension` by value.
///
/// Refining an existing grouping is not supported, so `groups`, `extents` and `histogram` must be
/// absent.
pub fn group(
    dimension: &Column,
    groups: Option<&Column>,
    extents: Option<&Column>,
    histogram: Option<&Column>,
) -> ArrayResult<Grouping> {
    const OPERATION: &str = "group";
    if groups.is_some() || extents.is_some() || histogram.is_some() {
        return Err(ArrayError::unsupported(OPERATION, "refining an existing grouping"));
    }
    let (elements_num, element_repeats, group_repeats) = with_native_type!(
        dimension.column_type(),
        |T| {
            let encoded = EncodedDimension::<T>::decode_for(OPERATION, dimension)?;
            Ok((
                encoded.elements_num(),
                encoded.element_repeats(),
                encoded.group_repeats(),
            ))
        },
        |other| Err(ArrayError::dimension_type(OPERATION, other))
    )?;

    let ids = Dimension::new_for(OPERATION, 0u64, elements_num - 1, 1)?;
    let groups = EncodedDimension::new(ids, element_repeats, group_repeats)?.encode()?;

    let len = usize::try_from(elements_num)
        .map_err(|_| ArrayError::general(OPERATION, "too many groups"))?;
    let mut starts: Vec<u64> = try_allocate(len).map_err(storage(OPERATION))?;
    starts.extend((0..elements_num).map(|g| g * element_repeats));
    log::debug!("{OPERATION}: {elements_num} groups x{element_repeats} x{group_repeats}");

    Ok(Grouping {
        groups,
        extents: Column::from_vec(starts),
        histogram: Column::empty(ColumnType::Int64),
    })
}

/// Average of `values` per group of a [`group`] result.
///
/// Every group averages all of its occurrences across group repeats. Nil values are skipped and
/// a group holding only nils averages to nil.
pub fn group_average(
    values: &Column,
    groups: &Column,
    extents: &Column,
    candidates: Option<&Column>,
) -> ArrayResult<Column> {
    const OPERATION: &str = "group_average";
    if candidates.is_some() {
        return Err(ArrayError::unsupported(OPERATION, "averaging with a candidate list"));
    }
    let groups = EncodedDimension::<u64>::decode_for(OPERATION, groups)?;
    if extents.len() as u64 != groups.elements_num() {
        return Err(ArrayError::general(
            OPERATION,
            format!(
                "{} extents for {} groups",
                extents.len(),
                groups.elements_num()
            ),
        ));
    }
    if values.len() as u64 != groups.logical_len() {
        return Err(ArrayError::general(
            OPERATION,
            format!(
                "{} values for a grouping of {} positions",
                values.len(),
                groups.logical_len()
            ),
        ));
    }

    let averages = with_native_type!(
        values.column_type(),
        |T| match values.values::<T>() {
            Some(values) => averages(OPERATION, values, &groups),
            None => Err(ArrayError::value_type(OPERATION, values.column_type())),
        },
        |other| Err(ArrayError::value_type(OPERATION, other))
    )?;
    Ok(Column::from_vec(averages))
}

fn averages<T: NativeType>(
    operation: &'static str,
    values: &[T],
    groups: &EncodedDimension<u64>,
) -> ArrayResult<Vec<f64>> {
    let n = groups.elements_num();
    let er = groups.element_repeats() as usize;
    let group_len = groups.group_len() as usize;

    let mut out: Vec<f64> = try_allocate(n as usize).map_err(storage(operation))?;
    for g in 0..n as usize {
        let mut sum = 0.0f64;
        let mut count = 0u64;
        for k in 0..groups.group_repeats() as usize {
            let start = g * er + k * group_len;
            for value in &values[start..start + er] {
                if !value.is_nil() {
                    sum += value.to_f64();
                    count += 1;
                }
            }
        }
        out.push(if count == 0 {
            f64::NAN
        } else {
            sum / count as f64
        });
    }
    Ok(out)
}
