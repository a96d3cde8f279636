//! Array-level selection: instead of producing positions, narrow the candidate indices of one
//! dimension of an [`Array`].

use lattice_columnar::Value;

use crate::array::{Array, IndexDimension};
use crate::dimension::AnalyticDimension;
use crate::error::{ArrayError, ArrayResult};
use crate::numeric::{with_native_type, DimValue};
use crate::select::{bound, resolve, ThetaOperator};

/// Restrict the candidates of `dimension` to the indices whose value lies between `low` and
/// `high` (or outside, with `anti`).
///
/// Without `candidates` every cell of `array` is a candidate. Returns `None` when no cell is
/// left.
#[allow(clippy::too_many_arguments)]
pub fn dimension_subselect(
    array: &Array,
    candidates: Option<&Array>,
    dimension: &AnalyticDimension,
    low: &Value,
    high: &Value,
    include_low: bool,
    include_high: bool,
    anti: bool,
) -> ArrayResult<Option<Array>> {
    narrow(
        "dimension_subselect",
        array,
        candidates,
        dimension,
        low,
        high,
        include_low,
        include_high,
        anti,
    )
}

/// `dimension <operator> value` over array candidates. A nil `value` leaves no cell.
pub fn dimension_theta_subselect(
    array: &Array,
    candidates: Option<&Array>,
    dimension: &AnalyticDimension,
    value: &Value,
    operator: &str,
) -> ArrayResult<Option<Array>> {
    let operator: ThetaOperator = operator.parse()?;
    if value.is_null() {
        return Ok(None);
    }
    let (low, high, include_low, include_high, anti) = operator.predicate(value);
    narrow(
        "dimension_theta_subselect",
        array,
        candidates,
        dimension,
        &low,
        &high,
        include_low,
        include_high,
        anti,
    )
}

#[allow(clippy::too_many_arguments)]
fn narrow(
    operation: &'static str,
    array: &Array,
    candidates: Option<&Array>,
    dimension: &AnalyticDimension,
    low: &Value,
    high: &Value,
    include_low: bool,
    include_high: bool,
    anti: bool,
) -> ArrayResult<Option<Array>> {
    let dim_num = dimension.dim_num();
    let mut out = match candidates {
        Some(candidates) if candidates.dims_count() != array.dims_count() => {
            return Err(ArrayError::general(
                operation,
                format!(
                    "candidates have {} dimensions but the array has {}",
                    candidates.dims_count(),
                    array.dims_count()
                ),
            ));
        }
        Some(candidates) => candidates.clone(),
        None => array.copy(),
    };

    let ranges = with_native_type!(
        dimension.column_type(),
        |T| qualifying_ranges::<T>(
            operation,
            dimension,
            low,
            high,
            include_low,
            include_high,
            anti
        ),
        |other| Err(ArrayError::dimension_type(operation, other))
    )?;

    let candidate = out.dim_mut(dim_num).ok_or_else(|| {
        ArrayError::general(
            operation,
            format!("dimension {dim_num} is not part of the array"),
        )
    })?;
    *candidate = restrict(candidate, &ranges);
    log::debug!(
        "{operation}: dimension {dim_num} keeps {} indices",
        candidate.elements_num()
    );

    if candidate.is_empty() {
        return Ok(None);
    }
    Ok(Some(out))
}

fn qualifying_ranges<T: DimValue>(
    operation: &'static str,
    dimension: &AnalyticDimension,
    low: &Value,
    high: &Value,
    include_low: bool,
    include_high: bool,
    anti: bool,
) -> ArrayResult<Vec<(u64, u64)>> {
    let typed = dimension.typed_for::<T>(operation)?;
    let low = bound::<T>(operation, low)?;
    let high = bound::<T>(operation, high)?;
    let selection = resolve(&typed, low, high, include_low, include_high);
    Ok(selection.index_ranges(typed.elements_num(), anti))
}

/// Keep the candidate indices that fall in one of the ascending, disjoint `ranges`.
fn restrict(candidate: &IndexDimension, ranges: &[(u64, u64)]) -> IndexDimension {
    match (candidate, ranges) {
        (_, []) => IndexDimension::Indices(Vec::new()),
        (IndexDimension::Range { min, max, step }, [(start, end)]) => {
            let step = (*step).max(1);
            // First index of the candidate range at or after `start`, last one before `end`.
            let first = if *start <= *min {
                *min
            } else {
                min + (start - min).div_ceil(step) * step
            };
            let last_bound = (end - 1).min(*max);
            if last_bound < first {
                return IndexDimension::Indices(Vec::new());
            }
            let last = first + (last_bound - first) / step * step;
            IndexDimension::Range {
                min: first,
                max: last,
                step,
            }
        }
        _ => IndexDimension::Indices(
            candidate
                .indices()
                .filter(|index| {
                    ranges
                        .iter()
                        .any(|(start, end)| (*start..*end).contains(index))
                })
                .collect(),
        ),
    }
}
