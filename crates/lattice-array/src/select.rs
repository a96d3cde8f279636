//! Range, point, anti and theta selection evaluated directly on encoded dimensions.
//!
//! A selection is first resolved to a range of dimension-local indices; the qualifying positions
//! are then produced by repeating every index `element_repeats` times and the whole block once per
//! group, so the cost is proportional to the output rather than to the logical column.

use std::fmt;
use std::str::FromStr;

use lattice_columnar::{try_allocate, Column, ColumnType, NativeType, Value};

use crate::dimension::{Dimension, EncodedDimension};
use crate::error::{storage, ArrayError, ArrayResult};
use crate::numeric::{with_native_type, DimValue};

/// One side of a selection predicate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Bound<T> {
    Unbounded,
    Value(T),
    /// A nil sentinel given as a concrete bound; nothing compares to it.
    Incomparable,
}

/// Dimension-local indices matched by a predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Selection {
    Incomparable,
    Empty,
    Point(u64),
    /// `start..end`, never empty.
    Range { start: u64, end: u64 },
}

impl Selection {
    fn range(start: u64, end: u64) -> Self {
        if start < end {
            Selection::Range { start, end }
        } else {
            Selection::Empty
        }
    }

    /// Matched index ranges, or their complement within `0..elements_num` when `anti`.
    ///
    /// `Point` with `anti` has no range form here; callers scan for it.
    pub(crate) fn index_ranges(self, elements_num: u64, anti: bool) -> Vec<(u64, u64)> {
        let ranges = match (self, anti) {
            (Selection::Incomparable, _) => vec![],
            (Selection::Empty, false) => vec![],
            (Selection::Empty, true) => vec![(0, elements_num)],
            (Selection::Point(index), false) => vec![(index, index + 1)],
            (Selection::Point(index), true) => vec![(0, index), (index + 1, elements_num)],
            (Selection::Range { start, end }, false) => vec![(start, end)],
            (Selection::Range { start, end }, true) => vec![(0, start), (end, elements_num)],
        };
        ranges.into_iter().filter(|(start, end)| start < end).collect()
    }
}

pub(crate) fn bound<T: DimValue>(operation: &'static str, value: &Value) -> ArrayResult<Bound<T>> {
    if value.is_null() {
        return Ok(Bound::Unbounded);
    }
    let typed = T::from_value(value).ok_or_else(|| {
        ArrayError::value_type(operation, value.column_type().unwrap_or(T::COLUMN_TYPE))
    })?;
    Ok(if typed.is_nil() {
        Bound::Incomparable
    } else {
        Bound::Value(typed)
    })
}

/// Resolve a predicate against `dimension`.
pub(crate) fn resolve<T: DimValue>(
    dimension: &Dimension<T>,
    low: Bound<T>,
    high: Bound<T>,
    include_low: bool,
    include_high: bool,
) -> Selection {
    let n = dimension.elements_num();
    let end_before = |high: T| {
        dimension
            .find_position_at_or_before(high, include_high)
            .map_or(0, |last| last + 1)
    };
    match (low, high) {
        (Bound::Incomparable, _) | (_, Bound::Incomparable) => Selection::Incomparable,
        (Bound::Unbounded, Bound::Unbounded) => Selection::Incomparable,
        (Bound::Value(low), Bound::Value(high)) if low == high => {
            match dimension.find_position(low) {
                Some(index) => Selection::Point(index),
                None => Selection::Empty,
            }
        }
        (Bound::Value(low), Bound::Unbounded) => {
            Selection::range(dimension.find_position_at_or_after(low, include_low), n)
        }
        (Bound::Unbounded, Bound::Value(high)) => Selection::range(0, end_before(high)),
        (Bound::Value(low), Bound::Value(high)) => Selection::range(
            dimension.find_position_at_or_after(low, include_low),
            end_before(high),
        ),
    }
}

/// Validate a candidate list: an ascending oid column without nils.
pub(crate) fn candidate_positions<'a>(
    operation: &'static str,
    candidates: Option<&'a Column>,
) -> ArrayResult<Option<&'a [u64]>> {
    let Some(column) = candidates else {
        return Ok(None);
    };
    let positions = column.values::<u64>().ok_or_else(|| {
        ArrayError::general(
            operation,
            format!("candidates must be oid positions, got {}", column.column_type()),
        )
    })?;
    if column.stats().null_count > 0 {
        return Err(ArrayError::general(operation, "candidates contain nil"));
    }
    if !column.is_sorted() {
        return Err(ArrayError::general(operation, "candidates are not sorted"));
    }
    Ok(Some(positions))
}

/// Keep the entries of ascending `positions` that also appear in ascending `candidates`.
pub(crate) fn intersect_sorted(positions: &[u64], candidates: &[u64]) -> Vec<u64> {
    let mut out = Vec::with_capacity(positions.len().min(candidates.len()));
    let (mut i, mut j) = (0, 0);
    while i < positions.len() && j < candidates.len() {
        match positions[i].cmp(&candidates[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(positions[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

/// Positions of every index in `ranges`, in ascending order, restricted to `candidates`.
pub(crate) fn emit_ranges<T: DimValue>(
    operation: &'static str,
    dimension: &EncodedDimension<T>,
    ranges: &[(u64, u64)],
    candidates: Option<&[u64]>,
) -> ArrayResult<Vec<u64>> {
    let er = dimension.element_repeats();
    let group_len = dimension.group_len();

    let indices: u64 = ranges.iter().map(|(start, end)| end - start).sum();
    let count = indices * er * dimension.group_repeats();
    let capacity = match candidates {
        Some(candidates) => (candidates.len() as u64).min(count),
        None => count,
    };
    let capacity = usize::try_from(capacity)
        .map_err(|_| ArrayError::general(operation, "selection result is too large"))?;
    let mut out: Vec<u64> = try_allocate(capacity).map_err(storage(operation))?;

    let mut cursor = 0usize;
    for group in 0..dimension.group_repeats() {
        let base = group * group_len;
        for &(start, end) in ranges {
            let (from, to) = (base + start * er, base + end * er);
            match candidates {
                None => out.extend(from..to),
                Some(candidates) => {
                    while cursor < candidates.len() && candidates[cursor] < from {
                        cursor += 1;
                    }
                    while cursor < candidates.len() && candidates[cursor] < to {
                        out.push(candidates[cursor]);
                        cursor += 1;
                    }
                }
            }
        }
    }
    Ok(out)
}

/// Every position except those holding element `index`, found by scanning the whole logical
/// column.
fn emit_point_anti<T: DimValue>(
    operation: &'static str,
    dimension: &EncodedDimension<T>,
    index: u64,
    candidates: Option<&[u64]>,
) -> ArrayResult<Vec<u64>> {
    let excluded = emit_ranges(operation, dimension, &[(index, index + 1)], None)?;
    let total = dimension.logical_len();
    let capacity = usize::try_from(total - excluded.len() as u64)
        .map_err(|_| ArrayError::general(operation, "selection result is too large"))?;
    let mut out: Vec<u64> = try_allocate(capacity).map_err(storage(operation))?;

    let mut skip = excluded.iter().copied().peekable();
    for position in 0..total {
        if skip.peek() == Some(&position) {
            skip.next();
            continue;
        }
        out.push(position);
    }
    log::trace!("{operation}: point-anti scanned {total} positions");

    Ok(match candidates {
        Some(candidates) => intersect_sorted(&out, candidates),
        None => out,
    })
}

pub(crate) fn select_positions<T: DimValue>(
    operation: &'static str,
    dimension: &EncodedDimension<T>,
    selection: Selection,
    anti: bool,
    candidates: Option<&[u64]>,
) -> ArrayResult<Vec<u64>> {
    log::debug!(
        "{operation}: {} elements x{} x{}, {selection:?}, anti={anti}",
        dimension.elements_num(),
        dimension.element_repeats(),
        dimension.group_repeats()
    );
    match (selection, anti) {
        (Selection::Point(index), true) => {
            emit_point_anti(operation, dimension, index, candidates)
        }
        _ => {
            let ranges = selection.index_ranges(dimension.elements_num(), anti);
            emit_ranges(operation, dimension, &ranges, candidates)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn subselect_typed<T: DimValue>(
    operation: &'static str,
    dimension: &Column,
    candidates: Option<&[u64]>,
    low: &Value,
    high: &Value,
    include_low: bool,
    include_high: bool,
    anti: bool,
) -> ArrayResult<Vec<u64>> {
    let encoded = EncodedDimension::<T>::decode_for(operation, dimension)?;
    let low = bound::<T>(operation, low)?;
    let high = bound::<T>(operation, high)?;
    let selection = resolve(encoded.dimension(), low, high, include_low, include_high);
    select_positions(operation, &encoded, selection, anti, candidates)
}

/// Positions of `dimension` whose value lies between `low` and `high`.
///
/// `Value::Null` leaves a side unbounded; `low == high` selects a single element. With `anti`
/// the complement is returned. `candidates`, when given, must be an ascending oid column and
/// restricts the result to those positions.
pub fn subselect(
    dimension: &Column,
    candidates: Option<&Column>,
    low: &Value,
    high: &Value,
    include_low: bool,
    include_high: bool,
    anti: bool,
) -> ArrayResult<Column> {
    subselect_for(
        "subselect",
        dimension,
        candidates,
        low,
        high,
        include_low,
        include_high,
        anti,
    )
}

#[allow(clippy::too_many_arguments)]
fn subselect_for(
    operation: &'static str,
    dimension: &Column,
    candidates: Option<&Column>,
    low: &Value,
    high: &Value,
    include_low: bool,
    include_high: bool,
    anti: bool,
) -> ArrayResult<Column> {
    let candidates = candidate_positions(operation, candidates)?;
    let positions = with_native_type!(
        dimension.column_type(),
        |T| subselect_typed::<T>(
            operation,
            dimension,
            candidates,
            low,
            high,
            include_low,
            include_high,
            anti
        ),
        |other| Err(ArrayError::dimension_type(operation, other))
    )?;
    Ok(Column::from_vec(positions))
}

fn value_bounds<T: DimValue>(
    operation: &'static str,
    dimension: &Column,
    positions: &[u64],
) -> ArrayResult<Option<(Value, Value)>> {
    let encoded = EncodedDimension::<T>::decode_for(operation, dimension)?;
    let logical = encoded.logical_len();

    let mut bounds: Option<(T, T)> = None;
    for &position in positions {
        if position >= logical {
            return Err(ArrayError::general(
                operation,
                format!("position {position} outside a dimension of {logical} positions"),
            ));
        }
        let value = encoded.element_at(position);
        bounds = Some(match bounds {
            None => (value, value),
            Some((min, max)) => (
                if value < min { value } else { min },
                if value > max { value } else { max },
            ),
        });
    }
    Ok(bounds.map(|(min, max)| (min.to_value(), max.to_value())))
}

/// Select every position of `dimension` whose value lies within the minimum bounding range of
/// the values at `positions`.
pub fn mbr_subselect(
    dimension: &Column,
    positions: &Column,
    candidates: Option<&Column>,
) -> ArrayResult<Column> {
    const OPERATION: &str = "mbr_subselect";
    let positions = positions.values::<u64>().ok_or_else(|| {
        ArrayError::general(
            OPERATION,
            format!("positions must be oids, got {}", positions.column_type()),
        )
    })?;
    let bounds = with_native_type!(
        dimension.column_type(),
        |T| value_bounds::<T>(OPERATION, dimension, positions),
        |other| Err(ArrayError::dimension_type(OPERATION, other))
    )?;

    let Some((min, max)) = bounds else {
        return Ok(Column::empty(ColumnType::Oid));
    };
    log::debug!("{OPERATION}: bounding range [{min}, {max}]");
    subselect_for(OPERATION, dimension, candidates, &min, &max, true, true, false)
}

/// Comparison operators accepted by [`theta_subselect`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ThetaOperator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl ThetaOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            ThetaOperator::Eq => "==",
            ThetaOperator::Ne => "!=",
            ThetaOperator::Lt => "<",
            ThetaOperator::Le => "<=",
            ThetaOperator::Gt => ">",
            ThetaOperator::Ge => ">=",
        }
    }

    /// `(low, high, include_low, include_high, anti)` for comparing against `value`.
    pub(crate) fn predicate(self, value: &Value) -> (Value, Value, bool, bool, bool) {
        let v = value.clone();
        match self {
            ThetaOperator::Eq => (v.clone(), v, true, true, false),
            ThetaOperator::Ne => (v.clone(), v, true, true, true),
            ThetaOperator::Lt => (Value::Null, v, false, false, false),
            ThetaOperator::Le => (Value::Null, v, false, true, false),
            ThetaOperator::Gt => (v, Value::Null, false, false, false),
            ThetaOperator::Ge => (v, Value::Null, true, false, false),
        }
    }
}

impl FromStr for ThetaOperator {
    type Err = ArrayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" | "==" => Ok(ThetaOperator::Eq),
            "!=" | "<>" => Ok(ThetaOperator::Ne),
            "<" => Ok(ThetaOperator::Lt),
            "<=" => Ok(ThetaOperator::Le),
            ">" => Ok(ThetaOperator::Gt),
            ">=" => Ok(ThetaOperator::Ge),
            other => Err(ArrayError::unknown_operator("theta_subselect", other)),
        }
    }
}

impl fmt::Display for ThetaOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `dimension <operator> value`. A nil `value` matches nothing.
pub fn theta_subselect(
    dimension: &Column,
    candidates: Option<&Column>,
    value: &Value,
    operator: &str,
) -> ArrayResult<Column> {
    const OPERATION: &str = "theta_subselect";
    let operator: ThetaOperator = operator.parse()?;
    if value.is_null() {
        return Ok(Column::empty(ColumnType::Oid));
    }
    let (low, high, include_low, include_high, anti) = operator.predicate(value);
    subselect_for(
        OPERATION,
        dimension,
        candidates,
        &low,
        &high,
        include_low,
        include_high,
        anti,
    )
}
