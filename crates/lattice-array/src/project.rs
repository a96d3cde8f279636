//! Re-encoding an arbitrary position list of a dimension as a new dimension.

use lattice_columnar::{try_allocate, Column};

use crate::dimension::{Dimension, EncodedDimension};
use crate::error::{storage, ArrayError, ArrayResult, Irregularity};
use crate::numeric::{with_native_type, DimValue};

const OPERATION: &str = "project";

/// Values of `dimension` at `positions`, re-encoded as a compact dimension.
///
/// Fails with [`ArrayError::IrregularityDetected`] when the values do not form a regular
/// progression. An empty position list yields an empty column of the dimension's type.
pub fn project(positions: &Column, dimension: &Column) -> ArrayResult<Column> {
    let positions = positions.values::<u64>().ok_or_else(|| {
        ArrayError::general(
            OPERATION,
            format!("positions must be oids, got {}", positions.column_type()),
        )
    })?;
    with_native_type!(
        dimension.column_type(),
        |T| project_typed::<T>(positions, dimension),
        |other| Err(ArrayError::dimension_type(OPERATION, other))
    )
}

fn project_typed<T: DimValue>(positions: &[u64], column: &Column) -> ArrayResult<Column> {
    let source = EncodedDimension::<T>::decode_for(OPERATION, column)?;
    if positions.is_empty() {
        return Ok(Column::empty(column.column_type()));
    }

    let logical = source.logical_len();
    let mut values: Vec<T> = try_allocate(positions.len()).map_err(storage(OPERATION))?;
    for &position in positions {
        if position >= logical {
            return Err(ArrayError::general(
                OPERATION,
                format!("position {position} outside a dimension of {logical} positions"),
            ));
        }
        values.push(source.element_at(position));
    }

    let (min, max) = (values[0], values[values.len() - 1]);
    let encoded = if min == max {
        singleton(positions, &values, &source)?
    } else {
        regular(&values, min, max)?
    };
    log::debug!(
        "{OPERATION}: {} positions re-encoded as [{}, {}] step {} x{} x{}",
        positions.len(),
        encoded.dimension().min(),
        encoded.dimension().max(),
        encoded.dimension().step(),
        encoded.element_repeats(),
        encoded.group_repeats()
    );
    encoded.encode()
}

/// All values equal: groups are the runs of consecutive positions.
///
/// Runs that are whole element runs of `source` are split back into those element runs, so a
/// single-element source keeps its repeat counts.
fn singleton<T: DimValue>(
    positions: &[u64],
    values: &[T],
    source: &EncodedDimension<T>,
) -> ArrayResult<EncodedDimension<T>> {
    let value = values[0];
    if values.iter().any(|v| *v != value) {
        return Err(ArrayError::irregular(OPERATION, Irregularity::OpenGroup));
    }

    let source_er = source.element_repeats();
    let mut aligned = true;
    let mut group_size: Option<usize> = None;
    let mut groups = 0u64;
    let mut start = 0usize;
    for end in 1..=positions.len() {
        let boundary = end == positions.len() || positions[end] != positions[end - 1] + 1;
        if !boundary {
            continue;
        }
        let size = end - start;
        aligned &= positions[start] % source_er == 0 && size as u64 % source_er == 0;
        match group_size {
            Some(expected) if expected != size => {
                return Err(ArrayError::irregular(
                    OPERATION,
                    Irregularity::UnequalGroups {
                        expected,
                        actual: size,
                    },
                ));
            }
            _ => group_size = Some(size),
        }
        groups += 1;
        start = end;
    }

    let dimension = Dimension::new_for(OPERATION, value, value, source.dimension().step())?;
    let (element_repeats, group_repeats) = if aligned {
        (source_er, positions.len() as u64 / source_er)
    } else {
        (group_size.unwrap_or(1) as u64, groups)
    };
    EncodedDimension::new(dimension, element_repeats, group_repeats)
}

/// Distinct `min` and `max`: split into `min..=max` groups and check that every group has the
/// same runs and steps.
fn regular<T: DimValue>(values: &[T], min: T, max: T) -> ArrayResult<EncodedDimension<T>> {
    let irregular = |reason| ArrayError::irregular(OPERATION, reason);

    // Pass one: group boundaries and min/max balance.
    let mut min_count = 0usize;
    let mut max_count = 0usize;
    let mut found_max = false;
    let mut starts = vec![0usize];
    for (i, &value) in values.iter().enumerate() {
        if value == min {
            min_count += 1;
            if found_max {
                found_max = false;
                starts.push(i);
            }
        } else if value == max {
            max_count += 1;
            found_max = true;
        }
    }
    if min_count != max_count {
        return Err(irregular(Irregularity::UnbalancedBounds {
            min_count,
            max_count,
        }));
    }
    starts.push(values.len());

    let groups: Vec<&[T]> = starts.windows(2).map(|w| &values[w[0]..w[1]]).collect();
    let group_size = groups[0].len();
    if let Some(other) = groups.iter().find(|g| g.len() != group_size) {
        return Err(irregular(Irregularity::UnequalGroups {
            expected: group_size,
            actual: other.len(),
        }));
    }

    // Pass two: runs within each group.
    let mut element_repeats: Option<usize> = None;
    let mut step: Option<T> = None;
    for group in &groups {
        if group[0] != min || group[group.len() - 1] != max {
            return Err(irregular(Irregularity::OpenGroup));
        }
        let mut run_start = 0usize;
        for i in 1..=group.len() {
            if i < group.len() && group[i] == group[run_start] {
                continue;
            }
            let run = i - run_start;
            match element_repeats {
                Some(expected) if expected != run => {
                    return Err(irregular(Irregularity::UnequalRepeats {
                        expected,
                        actual: run,
                    }));
                }
                _ => element_repeats = Some(run),
            }
            if i < group.len() {
                let delta = group[i]
                    .checked_sub(group[run_start])
                    .filter(|delta| *delta > T::zero())
                    .ok_or_else(|| irregular(Irregularity::UnequalSteps))?;
                match step {
                    Some(expected) if expected != delta => {
                        return Err(irregular(Irregularity::UnequalSteps));
                    }
                    _ => step = Some(delta),
                }
            }
            run_start = i;
        }
    }

    let step = step.ok_or_else(|| irregular(Irregularity::UnequalSteps))?;
    let dimension = Dimension::new_for(OPERATION, min, max, step)?;
    let element_repeats = element_repeats.unwrap_or(1) as u64;
    EncodedDimension::new(dimension, element_repeats, groups.len() as u64)
}
