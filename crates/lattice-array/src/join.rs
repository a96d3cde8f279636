use lattice_columnar::{try_allocate, Column};

use crate::dimension::EncodedDimension;
use crate::error::{storage, ArrayError, ArrayResult};
use crate::numeric::{with_native_type, DimValue};

const OPERATION: &str = "subjoin";

/// Matching position pairs of an equi-join: `left[i]` joins `right[i]`.
#[derive(Clone, Debug, PartialEq)]
pub struct JoinResult {
    pub left: Column,
    pub right: Column,
}

impl JoinResult {
    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }
}

/// Equality join of two encoded dimensions without materializing either side.
///
/// Pairs are ordered by join value, then left group, right group, left element repeat and right
/// element repeat. Candidate lists are not supported.
pub fn subjoin(
    left: &Column,
    right: &Column,
    left_candidates: Option<&Column>,
    right_candidates: Option<&Column>,
) -> ArrayResult<JoinResult> {
    if left_candidates.is_some() || right_candidates.is_some() {
        return Err(ArrayError::unsupported(OPERATION, "joining with candidate lists"));
    }
    if left.column_type() != right.column_type() {
        return Err(ArrayError::value_type(OPERATION, right.column_type()));
    }
    with_native_type!(
        left.column_type(),
        |T| subjoin_typed::<T>(left, right),
        |other| Err(ArrayError::dimension_type(OPERATION, other))
    )
}

fn subjoin_typed<T: DimValue>(left: &Column, right: &Column) -> ArrayResult<JoinResult> {
    let left = EncodedDimension::<T>::decode_for(OPERATION, left)?;
    let right = EncodedDimension::<T>::decode_for(OPERATION, right)?;

    // Walk the dimension with fewer elements; ties go to the right side.
    let driver = if right.elements_num() > left.elements_num() {
        left.dimension()
    } else {
        right.dimension()
    };

    let mut matches = Vec::new();
    for index in 0..driver.elements_num() {
        let value = driver.element(index);
        if let (Some(l), Some(r)) = (
            left.dimension().find_position(value),
            right.dimension().find_position(value),
        ) {
            matches.push((l, r));
        }
    }

    let too_large = || ArrayError::general(OPERATION, "join result is too large");
    let per_match = left
        .element_repeats()
        .checked_mul(left.group_repeats())
        .and_then(|n| n.checked_mul(right.element_repeats()))
        .and_then(|n| n.checked_mul(right.group_repeats()))
        .ok_or_else(too_large)?;
    let total = (matches.len() as u64)
        .checked_mul(per_match)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(too_large)?;
    log::debug!(
        "{OPERATION}: {} matching values, {per_match} pairs each",
        matches.len()
    );

    let mut left_out: Vec<u64> = try_allocate(total).map_err(storage(OPERATION))?;
    let mut right_out: Vec<u64> = try_allocate(total).map_err(storage(OPERATION))?;

    let (left_group, right_group) = (left.group_len(), right.group_len());
    let (left_er, right_er) = (left.element_repeats(), right.element_repeats());
    for (l, r) in matches {
        for lg in 0..left.group_repeats() {
            let i = l * left_er + lg * left_group;
            for rg in 0..right.group_repeats() {
                let j = r * right_er + rg * right_group;
                for ii in 0..left_er {
                    for jj in 0..right_er {
                        left_out.push(i + ii);
                        right_out.push(j + jj);
                    }
                }
            }
        }
    }

    Ok(JoinResult {
        left: Column::from_vec(left_out),
        right: Column::from_vec(right_out),
    })
}
