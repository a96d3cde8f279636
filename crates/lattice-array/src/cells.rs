use lattice_columnar::{try_allocate, Column};

use crate::array::{Array, IndexDimension};
use crate::error::{storage, ArrayError, ArrayResult};

/// Flatten a per-dimension candidate selection into positions of `original`.
///
/// Dimension 0 varies fastest, so the positions come out ascending whenever every candidate
/// dimension is ascending.
pub fn project_cells(candidates: &Array, original: &Array) -> ArrayResult<Column> {
    Ok(Column::from_vec(cell_positions(
        "project_cells",
        candidates,
        original,
    )?))
}

pub(crate) fn cell_positions(
    operation: &'static str,
    candidates: &Array,
    original: &Array,
) -> ArrayResult<Vec<u64>> {
    check_shape(operation, candidates, original)?;

    let total = usize::try_from(candidates.cells_num())
        .map_err(|_| ArrayError::general(operation, "too many cells"))?;
    let mut positions: Vec<u64> = try_allocate(total).map_err(storage(operation))?;
    if total == 0 || candidates.dims_count() == 0 {
        return Ok(positions);
    }

    positions.extend(candidates.dims()[0].indices());

    let mut stride = 1u64;
    for (i, dim) in candidates.dims().iter().enumerate().skip(1) {
        stride = stride
            .checked_mul(original.dims()[i - 1].elements_num())
            .ok_or_else(|| ArrayError::general(operation, "position space overflow"))?;

        // Replicate the accumulated block once per index, shifting the first copy last so the
        // source block stays intact while the others are appended.
        let block = positions.len();
        let mut indices = dim.indices();
        let Some(first) = indices.next() else {
            positions.clear();
            break;
        };
        for index in indices {
            let offset = index * stride;
            for j in 0..block {
                let p = positions[j];
                positions.push(p + offset);
            }
        }
        let offset = first * stride;
        for p in &mut positions[..block] {
            *p += offset;
        }
    }

    log::trace!("{operation}: {} positions", positions.len());
    Ok(positions)
}

pub(crate) fn check_shape(
    operation: &'static str,
    candidates: &Array,
    original: &Array,
) -> ArrayResult<()> {
    if candidates.dims_count() != original.dims_count() {
        return Err(ArrayError::general(
            operation,
            format!(
                "candidates have {} dimensions but the array has {}",
                candidates.dims_count(),
                original.dims_count()
            ),
        ));
    }
    for (i, (cand, dim)) in candidates.dims().iter().zip(original.dims()).enumerate() {
        let largest = match cand {
            IndexDimension::Range { .. } => cand.last(),
            IndexDimension::Indices(indices) => indices.iter().copied().max(),
        };
        if let Some(largest) = largest {
            if largest >= dim.elements_num() {
                return Err(ArrayError::general(
                    operation,
                    format!("index {largest} out of range for dimension {i}"),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn array(sizes: &[u64]) -> Array {
        let mut array = Array::new(sizes.len());
        for &n in sizes {
            array.push(IndexDimension::full(n));
        }
        array
    }

    #[test]
    fn full_ranges_cover_every_cell_once() {
        let original = array(&[3, 2]);
        let cells = project_cells(&original.copy(), &original).unwrap();
        assert_eq!(cells.values::<u64>().unwrap(), &[0, 1, 2, 3, 4, 5]);
        assert!(cells.is_sorted());
    }

    #[test]
    fn candidates_use_the_original_strides() {
        let original = array(&[4, 3, 2]);
        let mut candidates = Array::new(3);
        candidates.push(IndexDimension::Indices(vec![1, 3]));
        candidates.push(IndexDimension::Range {
            min: 0,
            max: 2,
            step: 2,
        });
        candidates.push(IndexDimension::full(2));

        let cells = project_cells(&candidates, &original).unwrap();
        assert_eq!(
            cells.values::<u64>().unwrap(),
            &[1, 3, 9, 11, 13, 15, 21, 23]
        );
    }

    #[test]
    fn empty_candidate_dimension_gives_no_cells() {
        let original = array(&[2, 2]);
        let mut candidates = Array::new(2);
        candidates.push(IndexDimension::full(2));
        candidates.push(IndexDimension::Indices(vec![]));
        assert!(project_cells(&candidates, &original).unwrap().is_empty());
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        let err = project_cells(&array(&[2]), &array(&[2, 2])).unwrap_err();
        assert!(matches!(err, ArrayError::General { .. }));

        let mut candidates = Array::new(1);
        candidates.push(IndexDimension::Indices(vec![5]));
        assert!(project_cells(&candidates, &array(&[3])).is_err());
    }
}
