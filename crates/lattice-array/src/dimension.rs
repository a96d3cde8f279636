//! Regular dimensions and their compact column encoding.
//!
//! An encoded dimension is a column holding `element_repeats` copies of `min`, then
//! `group_repeats` copies of `max`, then the step. The logical column it stands for is the
//! progression `min, min + step, ..., max` with every element repeated `element_repeats` times and
//! the whole cycle repeated `group_repeats` times. The physical size never depends on the logical
//! size.

use std::fmt;

use lattice_columnar::{try_allocate, Column, ColumnType, DimensionHint, NativeType, Value};

use crate::error::{storage, ArrayError, ArrayResult};
use crate::numeric::{with_native_type, DimValue};

/// A regular progression `min, min + step, ..., max`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dimension<T> {
    min: T,
    max: T,
    step: T,
    elements_num: u64,
}

impl<T: DimValue> Dimension<T> {
    /// Validate and build a dimension.
    ///
    /// A zero step is only accepted when `min == max`; negative steps and `min > max` are
    /// rejected.
    pub fn new(min: T, max: T, step: T) -> ArrayResult<Self> {
        Self::new_for("dimension", min, max, step)
    }

    pub(crate) fn new_for(operation: &'static str, min: T, max: T, step: T) -> ArrayResult<Self> {
        if min.is_nil() || max.is_nil() || step.is_nil() {
            return Err(ArrayError::general(operation, "dimension bounds must not be nil"));
        }
        if min > max {
            return Err(ArrayError::general(
                operation,
                format!("dimension min {min} is greater than max {max}"),
            ));
        }
        if step < T::zero() {
            return Err(ArrayError::general(
                operation,
                format!("negative dimension step {step}"),
            ));
        }
        if step == T::zero() && min != max {
            return Err(ArrayError::general(
                operation,
                "zero step with distinct min and max",
            ));
        }

        let elements_num = if min == max {
            1
        } else {
            let (steps, _) = max.steps_from(min, step);
            u64::try_from(steps)
                .ok()
                .and_then(|steps| steps.checked_add(1))
                .ok_or_else(|| {
                    ArrayError::general(operation, "dimension holds too many elements")
                })?
        };

        // Keep the step non-zero so positional arithmetic never divides by zero.
        let step = if step == T::zero() { T::one() } else { step };
        Ok(Self {
            min,
            max,
            step,
            elements_num,
        })
    }

    pub fn min(&self) -> T {
        self.min
    }

    pub fn max(&self) -> T {
        self.max
    }

    pub fn step(&self) -> T {
        self.step
    }

    /// Number of distinct elements, `floor((max - min) / step) + 1`.
    pub fn elements_num(&self) -> u64 {
        self.elements_num
    }

    /// Element at dimension-local `index` (not bounds checked).
    pub fn element(&self, index: u64) -> T {
        T::advance(self.min, self.step, index)
    }

    /// Index of `value`, or `None` when `value` is nil, off the grid or out of range.
    pub fn find_position(&self, value: T) -> Option<u64> {
        if value.is_nil() || value < self.min || value > self.max {
            return None;
        }
        let (index, exact) = value.steps_from(self.min, self.step);
        if !exact || index < 0 || index >= i128::from(self.elements_num) {
            return None;
        }
        u64::try_from(index).ok()
    }

    /// Smallest index whose element is `> value` (`>=` when `inclusive`).
    ///
    /// Returns 0 when `value` precedes `min` and `elements_num()` when no element qualifies.
    pub fn find_position_at_or_after(&self, value: T, inclusive: bool) -> u64 {
        if value < self.min {
            return 0;
        }
        if value > self.max {
            return self.elements_num;
        }
        let (index, exact) = value.steps_from(self.min, self.step);
        let first = if exact && inclusive {
            index
        } else {
            index.saturating_add(1)
        };
        first.clamp(0, i128::from(self.elements_num)) as u64
    }

    /// Largest index whose element is `< value` (`<=` when `inclusive`), or `None` when `value`
    /// does not exceed `min`.
    pub fn find_position_at_or_before(&self, value: T, inclusive: bool) -> Option<u64> {
        if value < self.min {
            return None;
        }
        let last_index = self.elements_num - 1;
        if value > self.max {
            return Some(last_index);
        }
        let (index, exact) = value.steps_from(self.min, self.step);
        let last = if exact && !inclusive {
            index.saturating_sub(1)
        } else {
            index
        };
        if last < 0 {
            return None;
        }
        Some(last.min(i128::from(last_index)) as u64)
    }
}

/// A [`Dimension`] together with its repetition counts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EncodedDimension<T> {
    dimension: Dimension<T>,
    element_repeats: u64,
    group_repeats: u64,
}

impl<T: DimValue> EncodedDimension<T> {
    pub fn new(
        dimension: Dimension<T>,
        element_repeats: u64,
        group_repeats: u64,
    ) -> ArrayResult<Self> {
        Self::new_for("encode_dimension", dimension, element_repeats, group_repeats)
    }

    fn new_for(
        operation: &'static str,
        dimension: Dimension<T>,
        element_repeats: u64,
        group_repeats: u64,
    ) -> ArrayResult<Self> {
        if element_repeats == 0 || group_repeats == 0 {
            return Err(ArrayError::general(
                operation,
                "element and group repeats must be positive",
            ));
        }
        let logical = dimension
            .elements_num
            .checked_mul(element_repeats)
            .and_then(|n| n.checked_mul(group_repeats));
        if logical.is_none() {
            return Err(ArrayError::general(
                operation,
                "logical dimension size overflows the position space",
            ));
        }
        Ok(Self {
            dimension,
            element_repeats,
            group_repeats,
        })
    }

    pub fn dimension(&self) -> &Dimension<T> {
        &self.dimension
    }

    pub fn element_repeats(&self) -> u64 {
        self.element_repeats
    }

    pub fn group_repeats(&self) -> u64 {
        self.group_repeats
    }

    pub fn elements_num(&self) -> u64 {
        self.dimension.elements_num
    }

    /// Positions covered by one `min..=max` cycle.
    pub fn group_len(&self) -> u64 {
        self.dimension.elements_num * self.element_repeats
    }

    /// Size of the logical (materialized) column.
    pub fn logical_len(&self) -> u64 {
        self.group_len() * self.group_repeats
    }

    /// Dimension-local index of the element stored at logical `position`.
    pub fn index_at(&self, position: u64) -> u64 {
        (position % self.group_len()) / self.element_repeats
    }

    /// Value stored at logical `position`.
    pub fn element_at(&self, position: u64) -> T {
        self.dimension.element(self.index_at(position))
    }

    /// Compact column form, tagged with a [`DimensionHint`].
    pub fn encode(&self) -> ArrayResult<Column> {
        const OPERATION: &str = "encode_dimension";
        let len = self
            .element_repeats
            .checked_add(self.group_repeats)
            .and_then(|n| n.checked_add(1))
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| ArrayError::general(OPERATION, "encoded dimension is too large"))?;

        let mut values: Vec<T> = try_allocate(len).map_err(storage(OPERATION))?;
        values.resize(self.element_repeats as usize, self.dimension.min);
        values.resize(len - 1, self.dimension.max);
        values.push(self.dimension.step);

        Ok(Column::from_vec(values).with_dimension_hint(DimensionHint {
            element_repeats: self.element_repeats,
        }))
    }

    /// Decode a compact column of element type `T`.
    pub fn decode(column: &Column) -> ArrayResult<Self> {
        Self::decode_for("decode_dimension", column)
    }

    pub(crate) fn decode_for(operation: &'static str, column: &Column) -> ArrayResult<Self> {
        let values = column
            .values::<T>()
            .ok_or_else(|| ArrayError::dimension_type(operation, column.column_type()))?;
        if values.len() < 3 {
            return Err(ArrayError::general(
                operation,
                format!("encoded dimension needs at least 3 entries, found {}", values.len()),
            ));
        }
        if values.iter().any(|v| v.is_nil()) {
            return Err(ArrayError::general(operation, "encoded dimension contains nil"));
        }

        let (body, step) = values.split_at(values.len() - 1);
        let min = body[0];
        let step = step[0];
        let head = body.iter().take_while(|v| **v == min).count();

        let element_repeats = if head < body.len() {
            head
        } else {
            // `min == max`: the runs are indistinguishable, so rely on the hint.
            match column.dimension_hint() {
                Some(hint) => usize::try_from(hint.element_repeats)
                    .ok()
                    .filter(|er| (1..body.len()).contains(er))
                    .ok_or_else(|| {
                        ArrayError::general(operation, "dimension hint does not fit the column")
                    })?,
                None => body.len() - 1,
            }
        };
        let max = body[element_repeats];
        let step = if step == T::zero() { T::one() } else { step };

        let dimension = Dimension::new_for(operation, min, max, step)?;
        Self::new_for(
            operation,
            dimension,
            element_repeats as u64,
            (body.len() - element_repeats) as u64,
        )
    }
}

/// A dimension with boxed bounds, identified by its ordinal in an array.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalyticDimension {
    dim_num: usize,
    column_type: ColumnType,
    min: Value,
    max: Value,
    step: Value,
    elements_num: u64,
}

impl AnalyticDimension {
    pub fn new<T: DimValue>(dim_num: usize, min: T, max: T, step: T) -> ArrayResult<Self> {
        Ok(Self::from_typed(dim_num, &Dimension::new(min, max, step)?))
    }

    fn from_typed<T: DimValue>(dim_num: usize, dimension: &Dimension<T>) -> Self {
        Self {
            dim_num,
            column_type: T::COLUMN_TYPE,
            min: dimension.min.to_value(),
            max: dimension.max.to_value(),
            step: dimension.step.to_value(),
            elements_num: dimension.elements_num,
        }
    }

    /// Read the bounds of an encoded dimension column.
    pub fn from_dimension_column(dim_num: usize, column: &Column) -> ArrayResult<Self> {
        const OPERATION: &str = "analytic_dimension";
        with_native_type!(
            column.column_type(),
            |T| {
                let encoded = EncodedDimension::<T>::decode_for(OPERATION, column)?;
                Ok(Self::from_typed(dim_num, encoded.dimension()))
            },
            |ty| Err(ArrayError::dimension_type(OPERATION, ty))
        )
    }

    /// Encode this dimension with the given repetition counts.
    pub fn to_dimension_column(
        &self,
        element_repeats: u64,
        group_repeats: u64,
    ) -> ArrayResult<Column> {
        const OPERATION: &str = "encode_dimension";
        with_native_type!(
            self.column_type,
            |T| {
                let dimension = self.typed_for::<T>(OPERATION)?;
                EncodedDimension::new_for(OPERATION, dimension, element_repeats, group_repeats)?
                    .encode()
            },
            |ty| Err(ArrayError::dimension_type(OPERATION, ty))
        )
    }

    pub fn dim_num(&self) -> usize {
        self.dim_num
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn min(&self) -> &Value {
        &self.min
    }

    pub fn max(&self) -> &Value {
        &self.max
    }

    pub fn step(&self) -> &Value {
        &self.step
    }

    pub fn elements_num(&self) -> u64 {
        self.elements_num
    }

    pub(crate) fn typed_for<T: DimValue>(
        &self,
        operation: &'static str,
    ) -> ArrayResult<Dimension<T>> {
        match (
            T::from_value(&self.min),
            T::from_value(&self.max),
            T::from_value(&self.step),
        ) {
            (Some(min), Some(max), Some(step)) if T::COLUMN_TYPE == self.column_type => {
                Dimension::new_for(operation, min, max, step)
            }
            _ => Err(ArrayError::dimension_type(operation, self.column_type)),
        }
    }
}

impl fmt::Display for AnalyticDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dim{}[{}:{}:{}] ({} elements of {})",
            self.dim_num, self.min, self.step, self.max, self.elements_num, self.column_type
        )
    }
}
