//! The minimal arithmetic the positional algebra needs from an element type.

use lattice_columnar::NativeType;

/// Ordered numeric element of a dimension.
///
/// Integer implementations compute in `i128` so `max - min` cannot overflow the element type;
/// float implementations compute in `f64`.
pub trait DimValue: NativeType {
    fn zero() -> Self;

    fn one() -> Self;

    /// `self + rhs`, or `None` when the result is not representable.
    fn checked_add(self, rhs: Self) -> Option<Self>;

    /// `self - rhs`, or `None` when the result is not representable.
    fn checked_sub(self, rhs: Self) -> Option<Self>;

    /// `floor((self - origin) / step)` together with whether the division was exact.
    fn steps_from(self, origin: Self, step: Self) -> (i128, bool);

    /// `origin + step * index`.
    fn advance(origin: Self, step: Self, index: u64) -> Self;
}

macro_rules! dim_int {
    ($ty:ty) => {
        impl DimValue for $ty {
            fn zero() -> Self {
                0
            }

            fn one() -> Self {
                1
            }

            fn checked_add(self, rhs: Self) -> Option<Self> {
                <$ty>::checked_add(self, rhs)
            }

            fn checked_sub(self, rhs: Self) -> Option<Self> {
                <$ty>::checked_sub(self, rhs)
            }

            fn steps_from(self, origin: Self, step: Self) -> (i128, bool) {
                let diff = (self as i128).wrapping_sub(origin as i128);
                let step = step as i128;
                (diff.div_euclid(step), diff.rem_euclid(step) == 0)
            }

            fn advance(origin: Self, step: Self, index: u64) -> Self {
                ((origin as i128) + (step as i128) * (index as i128)) as $ty
            }
        }
    };
}

macro_rules! dim_float {
    ($ty:ty) => {
        impl DimValue for $ty {
            fn zero() -> Self {
                0.0
            }

            fn one() -> Self {
                1.0
            }

            fn checked_add(self, rhs: Self) -> Option<Self> {
                let out = self + rhs;
                out.is_finite().then_some(out)
            }

            fn checked_sub(self, rhs: Self) -> Option<Self> {
                let out = self - rhs;
                out.is_finite().then_some(out)
            }

            fn steps_from(self, origin: Self, step: Self) -> (i128, bool) {
                let q = (self as f64 - origin as f64) / step as f64;
                let floor = q.floor();
                (floor as i128, floor == q)
            }

            fn advance(origin: Self, step: Self, index: u64) -> Self {
                (origin as f64 + step as f64 * index as f64) as $ty
            }
        }
    };
}

dim_int!(i8);
dim_int!(i16);
dim_int!(i32);
dim_int!(i64);
dim_int!(u64);
dim_float!(f32);
dim_float!(f64);

// `i128` cannot widen further. A difference that overflows saturates toward the side `self` lies
// on, reported as inexact.
impl DimValue for i128 {
    fn zero() -> Self {
        0
    }

    fn one() -> Self {
        1
    }

    fn checked_add(self, rhs: Self) -> Option<Self> {
        i128::checked_add(self, rhs)
    }

    fn checked_sub(self, rhs: Self) -> Option<Self> {
        i128::checked_sub(self, rhs)
    }

    fn steps_from(self, origin: Self, step: Self) -> (i128, bool) {
        match self.checked_sub(origin) {
            Some(diff) => (diff.div_euclid(step), diff.rem_euclid(step) == 0),
            None if self > origin => (i128::MAX, false),
            None => (i128::MIN, false),
        }
    }

    fn advance(origin: Self, step: Self, index: u64) -> Self {
        origin.wrapping_add(step.wrapping_mul(index as i128))
    }
}

/// Run `$body` with `$t` bound to the native type of `$column_type`.
///
/// Strings (the only non-numeric type) evaluate `$otherwise` with `$other` bound to the type.
macro_rules! with_native_type {
    ($column_type:expr, |$t:ident| $body:expr, |$other:ident| $otherwise:expr) => {
        match $column_type {
            lattice_columnar::ColumnType::Int8 => {
                type $t = i8;
                $body
            }
            lattice_columnar::ColumnType::Int16 => {
                type $t = i16;
                $body
            }
            lattice_columnar::ColumnType::Int32 => {
                type $t = i32;
                $body
            }
            lattice_columnar::ColumnType::Int64 => {
                type $t = i64;
                $body
            }
            lattice_columnar::ColumnType::Int128 => {
                type $t = i128;
                $body
            }
            lattice_columnar::ColumnType::Oid => {
                type $t = u64;
                $body
            }
            lattice_columnar::ColumnType::Float32 => {
                type $t = f32;
                $body
            }
            lattice_columnar::ColumnType::Float64 => {
                type $t = f64;
                $body
            }
            $other @ lattice_columnar::ColumnType::String => $otherwise,
        }
    };
}

pub(crate) use with_native_type;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_steps_do_not_overflow_the_element_type() {
        assert_eq!(100i8.steps_from(-100, 1), (200, true));
        assert_eq!(i8::advance(-100, 1, 200), 100);
        assert_eq!(7i32.steps_from(1, 3), (2, true));
        assert_eq!(8i32.steps_from(1, 3), (2, false));
        assert_eq!(0i32.steps_from(1, 3), (-1, false));
        assert_eq!(u64::MAX.steps_from(0, u64::MAX), (1, true));
    }

    #[test]
    fn wide_integer_steps_saturate_on_overflow() {
        assert_eq!(i128::MAX.steps_from(-10, 1), (i128::MAX, false));
        assert_eq!((i128::MIN + 1).steps_from(10, 1), (i128::MIN, false));
        assert_eq!(12i128.steps_from(-10, 2), (11, true));
    }

    #[test]
    fn float_steps() {
        assert_eq!(2.5f64.steps_from(0.0, 0.5), (5, true));
        assert_eq!(2.6f64.steps_from(0.0, 0.5), (5, false));
        assert_eq!(f32::advance(1.0, 0.25, 4), 2.0);
        assert_eq!(f64::MAX.checked_add(f64::MAX), None);
    }

    #[test]
    fn checked_arithmetic() {
        assert_eq!(DimValue::checked_sub(3u64, 5), None);
        assert_eq!(DimValue::checked_add(i8::MAX, 1), None);
        assert_eq!(<i16 as DimValue>::one(), 1);
    }
}
