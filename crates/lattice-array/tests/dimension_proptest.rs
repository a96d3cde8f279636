use std::collections::BTreeSet;

use lattice_array::{
    dimension_size, dimension_subselect, dimension_theta_subselect, materialize_dimension,
    project, project_cells, subjoin, subselect, theta_subselect, AnalyticDimension, Array,
    Column, Dimension, EncodedDimension, Value,
};
use proptest::prelude::*;

const OPERATORS: [&str; 6] = ["=", "!=", "<", "<=", ">", ">="];

/// `(min, step, elements, element_repeats, group_repeats)` of a small i32 dimension.
fn shape() -> impl Strategy<Value = (i32, i32, u64, u64, u64)> {
    (-50i32..50, 1i32..5, 1u64..12, 1u64..4, 1u64..4)
}

fn encoded((min, step, n, er, gr): (i32, i32, u64, u64, u64)) -> EncodedDimension<i32> {
    let max = min + step * (n as i32 - 1);
    EncodedDimension::new(Dimension::new(min, max, step).unwrap(), er, gr).unwrap()
}

/// The logical column spelled out element by element.
fn brute_force(dim: &EncodedDimension<i32>) -> Vec<i32> {
    let d = dim.dimension();
    let mut out = Vec::new();
    for _ in 0..dim.group_repeats() {
        for i in 0..d.elements_num() {
            for _ in 0..dim.element_repeats() {
                out.push(d.min() + d.step() * i as i32);
            }
        }
    }
    out
}

fn bound(value: Option<i32>) -> Value {
    value.map_or(Value::Null, Value::Int32)
}

fn positions(column: &Column) -> Vec<u64> {
    column.values::<u64>().unwrap().to_vec()
}

/// `count` elements, each repeated `er` times, the whole cycle repeated `gr` times.
fn expand<T: Copy>(count: u64, er: u64, gr: u64, element: impl Fn(u64) -> T) -> Vec<T> {
    let mut out = Vec::new();
    for _ in 0..gr {
        for i in 0..count {
            out.extend(std::iter::repeat(element(i)).take(er as usize));
        }
    }
    out
}

/// Expected positions of a range selection over the expanded column, `(hits, misses)`.
fn expected_split<T: Copy + PartialOrd>(
    expanded: &[T],
    low: Option<T>,
    high: Option<T>,
    include_low: bool,
    include_high: bool,
) -> (Vec<u64>, Vec<u64>) {
    if low.is_none() && high.is_none() {
        return (Vec::new(), Vec::new());
    }
    let matches = |v: T| match (low, high) {
        (Some(l), Some(h)) if l == h => v == l,
        _ => {
            low.map_or(true, |l| if include_low { v >= l } else { v > l })
                && high.map_or(true, |h| if include_high { v <= h } else { v < h })
        }
    };
    let (hits, misses): (Vec<(usize, &T)>, Vec<(usize, &T)>) =
        expanded.iter().enumerate().partition(|(_, v)| matches(**v));
    let index = |pairs: Vec<(usize, &T)>| pairs.into_iter().map(|(p, _)| p as u64).collect();
    (index(hits), index(misses))
}

fn expected_theta<T: Copy + PartialOrd>(expanded: &[T], value: T, operator: &str) -> Vec<u64> {
    expanded
        .iter()
        .enumerate()
        .filter(|(_, v)| match operator {
            "=" => **v == value,
            "!=" => **v != value,
            "<" => **v < value,
            "<=" => **v <= value,
            ">" => **v > value,
            _ => **v >= value,
        })
        .map(|(p, _)| p as u64)
        .collect()
}

/// Run every selection form against `column` and compare with the expanded column.
#[allow(clippy::too_many_arguments)]
fn check_selections<T: Copy + PartialOrd>(
    column: &Column,
    expanded: &[T],
    to_value: fn(T) -> Value,
    low: Option<T>,
    high: Option<T>,
    include_low: bool,
    include_high: bool,
    theta_value: T,
) -> Result<(), TestCaseError> {
    let (hits, misses) = expected_split(expanded, low, high, include_low, include_high);
    let (low, high) = (low.map_or(Value::Null, to_value), high.map_or(Value::Null, to_value));
    for (anti, expected) in [(false, hits), (true, misses)] {
        let selected =
            subselect(column, None, &low, &high, include_low, include_high, anti).unwrap();
        prop_assert_eq!(positions(&selected), expected, "anti={}", anti);
    }
    for operator in OPERATORS {
        let selected = theta_subselect(column, None, &to_value(theta_value), operator).unwrap();
        prop_assert_eq!(
            positions(&selected),
            expected_theta(expanded, theta_value, operator),
            "operator {}",
            operator
        );
    }
    Ok(())
}

/// Bounds on the grid of small float dimensions, plus values far outside any of them.
fn float_bound() -> impl Strategy<Value = f64> {
    prop_oneof![
        Just(1e300),
        Just(-1e300),
        Just(f64::INFINITY),
        Just(f64::NEG_INFINITY),
        (-240i32..240).prop_map(|v| f64::from(v) * 0.25),
    ]
}

/// Bounds near small wide-integer dimensions, plus the extremes of the type (nil excluded).
fn wide_bound() -> impl Strategy<Value = i128> {
    prop_oneof![
        Just(i128::MAX),
        Just(i128::MIN + 1),
        (-60i64..60).prop_map(i128::from),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        rng_seed: proptest::test_runner::RngSeed::Fixed(0),
        max_shrink_iters: 0,
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn encode_then_decode_keeps_the_shape(shape in shape()) {
        let dim = encoded(shape);
        let decoded = EncodedDimension::<i32>::decode(&dim.encode().unwrap()).unwrap();
        prop_assert_eq!(decoded, dim);
    }

    #[test]
    fn element_at_matches_the_expansion(shape in shape()) {
        let dim = encoded(shape);
        let expected = brute_force(&dim);
        prop_assert_eq!(dim.logical_len(), expected.len() as u64);
        for (p, value) in expected.iter().enumerate() {
            prop_assert_eq!(dim.element_at(p as u64), *value);
        }

        let column = dim.encode().unwrap();
        let expanded = materialize_dimension(&column).unwrap();
        prop_assert_eq!(expanded.values::<i32>().unwrap(), expected.as_slice());
        prop_assert_eq!(dimension_size(&column).unwrap(), expected.len() as u64);
    }

    #[test]
    fn anti_selection_is_the_complement(
        shape in shape(),
        low in proptest::option::of(-60i32..60),
        high in proptest::option::of(-60i32..60),
        include_low in any::<bool>(),
        include_high in any::<bool>(),
    ) {
        prop_assume!(low.is_some() || high.is_some());
        let dim = encoded(shape);
        let column = dim.encode().unwrap();
        let (low, high) = (bound(low), bound(high));

        let select = |anti| {
            subselect(&column, None, &low, &high, include_low, include_high, anti).unwrap()
        };
        let (hits, misses) = (select(false), select(true));
        prop_assert!(hits.is_sorted());
        prop_assert!(misses.is_sorted());

        let hits: BTreeSet<u64> = positions(&hits).into_iter().collect();
        let misses: BTreeSet<u64> = positions(&misses).into_iter().collect();
        prop_assert!(hits.is_disjoint(&misses));
        prop_assert_eq!((hits.len() + misses.len()) as u64, dim.logical_len());
    }

    #[test]
    fn selected_positions_hold_matching_values(
        shape in shape(),
        value in -60i32..60,
        operator in 0usize..OPERATORS.len(),
    ) {
        let dim = encoded(shape);
        let column = dim.encode().unwrap();
        let operator = OPERATORS[operator];
        let selected = theta_subselect(&column, None, &Value::Int32(value), operator).unwrap();

        let expected: Vec<u64> = brute_force(&dim)
            .into_iter()
            .enumerate()
            .filter(|(_, v)| match operator {
                "=" => *v == value,
                "!=" => *v != value,
                "<" => *v < value,
                "<=" => *v <= value,
                ">" => *v > value,
                _ => *v >= value,
            })
            .map(|(p, _)| p as u64)
            .collect();
        prop_assert_eq!(positions(&selected), expected);
    }

    #[test]
    fn projecting_a_contiguous_selection_keeps_step_and_repeats(
        shape in shape(),
        a in 0u64..12,
        b in 0u64..12,
    ) {
        let dim = encoded(shape);
        let n = dim.elements_num();
        let (a, b) = (a % n, b % n);
        let (first, last) = (a.min(b), a.max(b));

        let d = dim.dimension();
        let column = dim.encode().unwrap();
        let low = Value::Int32(d.element(first));
        let high = Value::Int32(d.element(last));
        let selected = subselect(&column, None, &low, &high, true, true, false).unwrap();

        let projected = project(&selected, &column).unwrap();
        let decoded = EncodedDimension::<i32>::decode(&projected).unwrap();
        prop_assert_eq!(decoded.dimension().step(), d.step());
        prop_assert_eq!(decoded.element_repeats(), dim.element_repeats());
        prop_assert_eq!(decoded.group_repeats(), dim.group_repeats());

        let values: Vec<i32> = positions(&selected).iter().map(|p| dim.element_at(*p)).collect();
        let expanded = materialize_dimension(&projected).unwrap();
        prop_assert_eq!(expanded.values::<i32>().unwrap(), values.as_slice());
    }

    #[test]
    fn join_cardinality_is_the_product_of_repeats(left in shape(), right in shape()) {
        let (l, r) = (encoded(left), encoded(right));
        let joined = subjoin(&l.encode().unwrap(), &r.encode().unwrap(), None, None).unwrap();

        let left_values: BTreeSet<i32> = brute_force(&l).into_iter().collect();
        let right_values: BTreeSet<i32> = brute_force(&r).into_iter().collect();
        let common = left_values.intersection(&right_values).count() as u64;
        let expected = common
            * l.element_repeats()
            * l.group_repeats()
            * r.element_repeats()
            * r.group_repeats();
        prop_assert_eq!(joined.len() as u64, expected);

        for (lp, rp) in positions(&joined.left).iter().zip(positions(&joined.right)) {
            prop_assert_eq!(l.element_at(*lp), r.element_at(rp));
        }
    }

    #[test]
    fn narrowing_matches_position_selection(
        sizes in proptest::collection::vec(1u64..5, 1..4),
        dim_num in 0usize..3,
        value in -1i32..6,
        operator in 0usize..OPERATORS.len(),
    ) {
        let dim_num = dim_num % sizes.len();
        let dimensions: Vec<AnalyticDimension> = sizes
            .iter()
            .enumerate()
            .map(|(i, n)| AnalyticDimension::new(i, 0i32, *n as i32 - 1, 1).unwrap())
            .collect();
        let array = Array::from_dimensions(&dimensions);
        let dimension = &dimensions[dim_num];
        let operator = OPERATORS[operator];

        // The same dimension laid out over every cell of the array.
        let jump = array.jump_size(dim_num);
        let groups = array.cells_num() / (jump * dimension.elements_num());
        let column = dimension.to_dimension_column(jump, groups).unwrap();

        let expected =
            positions(&theta_subselect(&column, None, &Value::Int32(value), operator).unwrap());
        let narrowed =
            dimension_theta_subselect(&array, None, dimension, &Value::Int32(value), operator)
                .unwrap();
        let actual = match narrowed {
            Some(candidates) => positions(&project_cells(&candidates, &array).unwrap()),
            None => Vec::new(),
        };
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn narrowing_a_range_matches_position_selection(
        sizes in proptest::collection::vec(1u64..5, 1..4),
        dim_num in 0usize..3,
        low in proptest::option::of(-1i32..6),
        high in proptest::option::of(-1i32..6),
        include_low in any::<bool>(),
        include_high in any::<bool>(),
        anti in any::<bool>(),
    ) {
        let dim_num = dim_num % sizes.len();
        let dimensions: Vec<AnalyticDimension> = sizes
            .iter()
            .enumerate()
            .map(|(i, n)| AnalyticDimension::new(i, 0i32, *n as i32 - 1, 1).unwrap())
            .collect();
        let array = Array::from_dimensions(&dimensions);
        let dimension = &dimensions[dim_num];
        let (low, high) = (bound(low), bound(high));

        let jump = array.jump_size(dim_num);
        let groups = array.cells_num() / (jump * dimension.elements_num());
        let column = dimension.to_dimension_column(jump, groups).unwrap();

        let expected = positions(
            &subselect(&column, None, &low, &high, include_low, include_high, anti).unwrap(),
        );
        let narrowed = dimension_subselect(
            &array,
            None,
            dimension,
            &low,
            &high,
            include_low,
            include_high,
            anti,
        )
        .unwrap();
        let actual = match narrowed {
            Some(candidates) => positions(&project_cells(&candidates, &array).unwrap()),
            None => Vec::new(),
        };
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn float_selections_match_the_expansion(
        (min, step) in (-200i32..200, proptest::sample::select(vec![0.25f64, 0.5, 1.0, 2.5])),
        (n, er, gr) in (1u64..12, 1u64..4, 1u64..4),
        low in proptest::option::of(float_bound()),
        high in proptest::option::of(float_bound()),
        include_low in any::<bool>(),
        include_high in any::<bool>(),
        theta_value in float_bound(),
    ) {
        let min = f64::from(min) * 0.25;
        let max = min + step * (n - 1) as f64;
        let dim = EncodedDimension::new(Dimension::new(min, max, step).unwrap(), er, gr).unwrap();
        let column = dim.encode().unwrap();
        let expanded = expand(n, er, gr, |i| min + step * i as f64);
        let materialized = materialize_dimension(&column).unwrap();
        prop_assert_eq!(materialized.values::<f64>().unwrap(), expanded.as_slice());

        check_selections(
            &column,
            &expanded,
            Value::Float64,
            low,
            high,
            include_low,
            include_high,
            theta_value,
        )?;
    }

    #[test]
    fn wide_integer_selections_match_the_expansion(
        (min, step) in (-50i64..50, 1i64..5),
        (n, er, gr) in (1u64..12, 1u64..4, 1u64..4),
        low in proptest::option::of(wide_bound()),
        high in proptest::option::of(wide_bound()),
        include_low in any::<bool>(),
        include_high in any::<bool>(),
        theta_value in wide_bound(),
    ) {
        let (min, step) = (i128::from(min), i128::from(step));
        let max = min + step * (n as i128 - 1);
        let dim = EncodedDimension::new(Dimension::new(min, max, step).unwrap(), er, gr).unwrap();
        let column = dim.encode().unwrap();
        let expanded = expand(n, er, gr, |i| min + step * i as i128);
        let materialized = materialize_dimension(&column).unwrap();
        prop_assert_eq!(materialized.values::<i128>().unwrap(), expanded.as_slice());

        check_selections(
            &column,
            &expanded,
            Value::Int128,
            low,
            high,
            include_low,
            include_high,
            theta_value,
        )?;
    }
}
