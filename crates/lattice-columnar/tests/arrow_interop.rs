#![cfg(feature = "arrow")]

use arrow_array::Array;
use lattice_columnar::{Column, ColumnType, Value};
use pretty_assertions::assert_eq;
use std::sync::Arc;

#[test]
fn nil_sentinels_become_arrow_nulls() {
    let column = Column::from_vec(vec![1i32, i32::MIN, 3]);
    let array = column.to_arrow();

    assert_eq!(array.len(), 3);
    assert_eq!(array.null_count(), 1);
    assert!(array.is_null(1));

    let back = Column::from_arrow(array.as_ref()).unwrap();
    assert_eq!(back, column);
}

#[test]
fn positions_and_strings_roundtrip() {
    let positions = Column::from_vec(vec![0u64, 5, 9]);
    let back = Column::from_arrow(positions.to_arrow().as_ref()).unwrap();
    assert_eq!(back.column_type(), ColumnType::Oid);
    assert_eq!(back.values::<u64>(), Some(&[0u64, 5, 9][..]));

    let strings = Column::from_strings(vec![Some(Arc::<str>::from("a")), None]);
    let back = Column::from_arrow(strings.to_arrow().as_ref()).unwrap();
    assert_eq!(back.get(0), Value::from("a"));
    assert_eq!(back.get(1), Value::Null);
}

#[test]
fn float_nan_is_null() {
    let column = Column::from_vec(vec![f64::NAN, 1.5]);
    let array = column.to_arrow();
    assert!(array.is_null(0));
    let back = Column::from_arrow(array.as_ref()).unwrap();
    assert_eq!(back.get(0), Value::Null);
    assert_eq!(back.get(1), Value::Float64(1.5));
}
