use test_case::test_case;

use crate::shape::{
    Dim, Shape, broadcast, checked_element_count, element_count, normalize_axis, range_len, resolve_reshape, slice_range,
};
use crate::ty::TypeError;
use crate::types::ConstValue;

fn dims(shape: &[i64]) -> Shape {
    Shape::Ranked(shape.iter().map(|&d| if d < 0 { Dim::Unknown } else { Dim::Fixed(d as usize) }).collect())
}

#[test_case(&[2, 1, 3], &[2, 6, 3], &[2, 6, 3]; "stretch_middle")]
#[test_case(&[4], &[3, 1], &[3, 4]; "rank_extension")]
#[test_case(&[], &[5, 5], &[5, 5]; "scalar")]
#[test_case(&[1, -1], &[7, 1], &[7, -1]; "unknown_survives_unit")]
#[test_case(&[-1], &[5], &[5]; "unknown_takes_fixed")]
fn test_broadcast(lhs: &[i64], rhs: &[i64], expected: &[i64]) {
    assert_eq!(broadcast(&dims(lhs), &dims(rhs)).unwrap(), dims(expected));
    assert_eq!(broadcast(&dims(rhs), &dims(lhs)).unwrap(), dims(expected));
}

#[test]
fn test_broadcast_mismatch() {
    let err = broadcast(&dims(&[2, 3]), &dims(&[4, 3])).unwrap_err();
    assert!(matches!(err, TypeError::NotBroadcastable { .. }));
}

#[test]
fn test_broadcast_unranked() {
    assert_eq!(broadcast(&Shape::Unranked, &dims(&[2])).unwrap(), Shape::Unranked);
}

#[test_case(Some(24), &[2, -1, 4], &[2, 3, 4]; "infer_middle")]
#[test_case(Some(6), &[6], &[6]; "flatten")]
#[test_case(None, &[2, -1], &[2, -1]; "unknown_input")]
#[test_case(Some(0), &[0, 3], &[0, 3]; "empty")]
fn test_resolve_reshape(count: Option<usize>, target: &[i64], expected: &[i64]) {
    let out = resolve_reshape(count, target).unwrap();
    assert_eq!(Shape::Ranked(out), dims(expected));
}

#[test]
fn test_resolve_reshape_errors() {
    assert_eq!(
        resolve_reshape(Some(24), &[5, 5]),
        Err(TypeError::ReshapeElementCountMismatch { input: 24, target: vec![5, 5] })
    );
    assert_eq!(
        resolve_reshape(Some(24), &[-1, -1]),
        Err(TypeError::MultipleInferredDims { target: vec![-1, -1] })
    );
    assert_eq!(resolve_reshape(Some(24), &[-2, 12]), Err(TypeError::NegativeDim { dim: -2 }));
    assert!(resolve_reshape(Some(24), &[5, -1]).is_err());
}

#[test_case(Some(768), &[i64::MAX, 4]; "known_input")]
#[test_case(None, &[i64::MAX, 4, -1]; "unknown_input")]
fn test_resolve_reshape_overflow(count: Option<usize>, target: &[i64]) {
    assert_eq!(resolve_reshape(count, target), Err(TypeError::ShapeOverflow { dims: target.to_vec() }));
}

#[test]
fn test_element_count_overflow() {
    let huge = [1usize << 40, 1 << 40];
    assert_eq!(checked_element_count(&[1, 3, 240, 320]), Some(230_400));
    assert_eq!(checked_element_count(&huge), None);
    assert_eq!(checked_element_count(&[0, usize::MAX, 2]), Some(0));
    assert_eq!(element_count(&huge), Err(TypeError::ShapeOverflow { dims: vec![1 << 40, 1 << 40] }));
    assert_eq!(Shape::fixed(&huge).element_count(), None);
}

#[test_case(10, 0, 5, 1, &[0, 1, 2, 3, 4]; "prefix")]
#[test_case(10, 1, 8, 3, &[1, 4, 7]; "strided")]
#[test_case(10, -3, i64::MAX, 1, &[7, 8, 9]; "negative_begin_to_end")]
#[test_case(5, 100, 200, 1, &[]; "begin_past_end")]
#[test_case(5, -1, i64::MIN, -1, &[4, 3, 2, 1, 0]; "full_reverse")]
#[test_case(6, 4, 0, -2, &[4, 2]; "reverse_strided")]
#[test_case(0, 0, -1, -1, &[]; "empty_axis_reverse")]
#[test_case(10, 0, 10, i64::MAX, &[0]; "max_step")]
#[test_case(10, 9, 0, i64::MIN, &[9]; "min_step")]
#[test_case(10, i64::MIN, i64::MAX, i64::MAX, &[0]; "max_step_extreme_bounds")]
#[test_case(10, i64::MAX, i64::MIN, i64::MIN, &[9]; "min_step_extreme_bounds")]
fn test_slice_range(dim: usize, begin: i64, end: i64, step: i64, expected: &[usize]) {
    let range = slice_range(dim, begin, end, step).unwrap();
    assert_eq!(range.len, expected.len());
    assert_eq!(range.indices().collect::<Vec<_>>(), expected);
}

#[test]
fn test_slice_zero_step() {
    assert_eq!(slice_range(4, 0, 4, 0), Err(TypeError::ZeroStep));
}

#[test_case(ConstValue::Int(0), ConstValue::Int(10), ConstValue::Int(3), 4; "int_ceil")]
#[test_case(ConstValue::Int(10), ConstValue::Int(0), ConstValue::Int(-2), 5; "int_descending")]
#[test_case(ConstValue::Int(10), ConstValue::Int(0), ConstValue::Int(-4), 3; "int_descending_ceil")]
#[test_case(ConstValue::Int(5), ConstValue::Int(0), ConstValue::Int(1), 0; "empty")]
#[test_case(ConstValue::Float(0.0), ConstValue::Float(1.0), ConstValue::Float(0.25), 4; "float")]
fn test_range_len(start: ConstValue, limit: ConstValue, delta: ConstValue, expected: usize) {
    assert_eq!(range_len(start, limit, delta).unwrap(), expected);
}

#[test]
fn test_range_len_zero_delta() {
    assert_eq!(range_len(ConstValue::Int(0), ConstValue::Int(3), ConstValue::Int(0)), Err(TypeError::ZeroStep));
}

#[test]
fn test_normalize_axis() {
    assert_eq!(normalize_axis(-1, 4), Ok(3));
    assert_eq!(normalize_axis(2, 4), Ok(2));
    assert_eq!(normalize_axis(4, 4), Err(TypeError::AxisOutOfRange { axis: 4, rank: 4 }));
    assert_eq!(normalize_axis(-5, 4), Err(TypeError::AxisOutOfRange { axis: -5, rank: 4 }));
}

#[test]
fn test_accepts_and_static() {
    assert!(dims(&[2, -1]).accepts(&dims(&[2, 7])));
    assert!(!dims(&[2, -1]).accepts(&dims(&[3, 7])));
    assert!(!dims(&[2]).accepts(&dims(&[2, 1])));
    assert!(Shape::Unranked.accepts(&dims(&[1, 2, 3])));

    assert!(dims(&[1, 3, 240, 320]).is_static());
    assert!(!dims(&[1, -1]).is_static());
    assert_eq!(dims(&[1, -1]).element_count(), None);
    assert_eq!(dims(&[1, -1]).to_string(), "[1,?]");
}
