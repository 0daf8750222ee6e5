use test_case::test_case;

use tensorfold_ir::eval::EvalError;
use tensorfold_ir::{OpKind, ReduceOp, Tensor};

use crate::kernels::reduce;

fn i32s(dims: &[usize], data: &[i32]) -> Tensor {
    Tensor::from_slice(dims, data).unwrap()
}

// [[1, 2, 3], [4, 5, 6]]
fn matrix() -> Tensor {
    i32s(&[2, 3], &[1, 2, 3, 4, 5, 6])
}

#[test_case(ReduceOp::Sum, &[0], false, &[3], &[5, 7, 9]; "sum_rows")]
#[test_case(ReduceOp::Sum, &[1], true, &[2, 1], &[6, 15]; "sum_cols_keep_dims")]
#[test_case(ReduceOp::Sum, &[], false, &[], &[21]; "sum_all")]
#[test_case(ReduceOp::Prod, &[-1], false, &[2], &[6, 120]; "prod_negative_axis")]
#[test_case(ReduceOp::Max, &[0, 1], true, &[1, 1], &[6]; "max_all_keep_dims")]
#[test_case(ReduceOp::Min, &[1], false, &[2], &[1, 4]; "min_cols")]
#[test_case(ReduceOp::Mean, &[1], false, &[2], &[2, 5]; "mean_cols")]
fn test_reduce(op: ReduceOp, axes: &[i64], keep_dims: bool, dims: &[usize], expected: &[i32]) {
    assert_eq!(reduce(op, &matrix(), axes, keep_dims).unwrap(), i32s(dims, expected));
}

#[test]
fn test_mean_float() {
    let x = Tensor::from_slice(&[4], &[1.0f64, 2.0, 3.0, 4.0]).unwrap();
    assert_eq!(reduce(ReduceOp::Mean, &x, &[], false).unwrap(), Tensor::scalar(2.5f64));
}

#[test]
fn test_empty_reduction() {
    let x = i32s(&[0, 2], &[]);
    assert_eq!(reduce(ReduceOp::Sum, &x, &[0], false).unwrap(), i32s(&[2], &[0, 0]));
    assert_eq!(reduce(ReduceOp::Prod, &x, &[0], false).unwrap(), i32s(&[2], &[1, 1]));
    assert_eq!(
        reduce(ReduceOp::Max, &x, &[0], false),
        Err(EvalError::InvalidOperand { op: OpKind::Reduce, index: 0 })
    );
}

#[test]
fn test_duplicate_axis() {
    assert!(matches!(reduce(ReduceOp::Sum, &matrix(), &[1, -1], false), Err(EvalError::InvalidShape { .. })));
}
