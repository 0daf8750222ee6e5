//! Element-wise arithmetic on `ConstValue`.
//!
//! Values arrive in their storage form (`Int`, `UInt`, `Float`, `Bool`); the
//! kernels cast results back to the tensor dtype afterwards, which is where
//! narrow integer types wrap and `Float32` is rounded.

use tensorfold_ir::types::{BinaryOp, ConstValue, ReduceOp, UnaryOp};

/// Evaluate a unary operation on a constant value.
///
/// Returns `None` if the operation is not defined for the value's kind.
///
/// # Semantics
///
/// - Floating point operations follow IEEE 754
/// - Integer operations use wrapping arithmetic
/// - `Round` rounds half to even
pub fn eval_unary_op(op: UnaryOp, v: ConstValue) -> Option<ConstValue> {
    match op {
        UnaryOp::Abs => eval_abs(v),
        UnaryOp::Neg => eval_neg(v),
        UnaryOp::Ceil => float_only(v, f64::ceil),
        UnaryOp::Floor => float_only(v, f64::floor),
        UnaryOp::Round => float_only(v, f64::round_ties_even),
        UnaryOp::Sqrt => float_only(v, f64::sqrt),
        UnaryOp::Exp => float_only(v, f64::exp),
        UnaryOp::Log => float_only(v, f64::ln),
    }
}

/// Evaluate a binary operation on constant values of the same kind.
///
/// Returns `None` if the kinds differ, the operation is not defined for them,
/// or an integer division or modulo has a zero divisor.
///
/// # Semantics
///
/// - Integer division truncates toward zero
/// - Integer `Mod` takes the sign of the divisor, float `Mod` the sign of the dividend
/// - Integer operations use wrapping arithmetic
pub fn eval_binary_op(op: BinaryOp, a: ConstValue, b: ConstValue) -> Option<ConstValue> {
    match op {
        BinaryOp::Add => eval_add(a, b),
        BinaryOp::Sub => eval_sub(a, b),
        BinaryOp::Mul => eval_mul(a, b),
        BinaryOp::Div => eval_div(a, b),
        BinaryOp::Mod => eval_mod(a, b),
        BinaryOp::Min => eval_min(a, b),
        BinaryOp::Max => eval_max(a, b),
        BinaryOp::Pow => eval_pow(a, b),
    }
}

/// True if `op` would divide the integer `a` by the zero `b`.
pub fn is_int_division_by_zero(op: BinaryOp, b: ConstValue) -> bool {
    matches!(op, BinaryOp::Div | BinaryOp::Mod) && matches!(b, ConstValue::Int(0) | ConstValue::UInt(0))
}

/// Fold step of a reduction. `Mean` accumulates like `Sum`.
pub fn eval_reduce_step(op: ReduceOp, acc: ConstValue, v: ConstValue) -> Option<ConstValue> {
    match op {
        ReduceOp::Sum | ReduceOp::Mean => eval_add(acc, v),
        ReduceOp::Prod => eval_mul(acc, v),
        ReduceOp::Max => eval_max(acc, v),
        ReduceOp::Min => eval_min(acc, v),
    }
}

// ============================================================================
// Unary Operations
// ============================================================================

#[inline]
fn float_only(v: ConstValue, f: fn(f64) -> f64) -> Option<ConstValue> {
    match v {
        ConstValue::Float(x) => Some(ConstValue::Float(f(x))),
        _ => None,
    }
}

#[inline]
fn eval_abs(v: ConstValue) -> Option<ConstValue> {
    match v {
        ConstValue::Int(x) => Some(ConstValue::Int(x.wrapping_abs())),
        ConstValue::UInt(x) => Some(ConstValue::UInt(x)),
        ConstValue::Float(x) => Some(ConstValue::Float(x.abs())),
        ConstValue::Bool(_) => None,
    }
}

#[inline]
fn eval_neg(v: ConstValue) -> Option<ConstValue> {
    match v {
        ConstValue::Int(x) => Some(ConstValue::Int(x.wrapping_neg())),
        ConstValue::UInt(x) => Some(ConstValue::UInt(x.wrapping_neg())),
        ConstValue::Float(x) => Some(ConstValue::Float(-x)),
        ConstValue::Bool(_) => None,
    }
}

// ============================================================================
// Binary Operations
// ============================================================================

#[inline]
fn eval_add(a: ConstValue, b: ConstValue) -> Option<ConstValue> {
    match (a, b) {
        (ConstValue::Int(x), ConstValue::Int(y)) => Some(ConstValue::Int(x.wrapping_add(y))),
        (ConstValue::UInt(x), ConstValue::UInt(y)) => Some(ConstValue::UInt(x.wrapping_add(y))),
        (ConstValue::Float(x), ConstValue::Float(y)) => Some(ConstValue::Float(x + y)),
        _ => None,
    }
}

#[inline]
fn eval_sub(a: ConstValue, b: ConstValue) -> Option<ConstValue> {
    match (a, b) {
        (ConstValue::Int(x), ConstValue::Int(y)) => Some(ConstValue::Int(x.wrapping_sub(y))),
        (ConstValue::UInt(x), ConstValue::UInt(y)) => Some(ConstValue::UInt(x.wrapping_sub(y))),
        (ConstValue::Float(x), ConstValue::Float(y)) => Some(ConstValue::Float(x - y)),
        _ => None,
    }
}

#[inline]
fn eval_mul(a: ConstValue, b: ConstValue) -> Option<ConstValue> {
    match (a, b) {
        (ConstValue::Int(x), ConstValue::Int(y)) => Some(ConstValue::Int(x.wrapping_mul(y))),
        (ConstValue::UInt(x), ConstValue::UInt(y)) => Some(ConstValue::UInt(x.wrapping_mul(y))),
        (ConstValue::Float(x), ConstValue::Float(y)) => Some(ConstValue::Float(x * y)),
        _ => None,
    }
}

#[inline]
fn eval_div(a: ConstValue, b: ConstValue) -> Option<ConstValue> {
    match (a, b) {
        (ConstValue::Int(x), ConstValue::Int(y)) if y != 0 => Some(ConstValue::Int(x.wrapping_div(y))),
        (ConstValue::UInt(x), ConstValue::UInt(y)) if y != 0 => Some(ConstValue::UInt(x / y)),
        (ConstValue::Float(x), ConstValue::Float(y)) => Some(ConstValue::Float(x / y)),
        _ => None,
    }
}

#[inline]
fn eval_mod(a: ConstValue, b: ConstValue) -> Option<ConstValue> {
    match (a, b) {
        (ConstValue::Int(x), ConstValue::Int(y)) if y != 0 => {
            let r = x.wrapping_rem(y);
            Some(ConstValue::Int(if r != 0 && (r < 0) != (y < 0) { r + y } else { r }))
        }
        (ConstValue::UInt(x), ConstValue::UInt(y)) if y != 0 => Some(ConstValue::UInt(x % y)),
        (ConstValue::Float(x), ConstValue::Float(y)) => Some(ConstValue::Float(x % y)),
        _ => None,
    }
}

#[inline]
fn eval_min(a: ConstValue, b: ConstValue) -> Option<ConstValue> {
    match (a, b) {
        (ConstValue::Int(x), ConstValue::Int(y)) => Some(ConstValue::Int(x.min(y))),
        (ConstValue::UInt(x), ConstValue::UInt(y)) => Some(ConstValue::UInt(x.min(y))),
        (ConstValue::Float(x), ConstValue::Float(y)) => Some(ConstValue::Float(x.min(y))),
        _ => None,
    }
}

#[inline]
fn eval_max(a: ConstValue, b: ConstValue) -> Option<ConstValue> {
    match (a, b) {
        (ConstValue::Int(x), ConstValue::Int(y)) => Some(ConstValue::Int(x.max(y))),
        (ConstValue::UInt(x), ConstValue::UInt(y)) => Some(ConstValue::UInt(x.max(y))),
        (ConstValue::Float(x), ConstValue::Float(y)) => Some(ConstValue::Float(x.max(y))),
        _ => None,
    }
}

#[inline]
fn eval_pow(a: ConstValue, b: ConstValue) -> Option<ConstValue> {
    match (a, b) {
        (ConstValue::Float(x), ConstValue::Float(y)) => Some(ConstValue::Float(x.powf(y))),
        (ConstValue::Int(x), ConstValue::Int(y)) if y >= 0 => {
            Some(ConstValue::Int(x.wrapping_pow(u32::try_from(y).unwrap_or(u32::MAX))))
        }
        // Negative exponents truncate toward zero, so only |x| == 1 survives.
        (ConstValue::Int(x), ConstValue::Int(y)) if x != 0 => Some(ConstValue::Int((x as f64).powf(y as f64) as i64)),
        (ConstValue::UInt(x), ConstValue::UInt(y)) => {
            Some(ConstValue::UInt(x.wrapping_pow(u32::try_from(y).unwrap_or(u32::MAX))))
        }
        _ => None,
    }
}
