//! Shapes with partially known dimensions.
//!
//! A [`Shape`] is either ranked, with each [`Dim`] fixed or unknown, or
//! unranked. Inference and evaluation share the helpers in this module
//! (broadcasting, reshape resolution, slice clamping) so both agree on every
//! edge case.

use std::fmt;

use smallvec::SmallVec;
use snafu::{OptionExt, ensure};

use crate::types::ConstValue;
use crate::ty::{
    AxisOutOfRangeSnafu, DuplicateAxisSnafu, InvalidPermutationSnafu, MultipleInferredDimsSnafu, NegativeDimSnafu,
    NotBroadcastableSnafu, ReshapeElementCountMismatchSnafu, ShapeOverflowSnafu, TypeError, ZeroStepSnafu,
};

/// One dimension of a ranked shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dim {
    Fixed(usize),
    Unknown,
}

impl Dim {
    pub fn as_fixed(self) -> Option<usize> {
        match self {
            Dim::Fixed(n) => Some(n),
            Dim::Unknown => None,
        }
    }

    /// `Unknown` on either side matches anything.
    pub fn accepts(self, other: Dim) -> bool {
        match (self, other) {
            (Dim::Fixed(a), Dim::Fixed(b)) => a == b,
            _ => true,
        }
    }
}

impl From<usize> for Dim {
    fn from(n: usize) -> Self {
        Dim::Fixed(n)
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Fixed(n) => write!(f, "{n}"),
            Dim::Unknown => f.write_str("?"),
        }
    }
}

pub type DimVec = SmallVec<[Dim; 4]>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Shape {
    Ranked(DimVec),
    Unranked,
}

impl Shape {
    pub fn scalar() -> Self {
        Shape::Ranked(DimVec::new())
    }

    /// Ranked shape with every dimension fixed.
    ///
    /// ```rust
    /// # use tensorfold_ir::shape::Shape;
    /// let shape = Shape::fixed(&[1, 3, 240, 320]);
    /// assert_eq!(shape.rank(), Some(4));
    /// assert_eq!(shape.element_count(), Some(230_400));
    /// ```
    pub fn fixed(dims: &[usize]) -> Self {
        Shape::Ranked(dims.iter().map(|&d| Dim::Fixed(d)).collect())
    }

    /// Ranked shape of `rank` unknown dimensions.
    pub fn unknown(rank: usize) -> Self {
        Shape::Ranked(std::iter::repeat_n(Dim::Unknown, rank).collect())
    }

    pub fn dims(&self) -> Option<&[Dim]> {
        match self {
            Shape::Ranked(dims) => Some(dims),
            Shape::Unranked => None,
        }
    }

    pub fn rank(&self) -> Option<usize> {
        self.dims().map(<[Dim]>::len)
    }

    pub fn is_static(&self) -> bool {
        self.dims().is_some_and(|dims| dims.iter().all(|d| matches!(d, Dim::Fixed(_))))
    }

    /// Concrete dims if the shape is fully static.
    pub fn to_static(&self) -> Option<SmallVec<[usize; 4]>> {
        self.dims()?.iter().map(|d| d.as_fixed()).collect()
    }

    /// Product of the dims; `None` unless static, or if it overflows `usize`.
    pub fn element_count(&self) -> Option<usize> {
        self.to_static().and_then(|dims| checked_element_count(&dims))
    }

    /// Compatibility where `Unknown` dims and `Unranked` shapes match anything.
    pub fn accepts(&self, other: &Shape) -> bool {
        match (self, other) {
            (Shape::Ranked(a), Shape::Ranked(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.accepts(*y))
            }
            _ => true,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Unranked => f.write_str("[*]"),
            Shape::Ranked(dims) => {
                f.write_str("[")?;
                for (i, d) in dims.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{d}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Product of `dims`, or `None` on overflow.
pub fn checked_element_count(dims: &[usize]) -> Option<usize> {
    dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

/// Like [`checked_element_count`], with overflow reported as [`TypeError::ShapeOverflow`].
pub fn element_count(dims: &[usize]) -> Result<usize, TypeError> {
    let dims_i64 = || dims.iter().map(|&d| d as i64).collect::<Vec<_>>();
    checked_element_count(dims).with_context(|| ShapeOverflowSnafu { dims: dims_i64() })
}

/// Numpy broadcasting: shapes are right-aligned and size-1 dims stretch.
///
/// A fixed dim other than 1 paired with an unknown dim is assumed to agree.
///
/// ```rust
/// # use tensorfold_ir::shape::{Shape, broadcast};
/// let out = broadcast(&Shape::fixed(&[2, 1, 3]), &Shape::fixed(&[6, 1])).unwrap();
/// assert_eq!(out, Shape::fixed(&[2, 6, 3]));
/// assert!(broadcast(&Shape::fixed(&[2]), &Shape::fixed(&[3])).is_err());
/// ```
pub fn broadcast(lhs: &Shape, rhs: &Shape) -> Result<Shape, TypeError> {
    let (Some(l), Some(r)) = (lhs.dims(), rhs.dims()) else {
        return Ok(Shape::Unranked);
    };

    let rank = l.len().max(r.len());
    let mut out = DimVec::with_capacity(rank);
    for i in 0..rank {
        // Missing leading dims behave as 1.
        let a = (i + l.len()).checked_sub(rank).map_or(Dim::Fixed(1), |j| l[j]);
        let b = (i + r.len()).checked_sub(rank).map_or(Dim::Fixed(1), |j| r[j]);
        let dim = match (a, b) {
            (Dim::Fixed(x), Dim::Fixed(y)) if x == y => Dim::Fixed(x),
            (Dim::Fixed(1), other) | (other, Dim::Fixed(1)) => other,
            (Dim::Fixed(_), Dim::Fixed(_)) => {
                return NotBroadcastableSnafu { lhs: lhs.clone(), rhs: rhs.clone() }.fail();
            }
            (Dim::Fixed(n), Dim::Unknown) | (Dim::Unknown, Dim::Fixed(n)) => Dim::Fixed(n),
            (Dim::Unknown, Dim::Unknown) => Dim::Unknown,
        };
        out.push(dim);
    }
    Ok(Shape::Ranked(out))
}

/// Broadcast two fully static shapes.
pub fn broadcast_static(lhs: &[usize], rhs: &[usize]) -> Result<SmallVec<[usize; 4]>, TypeError> {
    let out = broadcast(&Shape::fixed(lhs), &Shape::fixed(rhs))?;
    Ok(out.to_static().unwrap_or_default())
}

/// Resolve a possibly negative axis against `rank`.
pub fn normalize_axis(axis: i64, rank: usize) -> Result<usize, TypeError> {
    let resolved = if axis < 0 { axis + rank as i64 } else { axis };
    ensure!((0..rank as i64).contains(&resolved), AxisOutOfRangeSnafu { axis, rank });
    Ok(resolved as usize)
}

/// Resolve a list of distinct axes against `rank`.
pub fn normalize_axes(axes: &[i64], rank: usize) -> Result<SmallVec<[usize; 4]>, TypeError> {
    let mut out = SmallVec::<[usize; 4]>::with_capacity(axes.len());
    for &axis in axes {
        let axis = normalize_axis(axis, rank)?;
        ensure!(!out.contains(&axis), DuplicateAxisSnafu { axis });
        out.push(axis);
    }
    Ok(out)
}

/// Axes reduced by a reduction over a rank-`rank` input; empty means all.
pub fn resolve_reduce_axes(axes: &[i64], rank: usize) -> Result<SmallVec<[usize; 4]>, TypeError> {
    if axes.is_empty() { Ok((0..rank).collect()) } else { normalize_axes(axes, rank) }
}

/// Permutation actually applied by a transpose of a rank-`rank` tensor.
///
/// An empty `perm` reverses the axes.
pub fn resolve_perm(perm: &[usize], rank: usize) -> Result<SmallVec<[usize; 4]>, TypeError> {
    if perm.is_empty() {
        return Ok((0..rank).rev().collect());
    }
    let mut seen = SmallVec::<[bool; 4]>::from_elem(false, rank);
    let valid = perm.len() == rank && perm.iter().all(|&p| p < rank && !std::mem::replace(&mut seen[p], true));
    ensure!(valid, InvalidPermutationSnafu { perm: perm.to_vec(), rank });
    Ok(SmallVec::from_slice(perm))
}

/// Output dims of a reshape to `target`.
///
/// At most one entry may be `-1`; it is inferred from `input_count` when that
/// is known and left `Unknown` otherwise. Other negative entries are rejected.
///
/// ```rust
/// # use tensorfold_ir::shape::{Dim, resolve_reshape};
/// let dims = resolve_reshape(Some(24), &[2, -1, 4]).unwrap();
/// assert_eq!(dims.as_slice(), &[Dim::Fixed(2), Dim::Fixed(3), Dim::Fixed(4)]);
/// assert!(resolve_reshape(Some(24), &[5, -1]).is_err());
/// ```
pub fn resolve_reshape(input_count: Option<usize>, target: &[i64]) -> Result<DimVec, TypeError> {
    let inferred = target.iter().filter(|&&d| d == -1).count();
    ensure!(inferred <= 1, MultipleInferredDimsSnafu { target: target.to_vec() });
    if let Some(&dim) = target.iter().find(|&&d| d < -1) {
        return NegativeDimSnafu { dim }.fail();
    }

    let known = target
        .iter()
        .filter(|&&d| d >= 0)
        .try_fold(1usize, |acc, &d| acc.checked_mul(d as usize))
        .context(ShapeOverflowSnafu { dims: target.to_vec() })?;
    let fill = match input_count {
        Some(count) => {
            let fits = if inferred == 1 { known != 0 && count % known == 0 } else { known == count };
            ensure!(fits, ReshapeElementCountMismatchSnafu { input: count, target: target.to_vec() });
            if known == 0 { Dim::Fixed(0) } else { Dim::Fixed(count / known) }
        }
        None => Dim::Unknown,
    };

    Ok(target.iter().map(|&d| if d == -1 { fill } else { Dim::Fixed(d as usize) }).collect())
}

/// Elements selected along one axis by a slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceRange {
    pub start: i64,
    pub step: i64,
    pub len: usize,
}

impl SliceRange {
    pub fn indices(self) -> impl Iterator<Item = usize> {
        (0..self.len).map(move |i| (self.start + i as i64 * self.step) as usize)
    }
}

/// Clamp `begin..end` by `step` against an axis of size `dim`.
///
/// Negative bounds count from the end and out-of-range bounds are clamped, so
/// `i64::MAX` is a valid "to the end" marker.
///
/// ```rust
/// # use tensorfold_ir::shape::slice_range;
/// let range = slice_range(10, -3, i64::MAX, 1).unwrap();
/// assert_eq!(range.indices().collect::<Vec<_>>(), vec![7, 8, 9]);
/// let reversed = slice_range(4, -1, i64::MIN, -1).unwrap();
/// assert_eq!(reversed.indices().collect::<Vec<_>>(), vec![3, 2, 1, 0]);
/// ```
pub fn slice_range(dim: usize, begin: i64, end: i64, step: i64) -> Result<SliceRange, TypeError> {
    ensure!(step != 0, ZeroStepSnafu);
    let size = dim as i64;
    let wrap = |v: i64| if v < 0 { v.saturating_add(size) } else { v };

    // Lengths are computed in i128: `step` may be anywhere in the i64 range.
    let (start, len) = if step > 0 {
        let start = wrap(begin).clamp(0, size);
        let stop = wrap(end).clamp(0, size);
        let span = i128::from(stop) - i128::from(start);
        (start, if span > 0 { (span + i128::from(step) - 1) / i128::from(step) } else { 0 })
    } else if size == 0 {
        (0, 0)
    } else {
        let start = wrap(begin).clamp(0, size - 1);
        let stop = wrap(end).clamp(-1, size - 1);
        let span = i128::from(start) - i128::from(stop);
        (start, if span > 0 { (span - i128::from(step) - 1) / -i128::from(step) } else { 0 })
    };

    Ok(SliceRange { start, step, len: len as usize })
}

/// Element count of `Range(start, limit, delta)`: `max(ceil((limit - start) / delta), 0)`.
pub fn range_len(start: ConstValue, limit: ConstValue, delta: ConstValue) -> Result<usize, TypeError> {
    ensure!(!delta.is_zero(), ZeroStepSnafu);
    let len = match (start, limit, delta) {
        (ConstValue::Float(_), _, _) | (_, ConstValue::Float(_), _) | (_, _, ConstValue::Float(_)) => {
            ((limit.as_f64() - start.as_f64()) / delta.as_f64()).ceil().max(0.0) as usize
        }
        _ => {
            let (start, limit, delta) = (start.as_i64() as i128, limit.as_i64() as i128, delta.as_i64() as i128);
            let (span, step) = if delta > 0 { (limit - start, delta) } else { (start - limit, -delta) };
            (span + step - 1).div_euclid(step).max(0) as usize
        }
    };
    Ok(len)
}
