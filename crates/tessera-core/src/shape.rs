//! Tensor shapes and the broadcasting rule.
//!
//! Shapes are row-major: the last dimension is contiguous in memory.
//! Dimensions live in a [`SmallVec`] sized for [`MAX_DIMS`], so shapes
//! never touch the heap.

use std::fmt;

use smallvec::SmallVec;

use crate::dtype::DType;
use crate::error::ShapeError;

/// Maximum tensor rank.
pub const MAX_DIMS: usize = 4;

/// Inline storage for per-dimension values (sizes or strides).
pub type Dims = SmallVec<[usize; MAX_DIMS]>;

/// The dimension sizes of a tensor.
///
/// A rank-0 shape is a scalar with one element. Every dimension is at
/// least 1 and the total element count fits in `usize`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Shape(Dims);

impl Shape {
    /// Build a shape from dimension sizes, outermost first.
    pub fn new(dims: &[usize]) -> Result<Self, ShapeError> {
        if dims.len() > MAX_DIMS {
            return Err(ShapeError::RankExceeded { rank: dims.len() });
        }
        if let Some(axis) = dims.iter().position(|&d| d == 0) {
            return Err(ShapeError::ZeroDimension { axis });
        }
        checked_product(dims)?;
        Ok(Self(Dims::from_slice(dims)))
    }

    /// The rank-0 shape.
    pub fn scalar() -> Self {
        Self(Dims::new())
    }

    /// Dimension sizes, outermost first.
    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Total number of elements.
    pub fn elem_count(&self) -> usize {
        self.0.iter().product()
    }

    /// Size of the element data in bytes for elements of `dtype`.
    ///
    /// Fails with [`ShapeError::Overflow`] when the byte count does not
    /// fit in `usize`, even though the element count does.
    pub fn byte_size(&self, dtype: DType) -> Result<usize, ShapeError> {
        self.elem_count()
            .checked_mul(dtype.size())
            .ok_or(ShapeError::Overflow)
    }

    /// Length of the innermost (contiguous) dimension; 1 for scalars.
    pub fn inner_len(&self) -> usize {
        self.0.last().copied().unwrap_or(1)
    }

    /// Contiguous element strides: for `[2, 3, 4]` this is `[12, 4, 1]`.
    pub fn strides(&self) -> Dims {
        let mut strides: Dims = SmallVec::from_elem(0, self.rank());
        let mut acc = 1;
        for (stride, &dim) in strides.iter_mut().zip(self.0.iter()).rev() {
            *stride = acc;
            acc *= dim;
        }
        strides
    }

    /// Contiguous byte strides for elements of `dtype`.
    pub fn byte_strides(&self, dtype: DType) -> Dims {
        self.strides().iter().map(|s| s * dtype.size()).collect()
    }

    /// Broadcast two shapes together.
    ///
    /// Shapes are aligned on their trailing dimensions. Each aligned pair
    /// must be equal or contain a 1; missing leading dimensions count as
    /// 1. The result takes the larger size of each pair:
    ///
    /// - `[3, 4]` and `[4]` give `[3, 4]`
    /// - `[2, 1]` and `[1, 3]` give `[2, 3]`
    /// - `[3]` and `[4]` are rejected
    ///
    /// A result whose element count overflows `usize` is rejected with
    /// [`ShapeError::Overflow`].
    pub fn broadcast(&self, other: &Shape) -> Result<Shape, ShapeError> {
        let l = self.dims();
        let r = other.dims();
        let rank = l.len().max(r.len());
        let mut out: Dims = SmallVec::from_elem(1, rank);

        for i in 0..rank {
            let ld = if i < l.len() { l[l.len() - 1 - i] } else { 1 };
            let rd = if i < r.len() { r[r.len() - 1 - i] } else { 1 };
            out[rank - 1 - i] = match (ld, rd) {
                (a, b) if a == b => a,
                (1, b) => b,
                (a, 1) => a,
                _ => {
                    return Err(ShapeError::NotBroadcastable {
                        lhs: l.to_vec(),
                        rhs: r.to_vec(),
                    })
                }
            };
        }
        checked_product(&out)?;
        Ok(Shape(out))
    }

    /// Element strides that read this shape as if it had `target`'s shape.
    ///
    /// The result has `target.rank()` entries. Axes that this shape lacks
    /// (leading) or holds at size 1 while the target does not get stride
    /// 0, repeating the single element. `target` must be a broadcast of
    /// `self`.
    pub fn broadcast_strides(&self, target: &Shape) -> Dims {
        let own = self.strides();
        let offset = target.rank() - self.rank();
        let mut out: Dims = SmallVec::from_elem(0, target.rank());
        for (axis, slot) in out.iter_mut().enumerate().skip(offset) {
            let own_axis = axis - offset;
            if self.0[own_axis] == target.0[axis] {
                *slot = own[own_axis];
            }
        }
        out
    }
}

fn checked_product(dims: &[usize]) -> Result<usize, ShapeError> {
    dims.iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or(ShapeError::Overflow)
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}
