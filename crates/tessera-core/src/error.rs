//! Shape validation errors.

use std::error::Error;
use std::fmt;

use crate::shape::MAX_DIMS;

/// Errors raised while constructing or combining shapes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShapeError {
    /// More dimensions than [`MAX_DIMS`].
    RankExceeded {
        /// The rejected rank.
        rank: usize,
    },
    /// A dimension of size zero.
    ZeroDimension {
        /// Index of the offending axis.
        axis: usize,
    },
    /// The element count or byte size does not fit in `usize`.
    Overflow,
    /// Two shapes are not broadcast-compatible.
    NotBroadcastable {
        /// Left-hand dimensions.
        lhs: Vec<usize>,
        /// Right-hand dimensions.
        rhs: Vec<usize>,
    },
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RankExceeded { rank } => {
                write!(f, "rank {rank} exceeds maximum of {MAX_DIMS}")
            }
            Self::ZeroDimension { axis } => write!(f, "axis {axis} has size zero"),
            Self::Overflow => write!(f, "tensor size overflows usize"),
            Self::NotBroadcastable { lhs, rhs } => {
                write!(f, "shapes {lhs:?} and {rhs:?} are not broadcast-compatible")
            }
        }
    }
}

impl Error for ShapeError {}
