//! Errors from tensor and graph construction.

use std::error::Error;
use std::fmt;

use tessera_arena::ArenaError;
use tessera_core::{ContextId, Shape, ShapeError, TensorId};

/// Errors reported while building tensors and graphs.
///
/// Every error is returned by the call that caused it. Tensors and
/// graphs built by earlier, successful calls are unaffected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphError {
    /// The arena could not satisfy an allocation.
    Arena(ArenaError),
    /// Dimension sizes were rejected.
    InvalidShape(ShapeError),
    /// The operands of a binary op are not broadcast-compatible.
    ShapeMismatch {
        /// Shape of the left operand.
        lhs: Shape,
        /// Shape of the right operand.
        rhs: Shape,
    },
    /// The handle does not name a tensor of this context.
    UnknownTensor {
        /// The rejected handle.
        tensor: TensorId,
    },
    /// The tensor has no data region yet (`no_alloc` context).
    Unallocated {
        /// The tensor without storage.
        tensor: TensorId,
    },
    /// Supplied data does not match the tensor's element count.
    DataLength {
        /// The target tensor.
        tensor: TensorId,
        /// Element count of the tensor.
        expected: usize,
        /// Length of the supplied data.
        actual: usize,
    },
    /// Traversal reached a tensor that is still being visited.
    CycleDetected {
        /// A tensor on the cycle.
        tensor: TensorId,
    },
    /// The graph's node or leaf list is full.
    GraphFull {
        /// The graph's size.
        capacity: usize,
    },
    /// The graph was created by a different context.
    ForeignGraph {
        /// Context the graph belongs to.
        graph: ContextId,
        /// Context it was used with.
        context: ContextId,
    },
    /// The context already holds `u32::MAX` tensors.
    TensorLimit,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arena(e) => write!(f, "arena: {e}"),
            Self::InvalidShape(e) => write!(f, "invalid shape: {e}"),
            Self::ShapeMismatch { lhs, rhs } => {
                write!(f, "shape mismatch: {lhs} and {rhs} are not broadcast-compatible")
            }
            Self::UnknownTensor { tensor } => write!(f, "unknown tensor {tensor}"),
            Self::Unallocated { tensor } => write!(f, "tensor {tensor} has no data"),
            Self::DataLength {
                tensor,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "tensor {tensor} holds {expected} elements, got {actual}"
                )
            }
            Self::CycleDetected { tensor } => {
                write!(f, "cycle detected at tensor {tensor}")
            }
            Self::GraphFull { capacity } => write!(f, "graph is full ({capacity} entries)"),
            Self::ForeignGraph { graph, context } => {
                write!(f, "graph of context {graph} used with context {context}")
            }
            Self::TensorLimit => write!(f, "tensor count exceeds u32::MAX"),
        }
    }
}

impl Error for GraphError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Arena(e) => Some(e),
            Self::InvalidShape(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArenaError> for GraphError {
    fn from(e: ArenaError) -> Self {
        Self::Arena(e)
    }
}

impl From<ShapeError> for GraphError {
    fn from(e: ShapeError) -> Self {
        Self::InvalidShape(e)
    }
}
