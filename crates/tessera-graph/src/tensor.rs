//! Tensor metadata and producing operations.

use smallvec::SmallVec;
use tessera_arena::Region;
use tessera_core::{BinaryOp, DType, Dims, Shape, ShapeError, TensorId};

/// The operation that produced a tensor, with its input handles.
///
/// Inputs always have smaller indices than the tensor the op belongs
/// to, because an op can only name tensors that already exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    /// `lhs + rhs`, broadcast.
    Add {
        /// Left operand.
        lhs: TensorId,
        /// Right operand.
        rhs: TensorId,
    },
    /// `lhs - rhs`, broadcast.
    Sub {
        /// Left operand.
        lhs: TensorId,
        /// Right operand.
        rhs: TensorId,
    },
    /// `lhs * rhs`, broadcast.
    Mul {
        /// Left operand.
        lhs: TensorId,
        /// Right operand.
        rhs: TensorId,
    },
    /// `lhs / rhs`, broadcast.
    Div {
        /// Left operand.
        lhs: TensorId,
        /// Right operand.
        rhs: TensorId,
    },
}

impl Op {
    /// Build the variant for `kind`.
    pub fn binary(kind: BinaryOp, lhs: TensorId, rhs: TensorId) -> Self {
        match kind {
            BinaryOp::Add => Self::Add { lhs, rhs },
            BinaryOp::Sub => Self::Sub { lhs, rhs },
            BinaryOp::Mul => Self::Mul { lhs, rhs },
            BinaryOp::Div => Self::Div { lhs, rhs },
        }
    }

    /// The arithmetic this op performs.
    pub fn kind(&self) -> BinaryOp {
        match self {
            Self::Add { .. } => BinaryOp::Add,
            Self::Sub { .. } => BinaryOp::Sub,
            Self::Mul { .. } => BinaryOp::Mul,
            Self::Div { .. } => BinaryOp::Div,
        }
    }

    /// Input handles, `[lhs, rhs]`.
    pub fn srcs(&self) -> [TensorId; 2] {
        match *self {
            Self::Add { lhs, rhs }
            | Self::Sub { lhs, rhs }
            | Self::Mul { lhs, rhs }
            | Self::Div { lhs, rhs } => [lhs, rhs],
        }
    }
}

/// Metadata for one tensor in a context.
///
/// Element data lives in the context's arena at [`data`](Self::data);
/// the tensor itself only records where.
#[derive(Clone, Debug)]
pub struct Tensor {
    id: TensorId,
    dtype: DType,
    shape: Shape,
    /// Byte strides, derived from the shape.
    strides: Dims,
    nbytes: usize,
    pub(crate) data: Option<Region>,
    op: Option<Op>,
}

impl Tensor {
    /// Fails if the data size overflows `usize`. Strides cannot overflow
    /// once that size fits.
    pub(crate) fn new(
        id: TensorId,
        dtype: DType,
        shape: Shape,
        op: Option<Op>,
    ) -> Result<Self, ShapeError> {
        let nbytes = shape.byte_size(dtype)?;
        let strides = shape.byte_strides(dtype);
        Ok(Self {
            id,
            dtype,
            shape,
            strides,
            nbytes,
            data: None,
            op,
        })
    }

    /// This tensor's handle.
    pub fn id(&self) -> TensorId {
        self.id
    }

    /// Element type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Dimension sizes.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Byte stride of each dimension.
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Number of elements.
    pub fn elem_count(&self) -> usize {
        self.shape.elem_count()
    }

    /// Size of the element data in bytes.
    pub fn nbytes(&self) -> usize {
        self.nbytes
    }

    /// Where the element data lives, if it has been allocated.
    pub fn data(&self) -> Option<Region> {
        self.data
    }

    /// The producing operation; `None` for inputs.
    pub fn op(&self) -> Option<&Op> {
        self.op.as_ref()
    }

    /// Whether this tensor is an input (no producing op).
    pub fn is_leaf(&self) -> bool {
        self.op.is_none()
    }

    /// Producer inputs, empty for leafs.
    pub fn srcs(&self) -> SmallVec<[TensorId; 2]> {
        self.op
            .as_ref()
            .map(|op| SmallVec::from_slice(&op.srcs()))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::ContextId;

    #[test]
    fn op_round_trips_kind_and_srcs() {
        let ctx = ContextId::next();
        let a = TensorId::new(ctx, 0);
        let b = TensorId::new(ctx, 1);
        for kind in BinaryOp::ALL {
            let op = Op::binary(kind, a, b);
            assert_eq!(op.kind(), kind);
            assert_eq!(op.srcs(), [a, b]);
        }
    }

    #[test]
    fn leaf_tensor_has_no_srcs() {
        let id = TensorId::new(ContextId::next(), 0);
        let t = Tensor::new(id, DType::F32, Shape::new(&[2, 3]).unwrap(), None).unwrap();
        assert!(t.is_leaf());
        assert!(t.srcs().is_empty());
        assert_eq!(t.elem_count(), 6);
        assert_eq!(t.nbytes(), 24);
        assert_eq!(t.strides(), &[12, 4]);
        assert!(t.data().is_none());
    }
}
