//! The tensor context: arena, tensor table and names.

use std::collections::HashMap;

use indexmap::IndexMap;
use tessera_arena::{Arena, ArenaConfig, Region};
use tessera_core::{BinaryOp, ContextId, DType, Shape, ShapeError, TensorId};

use crate::budget::{graph_overhead_custom, DEFAULT_GRAPH_SIZE, TENSOR_ALIGN, TENSOR_OVERHEAD};
use crate::error::GraphError;
use crate::graph::Graph;
use crate::tensor::{Op, Tensor};

/// Owns an arena and every tensor created in it.
///
/// Tensors are addressed by [`TensorId`] handles tagged with this
/// context's [`ContextId`]; a handle from another context is rejected
/// with [`GraphError::UnknownTensor`]. Dropping the context releases
/// all tensors and graph bookkeeping together.
pub struct Context {
    id: ContextId,
    arena: Arena,
    tensors: Vec<Tensor>,
    names: IndexMap<String, TensorId>,
    /// Reverse of `names`.
    labels: HashMap<TensorId, String>,
}

impl Context {
    /// Create a context with a fresh arena.
    pub fn new(config: ArenaConfig) -> Result<Self, GraphError> {
        let arena = Arena::new(&config)?;
        let id = ContextId::next();
        tracing::debug!(
            context = %id,
            capacity = config.capacity_bytes,
            no_alloc = config.no_alloc,
            "context created"
        );
        Ok(Self {
            id,
            arena,
            tensors: Vec::new(),
            names: IndexMap::new(),
            labels: HashMap::new(),
        })
    }

    /// This context's identity.
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Whether tensor data allocation is deferred to
    /// [`allocate_tensors`](Self::allocate_tensors).
    pub fn no_alloc(&self) -> bool {
        self.arena.no_alloc()
    }

    // ── tensors ─────────────────────────────────────────────────

    /// Create an input tensor with the given dimensions, outermost first.
    pub fn new_tensor(&mut self, dtype: DType, dims: &[usize]) -> Result<TensorId, GraphError> {
        let shape = Shape::new(dims)?;
        self.push_tensor(dtype, shape, None)
    }

    /// Create a rank-1 input tensor.
    pub fn new_tensor_1d(&mut self, dtype: DType, ne0: usize) -> Result<TensorId, GraphError> {
        self.new_tensor(dtype, &[ne0])
    }

    /// Create a rank-2 input tensor of `rows` x `cols`.
    pub fn new_tensor_2d(
        &mut self,
        dtype: DType,
        rows: usize,
        cols: usize,
    ) -> Result<TensorId, GraphError> {
        self.new_tensor(dtype, &[rows, cols])
    }

    /// Create a rank-3 input tensor.
    pub fn new_tensor_3d(
        &mut self,
        dtype: DType,
        d0: usize,
        d1: usize,
        d2: usize,
    ) -> Result<TensorId, GraphError> {
        self.new_tensor(dtype, &[d0, d1, d2])
    }

    /// Create a rank-4 input tensor.
    pub fn new_tensor_4d(
        &mut self,
        dtype: DType,
        d0: usize,
        d1: usize,
        d2: usize,
        d3: usize,
    ) -> Result<TensorId, GraphError> {
        self.new_tensor(dtype, &[d0, d1, d2, d3])
    }

    /// Record `kind(lhs, rhs)` and return the output tensor.
    ///
    /// Nothing is computed. The output has the broadcast shape of both
    /// operands and its data stays zeroed until a plan executes it.
    pub fn binary_op(
        &mut self,
        kind: BinaryOp,
        lhs: TensorId,
        rhs: TensorId,
    ) -> Result<TensorId, GraphError> {
        let l = self.tensor(lhs)?;
        let r = self.tensor(rhs)?;
        let shape = l.shape().broadcast(r.shape()).map_err(|e| match e {
            ShapeError::NotBroadcastable { .. } => GraphError::ShapeMismatch {
                lhs: l.shape().clone(),
                rhs: r.shape().clone(),
            },
            other => GraphError::InvalidShape(other),
        })?;
        let dtype = l.dtype();
        self.push_tensor(dtype, shape, Some(Op::binary(kind, lhs, rhs)))
    }

    /// Record `lhs + rhs`.
    pub fn add(&mut self, lhs: TensorId, rhs: TensorId) -> Result<TensorId, GraphError> {
        self.binary_op(BinaryOp::Add, lhs, rhs)
    }

    /// Record `lhs - rhs`.
    pub fn sub(&mut self, lhs: TensorId, rhs: TensorId) -> Result<TensorId, GraphError> {
        self.binary_op(BinaryOp::Sub, lhs, rhs)
    }

    /// Record `lhs * rhs`.
    pub fn mul(&mut self, lhs: TensorId, rhs: TensorId) -> Result<TensorId, GraphError> {
        self.binary_op(BinaryOp::Mul, lhs, rhs)
    }

    /// Record `lhs / rhs`.
    pub fn div(&mut self, lhs: TensorId, rhs: TensorId) -> Result<TensorId, GraphError> {
        self.binary_op(BinaryOp::Div, lhs, rhs)
    }

    fn push_tensor(
        &mut self,
        dtype: DType,
        shape: Shape,
        op: Option<Op>,
    ) -> Result<TensorId, GraphError> {
        let index = u32::try_from(self.tensors.len()).map_err(|_| GraphError::TensorLimit)?;
        let id = TensorId::new(self.id, index);
        let mut tensor = Tensor::new(id, dtype, shape, op)?;

        let _meta = self.arena.alloc(TENSOR_OVERHEAD, TENSOR_ALIGN)?;
        if !self.arena.no_alloc() {
            tensor.data = Some(self.arena.alloc(tensor.nbytes(), TENSOR_ALIGN)?);
        }

        tracing::trace!(
            tensor = %id,
            shape = %tensor.shape(),
            op = tensor.op().map(|op| op.kind().name()),
            "tensor created"
        );
        self.tensors.push(tensor);
        Ok(id)
    }

    /// Give a data region to every tensor that lacks one, in creation
    /// order. Returns the number of tensors allocated.
    ///
    /// If the arena runs out part way, tensors before the failing one
    /// keep their new regions.
    pub fn allocate_tensors(&mut self) -> Result<usize, GraphError> {
        let mut allocated = 0;
        for tensor in self.tensors.iter_mut().filter(|t| t.data.is_none()) {
            tensor.data = Some(self.arena.alloc(tensor.nbytes(), TENSOR_ALIGN)?);
            allocated += 1;
        }
        tracing::debug!(context = %self.id, allocated, "tensor data allocated");
        Ok(allocated)
    }

    /// Metadata for `id`.
    pub fn tensor(&self, id: TensorId) -> Result<&Tensor, GraphError> {
        if id.context() != self.id {
            return Err(GraphError::UnknownTensor { tensor: id });
        }
        self.tensors
            .get(id.index())
            .ok_or(GraphError::UnknownTensor { tensor: id })
    }

    /// All tensors, in creation order.
    pub fn tensors(&self) -> &[Tensor] {
        &self.tensors
    }

    /// Number of tensors created.
    pub fn tensor_count(&self) -> usize {
        self.tensors.len()
    }

    /// The data region of `id`, or [`GraphError::Unallocated`].
    pub fn region(&self, id: TensorId) -> Result<Region, GraphError> {
        self.tensor(id)?
            .data()
            .ok_or(GraphError::Unallocated { tensor: id })
    }

    // ── data ────────────────────────────────────────────────────

    /// Element data of `id`.
    pub fn data(&self, id: TensorId) -> Result<&[f32], GraphError> {
        let region = self.region(id)?;
        Ok(self.arena.slice(region))
    }

    /// Mutable element data of `id`.
    pub fn data_mut(&mut self, id: TensorId) -> Result<&mut [f32], GraphError> {
        let region = self.region(id)?;
        Ok(self.arena.slice_mut(region))
    }

    /// Copy `values` into `id`. The length must equal the element count.
    pub fn set_data(&mut self, id: TensorId, values: &[f32]) -> Result<(), GraphError> {
        let data = self.data_mut(id)?;
        if data.len() != values.len() {
            return Err(GraphError::DataLength {
                tensor: id,
                expected: data.len(),
                actual: values.len(),
            });
        }
        data.copy_from_slice(values);
        Ok(())
    }

    /// Set every element of `id` to `value`.
    pub fn fill(&mut self, id: TensorId, value: f32) -> Result<(), GraphError> {
        self.data_mut(id)?.fill(value);
        Ok(())
    }

    /// The whole arena buffer. Tensor regions index into it by word.
    pub fn words(&self) -> &[f32] {
        self.arena.words()
    }

    /// Mutable access to the whole arena buffer.
    pub fn words_mut(&mut self) -> &mut [f32] {
        self.arena.words_mut()
    }

    // ── names ───────────────────────────────────────────────────

    /// Attach a name to `id`, replacing any name it had.
    ///
    /// A name already held by another tensor moves to `id`.
    pub fn set_name(&mut self, id: TensorId, name: &str) -> Result<(), GraphError> {
        self.tensor(id)?;
        if let Some(old) = self.labels.remove(&id) {
            self.names.shift_remove(&old);
        }
        if let Some(previous) = self.names.insert(name.to_owned(), id) {
            self.labels.remove(&previous);
        }
        self.labels.insert(id, name.to_owned());
        Ok(())
    }

    /// The name of `id`, if it has one.
    pub fn name(&self, id: TensorId) -> Option<&str> {
        self.labels.get(&id).map(String::as_str)
    }

    /// Look a tensor up by name.
    pub fn find_tensor(&self, name: &str) -> Option<TensorId> {
        self.names.get(name).copied()
    }

    // ── graphs ──────────────────────────────────────────────────

    /// Create an empty graph of [`DEFAULT_GRAPH_SIZE`].
    pub fn new_graph(&mut self) -> Result<Graph, GraphError> {
        self.new_graph_custom(DEFAULT_GRAPH_SIZE)
    }

    /// Create an empty graph holding up to `size` nodes and `size` leafs.
    pub fn new_graph_custom(&mut self, size: usize) -> Result<Graph, GraphError> {
        let _bookkeeping = self.arena.alloc(graph_overhead_custom(size), TENSOR_ALIGN)?;
        Ok(Graph::with_capacity(self.id, size))
    }

    // ── arena ───────────────────────────────────────────────────

    /// Bytes used in the arena, including padding.
    pub fn used_bytes(&self) -> usize {
        self.arena.used_bytes()
    }

    /// Bytes still available in the arena.
    pub fn remaining_bytes(&self) -> usize {
        self.arena.remaining_bytes()
    }

    /// Arena capacity in bytes.
    pub fn capacity_bytes(&self) -> usize {
        self.arena.capacity_bytes()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id)
            .field("tensors", &self.tensors.len())
            .field("used_bytes", &self.arena.used_bytes())
            .field("capacity_bytes", &self.arena.capacity_bytes())
            .finish()
    }
}
