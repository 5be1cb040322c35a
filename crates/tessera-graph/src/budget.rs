//! Arena sizing.
//!
//! A context's arena is sized once, up front. These constants and the
//! [`MemoryBudget`] builder add up what a workload will charge to it:
//! per-tensor metadata, tensor data, graph bookkeeping and some slack.

use std::mem::size_of;

use tessera_arena::ArenaConfig;
use tessera_core::{DType, TensorId};

use crate::graph::Graph;
use crate::tensor::Tensor;

/// Alignment of every tensor and graph allocation, in bytes.
pub const TENSOR_ALIGN: usize = 16;

/// Bytes charged to the arena for one tensor's metadata.
pub const TENSOR_OVERHEAD: usize = size_of::<Tensor>().next_multiple_of(TENSOR_ALIGN);

/// Node capacity of a graph created by `Context::new_graph`.
pub const DEFAULT_GRAPH_SIZE: usize = 2048;

/// Bytes charged to the arena for a graph of [`DEFAULT_GRAPH_SIZE`].
pub fn graph_overhead() -> usize {
    graph_overhead_custom(DEFAULT_GRAPH_SIZE)
}

/// Bytes charged to the arena for a graph holding up to `size` nodes
/// and `size` leafs.
///
/// Covers the graph header, both order lists and a visited set sized
/// at twice the node capacity.
///
/// Saturates at `usize::MAX`, which no arena can satisfy.
pub fn graph_overhead_custom(size: usize) -> usize {
    let slots = size.saturating_mul(2);
    let lists = slots.saturating_mul(size_of::<TensorId>());
    let visited = slots.saturating_mul(size_of::<TensorId>() + size_of::<u64>());
    aligned(size_of::<Graph>().saturating_add(lists).saturating_add(visited))
}

/// Round up to [`TENSOR_ALIGN`], saturating.
fn aligned(bytes: usize) -> usize {
    bytes
        .checked_next_multiple_of(TENSOR_ALIGN)
        .unwrap_or(usize::MAX)
}

/// Accumulates the arena capacity a workload needs.
///
/// Totals saturate at `usize::MAX` instead of wrapping, so an
/// oversized budget fails when the arena is created.
///
/// ```
/// use tessera_core::DType;
/// use tessera_graph::MemoryBudget;
///
/// // Two inputs, two op outputs of 2048 floats each, one graph.
/// let config = MemoryBudget::new()
///     .tensors(4, DType::F32, 2048)
///     .graph()
///     .slack(1024)
///     .config();
/// assert!(config.capacity_bytes > 4 * 2048 * 4);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryBudget {
    bytes: usize,
}

impl MemoryBudget {
    /// An empty budget.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one tensor of `elem_count` elements: metadata plus data.
    pub fn tensor(self, dtype: DType, elem_count: usize) -> Self {
        self.tensors(1, dtype, elem_count)
    }

    /// Add `count` tensors of `elem_count` elements each.
    pub fn tensors(self, count: usize, dtype: DType, elem_count: usize) -> Self {
        let data = aligned(elem_count.saturating_mul(dtype.size()));
        self.bytes(count.saturating_mul(TENSOR_OVERHEAD.saturating_add(data)))
    }

    /// Add metadata only, for tensors of a `no_alloc` context.
    pub fn tensor_metadata(self, count: usize) -> Self {
        self.bytes(count.saturating_mul(TENSOR_OVERHEAD))
    }

    /// Add a graph of [`DEFAULT_GRAPH_SIZE`].
    pub fn graph(self) -> Self {
        self.bytes(graph_overhead())
    }

    /// Add a graph of `size` nodes.
    pub fn graph_custom(self, size: usize) -> Self {
        self.bytes(graph_overhead_custom(size))
    }

    /// Add headroom for alignment padding or later additions.
    pub fn slack(self, bytes: usize) -> Self {
        self.bytes(bytes)
    }

    fn bytes(self, bytes: usize) -> Self {
        Self {
            bytes: self.bytes.saturating_add(bytes),
        }
    }

    /// Total bytes accumulated so far.
    pub fn total_bytes(&self) -> usize {
        self.bytes
    }

    /// An eager-allocation arena config with the accumulated capacity.
    pub fn config(&self) -> ArenaConfig {
        ArenaConfig::new(self.bytes)
    }
}
