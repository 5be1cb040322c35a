//! Execution planning.
//!
//! [`ExecutionPlan::new`] walks a graph's nodes once and decides, for
//! each, how its output is partitioned across workers and how much
//! scratch the executor will need. Planning reads only tensor metadata;
//! no tensor data is allocated or touched, so planning the same graph
//! twice gives equal plans.

use std::error::Error;
use std::fmt;
use std::ops::Range;

use tessera_arena::WORD_SIZE;
use tessera_core::{ContextId, TensorId};
use tessera_graph::{Context, Graph, GraphError, Op};

// ── ChunkSplit ─────────────────────────────────────────────────────

/// Partition of a node's `elems` output elements into contiguous chunks.
///
/// There are `parts = min(n_threads, elems)` chunks of `elems / parts`
/// elements each; the last chunk also takes the remainder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkSplit {
    /// Output elements covered.
    pub elems: usize,
    /// Number of chunks, at least 1.
    pub parts: usize,
}

impl ChunkSplit {
    /// Split `elems` elements for `n_threads` workers.
    pub fn new(elems: usize, n_threads: usize) -> Self {
        Self {
            elems,
            parts: n_threads.min(elems).max(1),
        }
    }

    /// Length of every chunk except possibly the last.
    pub fn chunk_len(&self) -> usize {
        self.elems / self.parts
    }

    /// Element range of chunk `index`.
    pub fn range(&self, index: usize) -> Range<usize> {
        let len = self.chunk_len();
        let start = index * len;
        let end = if index + 1 == self.parts {
            self.elems
        } else {
            start + len
        };
        start..end
    }

    /// All chunk ranges, in order.
    pub fn ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.parts).map(|i| self.range(i))
    }
}

// ── PlanNode ───────────────────────────────────────────────────────

/// One graph node as the executor will run it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanNode {
    /// The output tensor.
    pub tensor: TensorId,
    /// The operation producing it.
    pub op: Op,
    /// How the output is divided among jobs.
    pub split: ChunkSplit,
    /// Scratch this node needs, in bytes; 0 unless an operand is
    /// broadcast.
    pub scratch_bytes: usize,
}

impl PlanNode {
    /// Whether the node stages broadcast operand rows in scratch.
    pub fn is_broadcast(&self) -> bool {
        self.scratch_bytes > 0
    }
}

// ── ExecutionPlan ──────────────────────────────────────────────────

/// Everything the executor needs to run a graph, computed up front.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionPlan {
    context: ContextId,
    nodes: Vec<PlanNode>,
    n_threads: usize,
    work_size: usize,
}

impl ExecutionPlan {
    /// Plan `graph` for `n_threads` workers.
    ///
    /// Each node gets `min(n_threads, elems)` chunks. A node whose
    /// operand shapes differ from its output shape reserves per-chunk
    /// scratch of two output rows, `parts * 2 * row_len * 4` bytes.
    /// Rows are only ever staged there when an operand is broadcast
    /// along the innermost axis: the row is then one element repeated,
    /// written out so the slice kernel can consume it. Operands that are
    /// contiguous along the row are read in place, so the reservation is
    /// an upper bound. [`work_size`](Self::work_size) is the largest
    /// single node requirement: nodes run one after another and reuse
    /// the same buffer.
    pub fn new(ctx: &Context, graph: &Graph, n_threads: usize) -> Result<Self, PlanError> {
        if n_threads == 0 {
            return Err(PlanError::InvalidThreadCount);
        }
        if graph.context() != ctx.id() {
            return Err(PlanError::ForeignGraph {
                graph: graph.context(),
                context: ctx.id(),
            });
        }
        if graph.n_nodes() == 0 {
            return Err(PlanError::EmptyGraph);
        }

        let mut nodes = Vec::with_capacity(graph.n_nodes());
        for &id in graph.nodes() {
            let tensor = ctx.tensor(id)?;
            let Some(&op) = tensor.op() else {
                // Graphs only place op tensors in `nodes`.
                continue;
            };
            let split = ChunkSplit::new(tensor.elem_count(), n_threads);
            let [lhs, rhs] = op.srcs();
            let broadcast =
                ctx.tensor(lhs)?.shape() != tensor.shape() || ctx.tensor(rhs)?.shape() != tensor.shape();
            let scratch_bytes = if broadcast {
                split.parts * 2 * tensor.shape().inner_len() * WORD_SIZE
            } else {
                0
            };
            tracing::trace!(
                tensor = %id,
                op = op.kind().name(),
                parts = split.parts,
                scratch_bytes,
                "node planned"
            );
            nodes.push(PlanNode {
                tensor: id,
                op,
                split,
                scratch_bytes,
            });
        }

        let work_size = nodes.iter().map(|n| n.scratch_bytes).max().unwrap_or(0);
        tracing::debug!(
            nodes = nodes.len(),
            n_threads,
            work_size,
            "execution plan built"
        );
        Ok(Self {
            context: ctx.id(),
            nodes,
            n_threads,
            work_size,
        })
    }

    /// Nodes in execution order.
    pub fn nodes(&self) -> &[PlanNode] {
        &self.nodes
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the plan has no nodes. Never true for a plan built by
    /// [`new`](Self::new).
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Scratch bytes the caller must lend to the executor.
    pub fn work_size(&self) -> usize {
        self.work_size
    }

    /// Worker count the plan was built for.
    pub fn n_threads(&self) -> usize {
        self.n_threads
    }

    /// The context whose graph was planned.
    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Total chunks across all nodes.
    pub fn total_chunks(&self) -> usize {
        self.nodes.iter().map(|n| n.split.parts).sum()
    }
}

// ── PlanError ──────────────────────────────────────────────────────

/// Errors from [`ExecutionPlan::new`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlanError {
    /// The graph has no op nodes.
    EmptyGraph,
    /// `n_threads` was 0.
    InvalidThreadCount,
    /// The graph was built for a different context.
    ForeignGraph {
        /// Context the graph belongs to.
        graph: ContextId,
        /// Context it was planned with.
        context: ContextId,
    },
    /// A graph node could not be resolved.
    Graph(GraphError),
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGraph => write!(f, "graph has no nodes to plan"),
            Self::InvalidThreadCount => write!(f, "thread count must be at least 1"),
            Self::ForeignGraph { graph, context } => {
                write!(f, "graph of context {graph} planned with context {context}")
            }
            Self::Graph(e) => write!(f, "graph: {e}"),
        }
    }
}

impl Error for PlanError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Graph(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GraphError> for PlanError {
    fn from(e: GraphError) -> Self {
        Self::Graph(e)
    }
}
