//! Plan execution.
//!
//! [`execute`] runs an [`ExecutionPlan`] against its context. All
//! preconditions are checked before the first write, so a failed call
//! leaves every tensor as it was. Nodes then run strictly in plan
//! order; within a node, each chunk is one pool job holding a disjoint
//! `&mut` slice of the output and shared views of the operands.

use std::error::Error;
use std::fmt;
use std::ops::Range;
use std::time::Instant;

use tessera_arena::WorkBuffer;
use tessera_core::{ContextId, TensorId};
use tessera_graph::{Context, GraphError};

use crate::kernel::{self, BroadcastLayout, Operand};
use crate::metrics::{ExecMetrics, NodeTiming};
use crate::plan::{ExecutionPlan, PlanNode};
use crate::pool::ThreadPool;

// ── ExecError ──────────────────────────────────────────────────────

/// Errors from [`execute`]. All are detected before any tensor data is
/// written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecError {
    /// The plan needs more scratch than was provided.
    ScratchTooSmall {
        /// The plan's `work_size`, in bytes.
        required: usize,
        /// Size of the supplied buffer (0 if none), in bytes.
        provided: usize,
    },
    /// A node or operand has no data region.
    Unallocated {
        /// The tensor without storage.
        tensor: TensorId,
    },
    /// The plan was built for a different context.
    ForeignPlan {
        /// Context the plan belongs to.
        plan: ContextId,
        /// Context it was executed against.
        context: ContextId,
    },
    /// A plan node could not be resolved.
    Graph(GraphError),
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScratchTooSmall { required, provided } => {
                write!(f, "scratch too small: need {required} bytes, have {provided}")
            }
            Self::Unallocated { tensor } => write!(f, "tensor {tensor} has no data"),
            Self::ForeignPlan { plan, context } => {
                write!(f, "plan for context {plan} executed against context {context}")
            }
            Self::Graph(e) => write!(f, "graph: {e}"),
        }
    }
}

impl Error for ExecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Graph(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GraphError> for ExecError {
    fn from(e: GraphError) -> Self {
        match e {
            GraphError::Unallocated { tensor } => Self::Unallocated { tensor },
            other => Self::Graph(other),
        }
    }
}

// ── execute ────────────────────────────────────────────────────────

/// A plan node with its storage resolved.
struct NodeRun<'p> {
    node: &'p PlanNode,
    out: Range<usize>,
    lhs: Range<usize>,
    rhs: Range<usize>,
    /// `Some` for nodes that read broadcast operands through scratch.
    layout: Option<BroadcastLayout>,
}

/// Run `plan` on `ctx` using `pool`'s workers.
///
/// `work` must hold at least [`ExecutionPlan::work_size`] bytes when
/// that is non-zero; it may be `None` otherwise. Results are written to
/// the node tensors' data and can be read with [`Context::data`].
///
/// Element results follow IEEE-754: `x / 0.0` gives an infinity or
/// NaN and never fails the run.
pub fn execute(
    ctx: &mut Context,
    plan: &ExecutionPlan,
    pool: &ThreadPool,
    work: Option<&mut WorkBuffer>,
) -> Result<ExecMetrics, ExecError> {
    let run_start = Instant::now();

    if plan.context() != ctx.id() {
        return Err(ExecError::ForeignPlan {
            plan: plan.context(),
            context: ctx.id(),
        });
    }
    let required = plan.work_size();
    let provided = work.as_ref().map_or(0, |w| w.size_bytes());
    if required > provided {
        return Err(ExecError::ScratchTooSmall { required, provided });
    }
    let runs = resolve(ctx, plan)?;

    let words = ctx.words_mut();
    let scratch: &mut [f32] = match work {
        Some(buffer) => buffer.words_mut(),
        None => &mut [],
    };

    let mut metrics = ExecMetrics {
        n_threads: pool.n_threads(),
        node_us: Vec::with_capacity(runs.len()),
        ..Default::default()
    };

    for run in &runs {
        let node_start = Instant::now();
        let kind = run.node.op.kind();

        let (before, rest) = words.split_at_mut(run.out.start);
        let (out, after) = rest.split_at_mut(run.out.len());
        let (before, after): (&[f32], &[f32]) = (before, after);
        let lhs = operand_words(before, after, &run.out, &run.lhs);
        let rhs = operand_words(before, after, &run.out, &run.rhs);
        let chunks = split_chunks(out, run);
        let parts = chunks.len();

        match &run.layout {
            None => pool.scope(|s| {
                for (start, chunk) in chunks {
                    s.spawn(move || kernel::contiguous(kind, lhs, rhs, start, chunk));
                }
            }),
            Some(layout) => {
                let slots = scratch.chunks_mut(2 * layout.row_len());
                pool.scope(|s| {
                    for ((start, chunk), slot) in chunks.into_iter().zip(slots) {
                        let lhs = Operand {
                            data: lhs,
                            strides: &layout.lhs_strides,
                        };
                        let rhs = Operand {
                            data: rhs,
                            strides: &layout.rhs_strides,
                        };
                        s.spawn(move || kernel::broadcast(kind, layout, lhs, rhs, start, chunk, slot));
                    }
                });
            }
        }

        let us = node_start.elapsed().as_micros() as u64;
        tracing::trace!(tensor = %run.node.tensor, op = kind.name(), parts, us, "node executed");
        metrics.chunks_dispatched += parts;
        metrics.node_us.push(NodeTiming {
            tensor: run.node.tensor,
            op: kind,
            chunks: parts,
            us,
        });
    }

    metrics.total_us = run_start.elapsed().as_micros() as u64;
    tracing::debug!(
        nodes = runs.len(),
        chunks = metrics.chunks_dispatched,
        n_threads = metrics.n_threads,
        total_us = metrics.total_us,
        "plan executed"
    );
    Ok(metrics)
}

/// Look up every node's and operand's storage. Fails on the first
/// missing region.
fn resolve<'p>(ctx: &Context, plan: &'p ExecutionPlan) -> Result<Vec<NodeRun<'p>>, ExecError> {
    let mut runs = Vec::with_capacity(plan.len());
    for node in plan.nodes() {
        let [lhs, rhs] = node.op.srcs();
        let out = ctx.region(node.tensor)?.word_range();
        let lhs_range = ctx.region(lhs)?.word_range();
        let rhs_range = ctx.region(rhs)?.word_range();

        let layout = if node.is_broadcast() {
            Some(BroadcastLayout::new(
                ctx.tensor(node.tensor)?.shape(),
                ctx.tensor(lhs)?.shape(),
                ctx.tensor(rhs)?.shape(),
            ))
        } else {
            None
        };
        runs.push(NodeRun {
            node,
            out,
            lhs: lhs_range,
            rhs: rhs_range,
            layout,
        });
    }
    Ok(runs)
}

/// The operand's words, taken from whichever side of the output region
/// holds them. Arena regions never overlap, so an operand lies wholly
/// before or wholly after the output.
fn operand_words<'a>(
    before: &'a [f32],
    after: &'a [f32],
    out: &Range<usize>,
    operand: &Range<usize>,
) -> &'a [f32] {
    if operand.end <= out.start {
        &before[operand.clone()]
    } else {
        &after[operand.start - out.end..operand.end - out.end]
    }
}

/// Cut the output slice into the node's chunks, tagged with their
/// starting element.
fn split_chunks<'a>(out: &'a mut [f32], run: &NodeRun<'_>) -> Vec<(usize, &'a mut [f32])> {
    let mut chunks = Vec::with_capacity(run.node.split.parts);
    let mut rest = out;
    for range in run.node.split.ranges() {
        let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(range.len());
        chunks.push((range.start, chunk));
        rest = tail;
    }
    chunks
}
