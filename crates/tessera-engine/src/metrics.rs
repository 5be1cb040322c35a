//! Per-run execution metrics.
//!
//! [`ExecMetrics`] is returned by every successful
//! [`execute`](crate::execute) call.

use tessera_core::{BinaryOp, TensorId};

/// Timing for one plan node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeTiming {
    /// The node's output tensor.
    pub tensor: TensorId,
    /// The operation it ran.
    pub op: BinaryOp,
    /// Jobs dispatched for it.
    pub chunks: usize,
    /// Wall-clock time from first dispatch to last completion, in
    /// microseconds.
    pub us: u64,
}

/// Timing and dispatch counts for one execution of a plan.
///
/// All durations are in microseconds.
#[derive(Clone, Debug, Default)]
pub struct ExecMetrics {
    /// Wall-clock time for the whole run, including validation.
    pub total_us: u64,
    /// Per-node timings, in execution order.
    pub node_us: Vec<NodeTiming>,
    /// Jobs dispatched across all nodes.
    pub chunks_dispatched: usize,
    /// Worker count of the pool that ran the plan.
    pub n_threads: usize,
}

impl ExecMetrics {
    /// Sum of per-node times.
    pub fn compute_us(&self) -> u64 {
        self.node_us.iter().map(|n| n.us).sum()
    }
}
