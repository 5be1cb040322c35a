//! Benchmark workloads for the Tessera tensor engine.
//!
//! - [`chain_profile`]: a long same-shape elementwise chain (no scratch)
//! - [`broadcast_profile`]: a matrix/row/column mix that stages operand
//!   rows through scratch

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use tessera_core::{BinaryOp, DType, TensorId};
use tessera_graph::{Context, Graph, GraphError, MemoryBudget};

/// A built context and graph, ready to plan.
pub struct Workload {
    /// Context owning every tensor.
    pub ctx: Context,
    /// Graph over all op nodes.
    pub graph: Graph,
    /// The final tensor.
    pub out: TensorId,
}

/// `depth` ops cycling through add, mul, sub and div over two
/// `len`-element inputs.
pub fn chain_profile(len: usize, depth: usize) -> Result<Workload, GraphError> {
    let budget = MemoryBudget::new()
        .tensors(depth + 2, DType::F32, len)
        .graph()
        .slack(4096);
    let mut ctx = Context::new(budget.config())?;
    let a = ctx.new_tensor_1d(DType::F32, len)?;
    let b = ctx.new_tensor_1d(DType::F32, len)?;
    ctx.fill(a, 1.5)?;
    ctx.fill(b, 0.75)?;

    let mut acc = a;
    for (step, kind) in BinaryOp::ALL.iter().cycle().take(depth).enumerate() {
        let rhs = if step % 2 == 0 { b } else { a };
        acc = ctx.binary_op(*kind, acc, rhs)?;
    }
    let mut graph = ctx.new_graph()?;
    graph.build_forward_expand(&ctx, acc)?;
    Ok(Workload {
        ctx,
        graph,
        out: acc,
    })
}

/// `((m + row) * col) - m` over a `rows x cols` matrix.
pub fn broadcast_profile(rows: usize, cols: usize) -> Result<Workload, GraphError> {
    let budget = MemoryBudget::new()
        .tensors(6, DType::F32, rows * cols)
        .graph()
        .slack(4096);
    let mut ctx = Context::new(budget.config())?;
    let m = ctx.new_tensor_2d(DType::F32, rows, cols)?;
    let row = ctx.new_tensor_1d(DType::F32, cols)?;
    let col = ctx.new_tensor_2d(DType::F32, rows, 1)?;
    ctx.fill(m, 2.0)?;
    ctx.fill(row, 0.5)?;
    ctx.fill(col, 3.0)?;

    let x = ctx.add(m, row)?;
    let y = ctx.mul(x, col)?;
    let out = ctx.sub(y, m)?;
    let mut graph = ctx.new_graph()?;
    graph.build_forward_expand(&ctx, out)?;
    Ok(Workload { ctx, graph, out })
}
