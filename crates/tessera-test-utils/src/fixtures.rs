//! Ready-made contexts and graphs.
//!
//! - [`AddMul`]: `out = (a + b) * (a + b)` over 1-D tensors.
//! - [`BroadcastChain`]: a matrix combined with a row and a column
//!   through all four ops.

use tessera_core::{DType, TensorId};
use tessera_graph::{Context, Graph, GraphError, MemoryBudget};

/// `sum = a + b; out = sum * sum`, with `a` and `b` filled.
pub struct AddMul {
    pub ctx: Context,
    pub graph: Graph,
    pub a: TensorId,
    pub b: TensorId,
    pub sum: TensorId,
    pub out: TensorId,
}

impl AddMul {
    /// Arena budget for `len`-element tensors: four tensors and one
    /// default-size graph.
    pub fn budget(len: usize) -> MemoryBudget {
        MemoryBudget::new()
            .tensors(4, DType::F32, len)
            .graph()
            .slack(1024)
    }

    /// Build with `a = a_values`, `b = b_values`.
    ///
    /// Panics if the two slices differ in length.
    pub fn new(a_values: &[f32], b_values: &[f32]) -> Result<Self, GraphError> {
        assert_eq!(a_values.len(), b_values.len(), "operand lengths differ");
        let len = a_values.len();
        let mut ctx = Context::new(Self::budget(len).config())?;
        let a = ctx.new_tensor_1d(DType::F32, len)?;
        let b = ctx.new_tensor_1d(DType::F32, len)?;
        ctx.set_data(a, a_values)?;
        ctx.set_data(b, b_values)?;
        let sum = ctx.add(a, b)?;
        let out = ctx.mul(sum, sum)?;
        let mut graph = ctx.new_graph()?;
        graph.build_forward_expand(&ctx, out)?;
        Ok(Self {
            ctx,
            graph,
            a,
            b,
            sum,
            out,
        })
    }

    /// `(a[i] + b[i])^2`, computed directly.
    pub fn expected(a_values: &[f32], b_values: &[f32]) -> Vec<f32> {
        a_values
            .iter()
            .zip(b_values)
            .map(|(a, b)| (a + b) * (a + b))
            .collect()
    }
}

/// `x = m + row; y = x * col; z = y - m; q = z / row` where `m` is
/// `rows x cols`, `row` is `[cols]` and `col` is `[rows, 1]`.
///
/// Three of the four nodes broadcast, so plans need scratch.
pub struct BroadcastChain {
    pub ctx: Context,
    pub graph: Graph,
    pub m: TensorId,
    pub row: TensorId,
    pub col: TensorId,
    pub q: TensorId,
}

impl BroadcastChain {
    pub fn new(rows: usize, cols: usize) -> Result<Self, GraphError> {
        let budget = MemoryBudget::new()
            .tensors(7, DType::F32, rows * cols)
            .graph()
            .slack(1024);
        let mut ctx = Context::new(budget.config())?;
        let m = ctx.new_tensor_2d(DType::F32, rows, cols)?;
        let row = ctx.new_tensor_1d(DType::F32, cols)?;
        let col = ctx.new_tensor_2d(DType::F32, rows, 1)?;
        ctx.set_data(m, &crate::sequence(1.0, rows * cols))?;
        ctx.set_data(row, &crate::sequence(0.5, cols))?;
        ctx.set_data(col, &crate::sequence(-2.0, rows))?;

        let x = ctx.add(m, row)?;
        let y = ctx.mul(x, col)?;
        let z = ctx.sub(y, m)?;
        let q = ctx.div(z, row)?;
        let mut graph = ctx.new_graph()?;
        graph.build_forward_expand(&ctx, q)?;
        Ok(Self {
            ctx,
            graph,
            m,
            row,
            col,
            q,
        })
    }
}
