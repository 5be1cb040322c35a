//! Per-chunk compute kernels.
//!
//! A chunk is a contiguous range `[start, start + out.len())` of a
//! node's flat output. Operands whose shape equals the output shape are
//! read straight from the same range. Broadcast operands are gathered
//! one output row at a time into a scratch slot, then combined with the
//! contiguous kernel.

use tessera_core::{BinaryOp, Dims, Shape};

/// How a job reads one operand.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Operand<'a> {
    pub data: &'a [f32],
    /// Element strides against the output shape; 0 on broadcast axes.
    pub strides: &'a [usize],
}

/// Output layout shared by all chunks of a broadcast node.
#[derive(Clone, Debug)]
pub(crate) struct BroadcastLayout {
    /// Output dims, outermost first.
    pub dims: Dims,
    /// Operand strides against `dims`.
    pub lhs_strides: Dims,
    pub rhs_strides: Dims,
}

impl BroadcastLayout {
    pub(crate) fn new(out: &Shape, lhs: &Shape, rhs: &Shape) -> Self {
        Self {
            dims: Dims::from_slice(out.dims()),
            lhs_strides: lhs.broadcast_strides(out),
            rhs_strides: rhs.broadcast_strides(out),
        }
    }

    /// Length of one output row.
    pub(crate) fn row_len(&self) -> usize {
        self.dims.last().copied().unwrap_or(1)
    }
}

/// `out[i] = lhs[start + i] op rhs[start + i]` for same-shape operands.
pub(crate) fn contiguous(kind: BinaryOp, lhs: &[f32], rhs: &[f32], start: usize, out: &mut [f32]) {
    let end = start + out.len();
    kind.apply_slices(&lhs[start..end], &rhs[start..end], out);
}

/// Broadcast kernel over output elements `start..start + out.len()`.
///
/// `scratch` must hold at least two output rows.
pub(crate) fn broadcast(
    kind: BinaryOp,
    layout: &BroadcastLayout,
    lhs: Operand<'_>,
    rhs: Operand<'_>,
    start: usize,
    out: &mut [f32],
    scratch: &mut [f32],
) {
    let row_len = layout.row_len();
    let (lhs_row, rest) = scratch.split_at_mut(row_len);
    let rhs_row = &mut rest[..row_len];

    let mut done = 0;
    while done < out.len() {
        let idx = start + done;
        let row = idx / row_len;
        let col = idx % row_len;
        let seg = (row_len - col).min(out.len() - done);

        let l = gather(&layout.dims, lhs, row, col, &mut lhs_row[..seg]);
        let r = gather(&layout.dims, rhs, row, col, &mut rhs_row[..seg]);
        kind.apply_slices(l, r, &mut out[done..done + seg]);
        done += seg;
    }
}

/// Read `buf.len()` elements of output row `row`, from column `col`, as
/// seen through `operand`.
///
/// The inner stride is 1 (contiguous row) or 0 (broadcast along the
/// row). A contiguous row is returned as a slice of the operand itself;
/// a broadcast row is the single element at `base` repeated into `buf`.
fn gather<'a>(
    dims: &[usize],
    operand: Operand<'a>,
    row: usize,
    col: usize,
    buf: &'a mut [f32],
) -> &'a [f32] {
    let rank = dims.len();
    let inner_stride = if rank == 0 { 0 } else { operand.strides[rank - 1] };
    let base = row_offset(dims, operand.strides, row) + col * inner_stride;

    if inner_stride == 1 {
        &operand.data[base..base + buf.len()]
    } else {
        buf.fill(operand.data[base]);
        buf
    }
}

/// Offset of the first element of output row `row`, through `strides`.
fn row_offset(dims: &[usize], strides: &[usize], mut row: usize) -> usize {
    let outer = dims.len().saturating_sub(1);
    let mut offset = 0;
    for axis in (0..outer).rev() {
        offset += (row % dims[axis]) * strides[axis];
        row /= dims[axis];
    }
    offset
}
