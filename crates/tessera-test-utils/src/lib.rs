//! Reference arithmetic and graph fixtures for Tessera tests.
//!
//! [`reference_binary`] computes broadcast elementwise results one
//! element at a time from coordinates, independently of the engine's
//! chunked kernels, so tests can compare the two. The [`fixtures`]
//! module builds ready-to-plan contexts and graphs.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use tessera_core::{BinaryOp, Shape};

/// `start, start + 1, ..` as `f32`, `len` values.
pub fn sequence(start: f32, len: usize) -> Vec<f32> {
    (0..len).map(|i| start + i as f32).collect()
}

/// Row-major coordinates of flat index `idx` in `dims`.
pub fn unravel(dims: &[usize], mut idx: usize) -> Vec<usize> {
    let mut coords = vec![0; dims.len()];
    for axis in (0..dims.len()).rev() {
        coords[axis] = idx % dims[axis];
        idx /= dims[axis];
    }
    coords
}

/// Flat index of output coordinates `coords` within a broadcast
/// operand of shape `dims`, right-aligned.
fn operand_index(dims: &[usize], coords: &[usize]) -> usize {
    let offset = coords.len() - dims.len();
    let mut idx = 0;
    for (axis, &dim) in dims.iter().enumerate() {
        let c = if dim == 1 { 0 } else { coords[offset + axis] };
        idx = idx * dim + c;
    }
    idx
}

/// Elementwise `lhs kind rhs` with numpy broadcasting, computed
/// element by element.
///
/// Panics if the shapes do not broadcast.
pub fn reference_binary(
    kind: BinaryOp,
    lhs: &[f32],
    lhs_shape: &Shape,
    rhs: &[f32],
    rhs_shape: &Shape,
) -> (Shape, Vec<f32>) {
    let out_shape = lhs_shape
        .broadcast(rhs_shape)
        .expect("reference operands must broadcast");
    let out = (0..out_shape.elem_count())
        .map(|i| {
            let coords = unravel(out_shape.dims(), i);
            let l = lhs[operand_index(lhs_shape.dims(), &coords)];
            let r = rhs[operand_index(rhs_shape.dims(), &coords)];
            kind.apply(l, r)
        })
        .collect();
    (out_shape, out)
}

/// Compare two result buffers bit for bit, treating all NaNs as equal.
pub fn bit_identical(a: &[f32], b: &[f32]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(x, y)| x.to_bits() == y.to_bits() || (x.is_nan() && y.is_nan()))
}
