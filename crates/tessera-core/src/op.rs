//! Elementwise operation kinds.

use std::fmt;

/// An elementwise binary arithmetic operation over `f32`.
///
/// Evaluation follows IEEE-754 semantics: division by zero yields an
/// infinity or NaN rather than an error, so no element can abort a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `lhs + rhs`
    Add,
    /// `lhs - rhs`
    Sub,
    /// `lhs * rhs`
    Mul,
    /// `lhs / rhs`
    Div,
}

impl BinaryOp {
    /// Every supported kind, in declaration order.
    pub const ALL: [BinaryOp; 4] = [Self::Add, Self::Sub, Self::Mul, Self::Div];

    /// Apply the operation to one pair of elements.
    #[inline]
    pub fn apply(self, lhs: f32, rhs: f32) -> f32 {
        match self {
            Self::Add => lhs + rhs,
            Self::Sub => lhs - rhs,
            Self::Mul => lhs * rhs,
            Self::Div => lhs / rhs,
        }
    }

    /// Apply the operation pairwise: `out[i] = lhs[i] op rhs[i]`.
    ///
    /// All three slices must have the same length.
    #[inline]
    pub fn apply_slices(self, lhs: &[f32], rhs: &[f32], out: &mut [f32]) {
        debug_assert_eq!(lhs.len(), out.len());
        debug_assert_eq!(rhs.len(), out.len());
        // One loop per kind keeps the inner loop branch-free.
        match self {
            Self::Add => zip_into(lhs, rhs, out, |a, b| a + b),
            Self::Sub => zip_into(lhs, rhs, out, |a, b| a - b),
            Self::Mul => zip_into(lhs, rhs, out, |a, b| a * b),
            Self::Div => zip_into(lhs, rhs, out, |a, b| a / b),
        }
    }

    /// Lowercase name, e.g. `"add"`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
        }
    }

    /// Infix symbol, e.g. `"+"`.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }
}

#[inline]
fn zip_into(lhs: &[f32], rhs: &[f32], out: &mut [f32], f: impl Fn(f32, f32) -> f32) {
    for ((o, &a), &b) in out.iter_mut().zip(lhs).zip(rhs) {
        *o = f(a, b);
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
