//! Element types.

use std::fmt;

/// Element type of a tensor.
///
/// Only 32-bit floats are supported; the enum exists so that tensor
/// metadata carries its type explicitly and sizing code never assumes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DType {
    /// IEEE-754 single precision.
    F32,
}

impl DType {
    /// Size of one element in bytes.
    pub fn size(&self) -> usize {
        match self {
            Self::F32 => std::mem::size_of::<f32>(),
        }
    }

    /// Short lowercase name, e.g. `"f32"`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::F32 => "f32",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
