//! Strongly-typed identifiers for contexts and tensors.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique [`ContextId`] allocation.
static CONTEXT_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique per-instance identifier for a tensor context.
///
/// Allocated from a monotonic atomic counter via [`ContextId::next`].
/// Every tensor handle, graph and plan records the context it was built
/// against, so a handle presented to the wrong context (or to a context
/// created after the original was dropped) is rejected instead of
/// silently aliasing unrelated storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl ContextId {
    /// Allocate a fresh, unique context ID. Thread-safe.
    pub fn next() -> Self {
        Self(CONTEXT_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a tensor owned by a context.
///
/// A handle is an index into the owning context's tensor table plus the
/// [`ContextId`] of that context. Handles are `Copy` and never own
/// storage; producer edges between tensors are stored as handles, and
/// because operations only consume tensors created earlier, every edge
/// points at a strictly smaller index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TensorId {
    context: ContextId,
    index: u32,
}

impl TensorId {
    /// Create a handle for the `index`-th tensor of `context`.
    pub fn new(context: ContextId, index: u32) -> Self {
        Self { context, index }
    }

    /// The context this tensor belongs to.
    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Position of this tensor in its context's creation order.
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for TensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}@ctx{}", self.index, self.context)
    }
}
