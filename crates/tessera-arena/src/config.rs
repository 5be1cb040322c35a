//! Arena configuration parameters.

/// Configuration for an [`Arena`](crate::Arena).
///
/// The capacity must cover every tensor's metadata and data plus graph
/// bookkeeping; see `MemoryBudget` in `tessera-graph` for a helper that
/// adds these up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Total capacity in bytes.
    ///
    /// Default: 16 MiB.
    pub capacity_bytes: usize,

    /// When set, tensors are created without data regions. Storage is
    /// assigned later in one pass (`Context::allocate_tensors`), which
    /// lets a caller build a graph first and size data exactly.
    ///
    /// Default: `false`.
    pub no_alloc: bool,
}

impl ArenaConfig {
    /// Default capacity: 16 MiB.
    pub const DEFAULT_CAPACITY_BYTES: usize = 16 * 1024 * 1024;

    /// Create a config with the given capacity and eager data allocation.
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            capacity_bytes,
            no_alloc: false,
        }
    }

    /// Set the deferred-allocation flag.
    pub fn with_no_alloc(mut self, no_alloc: bool) -> Self {
        self.no_alloc = no_alloc;
        self
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY_BYTES)
    }
}
