//! Caller-owned scratch space for plan execution.
//!
//! [`WorkBuffer`] is the "work data" a plan may need while it runs.
//! The caller sizes it from the plan's `work_size`, owns it, and lends
//! it to the executor. The executor carves it into per-chunk slots for
//! each node in turn; the backing allocation is reused across nodes and
//! across runs.

use crate::arena::WORD_SIZE;

/// Scratch memory lent to the executor.
///
/// Storage is a `Vec<f32>` rounded up to whole words, while
/// [`size_bytes`](Self::size_bytes) reports the size the caller asked
/// for. Executors compare that figure against a plan's requirement.
pub struct WorkBuffer {
    /// Backing storage. Sized at creation, never grows.
    data: Vec<f32>,
    /// Size requested by the caller, in bytes.
    size_bytes: usize,
}

impl WorkBuffer {
    /// Create a zeroed work buffer of `size_bytes` bytes.
    pub fn new(size_bytes: usize) -> Self {
        Self {
            data: vec![0.0; size_bytes.div_ceil(WORD_SIZE)],
            size_bytes,
        }
    }

    /// Size requested at creation, in bytes.
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    /// Whether the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.size_bytes == 0
    }

    /// The scratch words, for the executor to split into slots.
    ///
    /// Contents are whatever the previous user left behind.
    pub fn words_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Memory usage of the backing storage in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.data.len() * WORD_SIZE
    }
}

impl std::fmt::Debug for WorkBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkBuffer")
            .field("size_bytes", &self.size_bytes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_zeroed() {
        let mut buf = WorkBuffer::new(64);
        assert_eq!(buf.size_bytes(), 64);
        assert_eq!(buf.words_mut().len(), 16);
        assert!(buf.words_mut().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn partial_word_rounds_storage_up() {
        let mut buf = WorkBuffer::new(10);
        assert_eq!(buf.size_bytes(), 10);
        assert_eq!(buf.words_mut().len(), 3);
        assert_eq!(buf.memory_bytes(), 12);
    }

    #[test]
    fn zero_sized_buffer() {
        let buf = WorkBuffer::new(0);
        assert!(buf.is_empty());
        assert_eq!(buf.memory_bytes(), 0);
    }
}
