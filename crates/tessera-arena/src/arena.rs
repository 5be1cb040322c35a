//! The bump allocator.
//!
//! An [`Arena`] is a pre-allocated `Vec<f32>` with a byte cursor that
//! advances on each allocation. Nothing is freed until the arena itself
//! is dropped.

use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::region::Region;

/// Granularity of arena storage in bytes.
pub const WORD_SIZE: usize = std::mem::size_of::<f32>();

/// A single contiguous memory region with bump allocation.
///
/// The first allocation that does not fit marks the arena exhausted:
/// from then on every allocation fails, even one that would fit in the
/// leftover space. Regions handed out before that stay valid.
pub struct Arena {
    /// Backing storage. Allocated to full capacity at creation, zeroed.
    data: Vec<f32>,
    /// Usable capacity in bytes.
    capacity: usize,
    /// Bump pointer in bytes; always a multiple of [`WORD_SIZE`].
    cursor: usize,
    /// Set by the first failed allocation.
    exhausted: bool,
    no_alloc: bool,
}

impl Arena {
    /// Create an arena with the configured capacity.
    ///
    /// Returns [`ArenaError::OutOfMemory`] if the backing buffer cannot
    /// be reserved.
    pub fn new(config: &ArenaConfig) -> Result<Self, ArenaError> {
        let capacity = config.capacity_bytes;
        let words = capacity.div_ceil(WORD_SIZE);
        let mut data = Vec::new();
        data.try_reserve_exact(words)
            .map_err(|_| ArenaError::OutOfMemory { capacity })?;
        data.resize(words, 0.0);
        Ok(Self {
            data,
            capacity,
            cursor: 0,
            exhausted: false,
            no_alloc: config.no_alloc,
        })
    }

    /// Bump-allocate `size` bytes aligned to `alignment` bytes.
    ///
    /// Alignment below [`WORD_SIZE`] is raised to it; the region is padded
    /// to whole words. The returned region is zero-filled from creation
    /// and never handed out twice.
    pub fn alloc(&mut self, size: usize, alignment: usize) -> Result<Region, ArenaError> {
        if !alignment.is_power_of_two() {
            return Err(ArenaError::InvalidAlignment { alignment });
        }
        if self.exhausted {
            return Err(self.exhausted_error(size));
        }

        let align = alignment.max(WORD_SIZE);
        let end = self
            .cursor
            .checked_next_multiple_of(align)
            .and_then(|start| Some((start, start.checked_add(size)?)))
            .and_then(|(start, end)| Some((start, end.checked_next_multiple_of(WORD_SIZE)?)));

        match end {
            Some((start, padded_end)) if padded_end <= self.capacity => {
                self.cursor = padded_end;
                Ok(Region::new(start, size))
            }
            _ => {
                let err = self.exhausted_error(size);
                self.exhausted = true;
                tracing::warn!(
                    requested = size,
                    used = self.cursor,
                    capacity = self.capacity,
                    "arena exhausted"
                );
                Err(err)
            }
        }
    }

    fn exhausted_error(&self, requested: usize) -> ArenaError {
        ArenaError::ArenaExhausted {
            requested,
            remaining: self.remaining_bytes(),
            capacity: self.capacity,
        }
    }

    /// The `f32` words covered by `region`.
    ///
    /// # Panics
    ///
    /// Panics if the region does not belong to this arena's buffer.
    pub fn slice(&self, region: Region) -> &[f32] {
        &self.data[region.word_range()]
    }

    /// Mutable access to the `f32` words covered by `region`.
    ///
    /// # Panics
    ///
    /// Panics if the region does not belong to this arena's buffer.
    pub fn slice_mut(&mut self, region: Region) -> &mut [f32] {
        &mut self.data[region.word_range()]
    }

    /// The whole backing buffer, for callers that split it themselves.
    pub fn words(&self) -> &[f32] {
        &self.data
    }

    /// Mutable access to the whole backing buffer.
    pub fn words_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Bytes handed out so far, including alignment padding.
    pub fn used_bytes(&self) -> usize {
        self.cursor
    }

    /// Bytes still available.
    pub fn remaining_bytes(&self) -> usize {
        self.capacity - self.cursor
    }

    /// Total capacity in bytes.
    pub fn capacity_bytes(&self) -> usize {
        self.capacity
    }

    /// Whether an allocation has failed.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Whether tensor data allocation is deferred.
    pub fn no_alloc(&self) -> bool {
        self.no_alloc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arena(capacity: usize) -> Arena {
        Arena::new(&ArenaConfig::new(capacity)).unwrap()
    }

    #[test]
    fn alloc_returns_zeroed_data() {
        let mut a = arena(1024);
        let r = a.alloc(40, 4).unwrap();
        assert_eq!(r.offset(), 0);
        let data = a.slice(r);
        assert_eq!(data.len(), 10);
        assert!(data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn sequential_allocs_do_not_overlap() {
        let mut a = arena(1024);
        let r1 = a.alloc(100, 4).unwrap();
        let r2 = a.alloc(200, 4).unwrap();
        assert_eq!(r1.offset(), 0);
        assert_eq!(r2.offset(), 100);
        assert_eq!(a.used_bytes(), 300);
    }

    #[test]
    fn sizes_round_up_to_words() {
        let mut a = arena(1024);
        let r1 = a.alloc(5, 1).unwrap();
        let r2 = a.alloc(4, 1).unwrap();
        assert_eq!(r1.len(), 5);
        assert_eq!(r2.offset(), 8);
        assert_eq!(a.used_bytes(), 12);
    }

    #[test]
    fn alignment_is_honoured() {
        let mut a = arena(1024);
        a.alloc(4, 4).unwrap();
        let r = a.alloc(16, 64).unwrap();
        assert_eq!(r.offset(), 64);
        assert_eq!(a.used_bytes(), 80);
    }

    #[test]
    fn invalid_alignment_is_rejected() {
        let mut a = arena(1024);
        assert_eq!(
            a.alloc(4, 3),
            Err(ArenaError::InvalidAlignment { alignment: 3 })
        );
        assert!(!a.is_exhausted());
    }

    #[test]
    fn exact_fit_succeeds() {
        let mut a = arena(100);
        assert!(a.alloc(100, 4).is_ok());
        assert_eq!(a.remaining_bytes(), 0);
    }

    #[test]
    fn overflow_reports_exhaustion() {
        let mut a = arena(100);
        a.alloc(60, 4).unwrap();
        let err = a.alloc(60, 4).unwrap_err();
        assert_eq!(
            err,
            ArenaError::ArenaExhausted {
                requested: 60,
                remaining: 40,
                capacity: 100,
            }
        );
        assert!(a.is_exhausted());
    }

    #[test]
    fn exhaustion_poisons_later_allocations() {
        let mut a = arena(100);
        let kept = a.alloc(60, 4).unwrap();
        a.slice_mut(kept)[0] = 7.0;
        assert!(a.alloc(80, 4).is_err());
        // Would fit, but the arena is no longer usable for allocation.
        assert!(matches!(
            a.alloc(4, 4),
            Err(ArenaError::ArenaExhausted { .. })
        ));
        // Existing regions stay valid.
        assert_eq!(a.slice(kept)[0], 7.0);
        assert_eq!(a.used_bytes(), 60);
    }

    #[test]
    fn huge_request_does_not_overflow() {
        let mut a = arena(100);
        assert!(a.alloc(usize::MAX, 4).is_err());
    }

    #[test]
    fn zero_sized_alloc_is_valid() {
        let mut a = arena(8);
        let r = a.alloc(0, 4).unwrap();
        assert!(r.is_empty());
        assert!(a.slice(r).is_empty());
    }

    #[test]
    fn capacity_not_multiple_of_word() {
        let mut a = arena(10);
        assert!(a.alloc(8, 4).is_ok());
        // 2 bytes left, but a padded word needs 4.
        assert!(a.alloc(1, 4).is_err());
    }

    proptest! {
        #[test]
        fn used_never_exceeds_capacity(
            capacity in 0usize..4096,
            sizes in proptest::collection::vec((0usize..512, 0u32..7), 1..32),
        ) {
            let mut a = arena(capacity);
            let mut last_end = 0;
            for (size, align_pow) in sizes {
                let align = 1usize << align_pow;
                if let Ok(r) = a.alloc(size, align) {
                    prop_assert!(r.offset() >= last_end);
                    prop_assert_eq!(r.offset() % align.max(WORD_SIZE), 0);
                    last_end = r.end();
                }
                prop_assert!(a.used_bytes() <= a.capacity_bytes());
            }
        }
    }
}
