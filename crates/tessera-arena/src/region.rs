//! Region handles into an arena.
//!
//! A [`Region`] encodes the location of one allocation within an
//! [`Arena`](crate::Arena). It is plain data: copying a region never
//! copies the bytes it describes.

use std::fmt;
use std::ops::Range;

use crate::arena::WORD_SIZE;

/// Byte range of one allocation within an arena.
///
/// Regions are only produced by [`Arena::alloc`](crate::Arena::alloc),
/// which guarantees `offset` is word-aligned and the region lies within
/// the arena's capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct Region {
    /// Byte offset from the start of the arena.
    pub(crate) offset: usize,
    /// Requested length in bytes.
    pub(crate) len: usize,
}

impl Region {
    /// Create a region. Only the arena hands these out.
    pub(crate) fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// Byte offset from the start of the arena.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length in bytes, as requested.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether this is a zero-length allocation.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// One past the last requested byte.
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    /// The span of arena words this region covers, rounded up to whole words.
    pub fn word_range(&self) -> Range<usize> {
        let start = self.offset / WORD_SIZE;
        start..start + self.len.div_ceil(WORD_SIZE)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Region(off={}, len={})", self.offset, self.len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        let r = Region::new(64, 32);
        assert_eq!(r.offset(), 64);
        assert_eq!(r.len(), 32);
        assert_eq!(r.end(), 96);
        assert!(!r.is_empty());
    }

    #[test]
    fn word_range_rounds_partial_words_up() {
        assert_eq!(Region::new(8, 16).word_range(), 2..6);
        assert_eq!(Region::new(8, 5).word_range(), 2..4);
        assert_eq!(Region::new(12, 0).word_range(), 3..3);
    }

    #[test]
    fn empty_region() {
        assert!(Region::new(0, 0).is_empty());
    }
}
