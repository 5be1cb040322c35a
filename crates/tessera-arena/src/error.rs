//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during arena operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The request does not fit in the remaining capacity. The arena
    /// refuses every later allocation once this has been returned.
    ArenaExhausted {
        /// Number of bytes requested.
        requested: usize,
        /// Bytes still free when the request was made.
        remaining: usize,
        /// Total capacity of the arena in bytes.
        capacity: usize,
    },
    /// The backing buffer could not be allocated.
    OutOfMemory {
        /// The capacity that could not be reserved, in bytes.
        capacity: usize,
    },
    /// Alignment is not a power of two.
    InvalidAlignment {
        /// The rejected alignment.
        alignment: usize,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArenaExhausted {
                requested,
                remaining,
                capacity,
            } => {
                write!(
                    f,
                    "arena exhausted: requested {requested} bytes, {remaining} of {capacity} bytes remaining"
                )
            }
            Self::OutOfMemory { capacity } => {
                write!(f, "could not allocate arena of {capacity} bytes")
            }
            Self::InvalidAlignment { alignment } => {
                write!(f, "alignment {alignment} is not a power of two")
            }
        }
    }
}

impl Error for ArenaError {}
