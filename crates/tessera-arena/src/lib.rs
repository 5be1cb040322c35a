//! Fixed-capacity bump arena backing Tessera tensors.
//!
//! One [`Arena`] owns one contiguous buffer whose capacity is fixed at
//! creation. Tensor metadata, graph bookkeeping and tensor data are all
//! carved from it by bumping a cursor; nothing is freed individually.
//! Dropping the arena releases everything at once.
//!
//! # Architecture
//!
//! ```text
//! Arena (owned by a tensor Context)
//! ├── Vec<f32> words        one allocation, sized at creation
//! ├── cursor                bytes handed out so far
//! └── exhausted flag        set on the first failed allocation
//!
//! Region { offset, len }    byte range inside the arena, Copy
//! WorkBuffer                caller-owned scratch for plan execution
//! ```
//!
//! Storage is word-granular (4 bytes): every region starts on at least a
//! 4-byte boundary and is rounded up to whole words, so `f32` tensor data
//! can be viewed as `&[f32]` without any casting.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod arena;
pub mod config;
pub mod error;
pub mod region;
pub mod scratch;

pub use arena::{Arena, WORD_SIZE};
pub use config::ArenaConfig;
pub use error::ArenaError;
pub use region::Region;
pub use scratch::WorkBuffer;
