//! Core types for the Tessera tensor engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the arena, graph and engine crates:
//! context/tensor identifiers, element types, shapes with broadcasting,
//! and the elementwise operation kinds.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod dtype;
pub mod error;
pub mod id;
pub mod op;
pub mod shape;

pub use dtype::DType;
pub use error::ShapeError;
pub use id::{ContextId, TensorId};
pub use op::BinaryOp;
pub use shape::{Dims, Shape, MAX_DIMS};
