//! Tensor contexts, deferred operations and computation graphs.
//!
//! A [`Context`] owns an arena and a table of [`Tensor`] metadata.
//! Creating a tensor charges its metadata (and, unless the context is
//! `no_alloc`, its data) to the arena and returns a [`TensorId`]
//! handle. Operations such as [`Context::add`] do not compute anything:
//! they validate shapes, allocate an output tensor and record an [`Op`]
//! naming their inputs. A [`Graph`] then orders everything reachable
//! from one or more roots so that producers come before consumers.
//!
//! ```text
//! Context
//! ├── Arena               metadata + data + graph bookkeeping
//! ├── Vec<Tensor>         indexed by TensorId
//! │   └── Option<Op>      producer edge(s) to earlier tensors
//! └── IndexMap names      only for tensors that were named
//!
//! Graph (bound to one Context)
//! ├── nodes               op tensors, post-order
//! └── leafs               input tensors
//! ```
//!
//! [`TensorId`]: tessera_core::TensorId

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod budget;
pub mod context;
pub mod error;
pub mod graph;
pub mod tensor;

pub use budget::{
    graph_overhead, graph_overhead_custom, MemoryBudget, DEFAULT_GRAPH_SIZE, TENSOR_ALIGN,
    TENSOR_OVERHEAD,
};
pub use context::Context;
pub use error::GraphError;
pub use graph::Graph;
pub use tensor::{Op, Tensor};
