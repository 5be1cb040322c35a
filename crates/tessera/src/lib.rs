//! Tessera: a minimal tensor engine.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Tessera sub-crates. Tensors live in a fixed-capacity arena owned by
//! a [`graph::Context`]; elementwise operations are recorded rather than
//! computed, ordered into a [`graph::Graph`], planned for a worker count
//! and then executed on a thread pool.
//!
//! # Quick start
//!
//! ```rust
//! use tessera::prelude::*;
//!
//! // Size the arena for two inputs, two outputs and one graph.
//! let config = MemoryBudget::new()
//!     .tensors(4, DType::F32, 2048)
//!     .graph()
//!     .slack(1024)
//!     .config();
//! let mut ctx = Context::new(config).unwrap();
//!
//! let a = ctx.new_tensor_1d(DType::F32, 2048).unwrap();
//! let b = ctx.new_tensor_1d(DType::F32, 2048).unwrap();
//! let a_values: Vec<f32> = (1..=2048).map(|i| i as f32).collect();
//! let b_values: Vec<f32> = (5..=2052).map(|i| i as f32).collect();
//! ctx.set_data(a, &a_values).unwrap();
//! ctx.set_data(b, &b_values).unwrap();
//!
//! // Nothing is computed yet.
//! let sum = ctx.add(a, b).unwrap();
//! let out = ctx.mul(sum, sum).unwrap();
//!
//! let mut graph = ctx.new_graph().unwrap();
//! graph.build_forward_expand(&ctx, out).unwrap();
//!
//! let pool = ThreadPool::new(PoolConfig::new(4)).unwrap();
//! let plan = ExecutionPlan::new(&ctx, &graph, 4).unwrap();
//! let mut work = WorkBuffer::new(plan.work_size());
//! execute(&mut ctx, &plan, &pool, Some(&mut work)).unwrap();
//!
//! let result = ctx.data(out).unwrap();
//! assert_eq!(result[0], 36.0);
//! assert_eq!(result[1], 64.0);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tessera-core` | IDs, element types, shapes, op kinds |
//! | [`arena`] | `tessera-arena` | Bump arena, regions, scratch buffers |
//! | [`graph`] | `tessera-graph` | Contexts, tensors, ops, graphs, sizing |
//! | [`engine`] | `tessera-engine` | Thread pool, planning, execution |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core ids, element types, shapes and op kinds (`tessera-core`).
pub use tessera_core as types;

/// Fixed-capacity bump arena (`tessera-arena`).
///
/// Most users only need [`arena::ArenaConfig`] and [`arena::WorkBuffer`]
/// from this module; both are in the [`prelude`].
pub use tessera_arena as arena;

/// Tensor contexts, deferred ops and graphs (`tessera-graph`).
pub use tessera_graph as graph;

/// Thread pool, execution planning and execution (`tessera-engine`).
///
/// [`engine::ThreadPool`] runs jobs, [`engine::ExecutionPlan`] decides how
/// each node is split, and [`engine::execute`] runs a plan.
pub use tessera_engine as engine;

/// Common imports for typical Tessera usage.
///
/// ```rust
/// use tessera::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use tessera_core::{BinaryOp, DType, Shape, TensorId};

    // Arena
    pub use tessera_arena::{ArenaConfig, WorkBuffer};

    // Graph construction
    pub use tessera_graph::{Context, Graph, MemoryBudget, Op, Tensor};

    // Execution
    pub use tessera_engine::{execute, ExecMetrics, ExecutionPlan, PoolConfig, ThreadPool};

    // Errors
    pub use tessera_arena::ArenaError;
    pub use tessera_engine::{ConfigError, ExecError, PlanError};
    pub use tessera_graph::GraphError;
}
