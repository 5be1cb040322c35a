//! Parallel execution of Tessera computation graphs.
//!
//! Three pieces turn a built [`Graph`](tessera_graph::Graph) into
//! numbers:
//!
//! - [`ThreadPool`]: a fixed set of named rayon workers.
//!   [`ThreadPool::scope`] lets jobs borrow from the caller and returns
//!   only once all of them have finished.
//! - [`ExecutionPlan`]: per node, how its output is split into chunks
//!   and how much scratch it needs. Planning touches no tensor data.
//! - [`execute`]: runs plan nodes in order, one pool scope per node,
//!   one job per chunk, each writing a disjoint slice of the output.
//!
//! ```text
//! Context + Graph ──ExecutionPlan::new──▶ ExecutionPlan
//!                                          │ work_size
//!                                          ▼
//!               execute(ctx, plan, pool, WorkBuffer) ──▶ ExecMetrics
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod executor;
mod kernel;
pub mod metrics;
pub mod plan;
pub mod pool;

pub use config::{ConfigError, PoolConfig};
pub use executor::{execute, ExecError};
pub use metrics::{ExecMetrics, NodeTiming};
pub use plan::{ChunkSplit, ExecutionPlan, PlanError, PlanNode};
pub use pool::{Scope, ShutdownReport, ThreadPool};
