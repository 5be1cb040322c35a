//! Computation graphs and topological ordering.
//!
//! [`Graph::build_forward_expand`] walks producer edges depth-first
//! from a root and appends tensors in post-order, so every tensor comes
//! after all of its inputs. The visited set persists across calls:
//! expanding a second root only appends what the first did not reach,
//! and the combined order keeps the producer-before-consumer property.

use std::collections::HashSet;

use smallvec::SmallVec;
use tessera_core::{ContextId, TensorId};

use crate::context::Context;
use crate::error::GraphError;

/// Producer inputs of one tensor.
pub(crate) type Srcs = SmallVec<[TensorId; 2]>;

/// The ordered set of tensors reachable from one or more roots.
///
/// Op tensors go to [`nodes`](Self::nodes), inputs to
/// [`leafs`](Self::leafs), each in an order where producers precede
/// consumers. A graph is bound to the context that created it.
#[derive(Debug)]
pub struct Graph {
    context: ContextId,
    size: usize,
    nodes: Vec<TensorId>,
    leafs: Vec<TensorId>,
    visited: HashSet<TensorId>,
}

impl Graph {
    /// Create an empty graph. Callers charge the arena first; see
    /// `Context::new_graph`.
    pub(crate) fn with_capacity(context: ContextId, size: usize) -> Self {
        Self {
            context,
            size,
            nodes: Vec::with_capacity(size),
            leafs: Vec::with_capacity(size),
            visited: HashSet::with_capacity(2 * size),
        }
    }

    /// Add everything reachable from `root` that is not already in the
    /// graph.
    ///
    /// On error nothing is added: the graph keeps the order it had.
    pub fn build_forward_expand(&mut self, ctx: &Context, root: TensorId) -> Result<(), GraphError> {
        if ctx.id() != self.context {
            return Err(GraphError::ForeignGraph {
                graph: self.context,
                context: ctx.id(),
            });
        }

        let order = post_order(root, &self.visited, |id| Ok(ctx.tensor(id)?.srcs()))?;

        let new_nodes = order.iter().filter(|(_, leaf)| !leaf).count();
        let new_leafs = order.len() - new_nodes;
        if self.nodes.len() + new_nodes > self.size || self.leafs.len() + new_leafs > self.size {
            return Err(GraphError::GraphFull {
                capacity: self.size,
            });
        }

        for (id, leaf) in order {
            self.visited.insert(id);
            if leaf {
                self.leafs.push(id);
            } else {
                self.nodes.push(id);
            }
        }
        tracing::debug!(
            root = %root,
            nodes = self.nodes.len(),
            leafs = self.leafs.len(),
            "graph expanded"
        );
        Ok(())
    }

    /// Op tensors in execution order.
    pub fn nodes(&self) -> &[TensorId] {
        &self.nodes
    }

    /// Input tensors, in first-reached order.
    pub fn leafs(&self) -> &[TensorId] {
        &self.leafs
    }

    /// Number of op tensors.
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Maximum number of nodes (and, separately, leafs).
    pub fn size(&self) -> usize {
        self.size
    }

    /// The context this graph belongs to.
    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Whether `tensor` is in the graph.
    pub fn contains(&self, tensor: TensorId) -> bool {
        self.visited.contains(&tensor)
    }

    /// Forget all nodes and leafs, keeping the allocated capacity.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.leafs.clear();
        self.visited.clear();
    }
}

/// One tensor on the traversal stack.
struct Frame {
    id: TensorId,
    srcs: Srcs,
    next: usize,
}

/// Iterative depth-first post-order walk from `root`.
///
/// Tensors in `visited` are treated as already placed and skipped.
/// Returns newly reached tensors in post-order, each tagged `true` if
/// it has no inputs. A tensor met again while still on the stack is a
/// cycle.
pub(crate) fn post_order<F>(
    root: TensorId,
    visited: &HashSet<TensorId>,
    mut srcs_of: F,
) -> Result<Vec<(TensorId, bool)>, GraphError>
where
    F: FnMut(TensorId) -> Result<Srcs, GraphError>,
{
    let mut order = Vec::new();
    if visited.contains(&root) {
        // Still validate the handle.
        srcs_of(root)?;
        return Ok(order);
    }

    let mut done: HashSet<TensorId> = HashSet::new();
    let mut on_stack: HashSet<TensorId> = HashSet::new();
    let mut stack = vec![Frame {
        id: root,
        srcs: srcs_of(root)?,
        next: 0,
    }];
    on_stack.insert(root);

    while let Some(frame) = stack.last_mut() {
        if frame.next < frame.srcs.len() {
            let child = frame.srcs[frame.next];
            frame.next += 1;
            if on_stack.contains(&child) {
                return Err(GraphError::CycleDetected { tensor: child });
            }
            if visited.contains(&child) || done.contains(&child) {
                continue;
            }
            let srcs = srcs_of(child)?;
            on_stack.insert(child);
            stack.push(Frame {
                id: child,
                srcs,
                next: 0,
            });
        } else {
            let Some(finished) = stack.pop() else { break };
            on_stack.remove(&finished.id);
            done.insert(finished.id);
            order.push((finished.id, finished.srcs.is_empty()));
        }
    }
    Ok(order)
}
