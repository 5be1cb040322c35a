//! Integration test: graph ordering and plan idempotence on randomly
//! built graphs.

use std::collections::HashSet;

use proptest::prelude::*;
use tessera_arena::ArenaConfig;
use tessera_core::{BinaryOp, DType, TensorId};
use tessera_engine::ExecutionPlan;
use tessera_graph::{Context, Graph};

/// Build a random DAG: `leafs` inputs, then one op per `(kind, i, j)`
/// step combining two earlier tensors. Returns the last tensor.
fn random_dag(ctx: &mut Context, leafs: usize, steps: &[(usize, usize, usize)]) -> TensorId {
    let mut ids: Vec<TensorId> = (0..leafs)
        .map(|_| ctx.new_tensor_1d(DType::F32, 8).unwrap())
        .collect();
    for &(kind, i, j) in steps {
        let lhs = ids[i % ids.len()];
        let rhs = ids[j % ids.len()];
        let out = ctx.binary_op(BinaryOp::ALL[kind % 4], lhs, rhs).unwrap();
        ids.push(out);
    }
    *ids.last().unwrap()
}

fn assert_topological(ctx: &Context, graph: &Graph) {
    let mut seen: HashSet<TensorId> = graph.leafs().iter().copied().collect();
    for &node in graph.nodes() {
        for src in ctx.tensor(node).unwrap().srcs() {
            assert!(seen.contains(&src), "{src} used by {node} before it was placed");
        }
        assert!(seen.insert(node), "{node} placed twice");
    }
}

proptest! {
    #[test]
    fn nodes_follow_their_inputs(
        leafs in 1usize..6,
        steps in prop::collection::vec((0usize..4, 0usize..64, 0usize..64), 1..40)
    ) {
        let mut ctx = Context::new(ArenaConfig::new(1 << 20)).unwrap();
        let root = random_dag(&mut ctx, leafs, &steps);
        let mut graph = ctx.new_graph().unwrap();
        graph.build_forward_expand(&ctx, root).unwrap();

        assert_topological(&ctx, &graph);
        prop_assert_eq!(graph.nodes().last(), Some(&root));
        prop_assert!(graph.n_nodes() <= steps.len());
    }

    #[test]
    fn several_roots_keep_order(
        steps in prop::collection::vec((0usize..4, 0usize..64, 0usize..64), 2..30)
    ) {
        let mut ctx = Context::new(ArenaConfig::new(1 << 20)).unwrap();
        random_dag(&mut ctx, 3, &steps);
        let mut graph = ctx.new_graph().unwrap();
        // Expand every op tensor, newest first, as separate roots.
        let ops: Vec<TensorId> = ctx.tensors().iter().filter(|t| !t.is_leaf()).map(|t| t.id()).collect();
        for &root in ops.iter().rev() {
            graph.build_forward_expand(&ctx, root).unwrap();
        }
        assert_topological(&ctx, &graph);
        prop_assert_eq!(graph.n_nodes(), ops.len());
    }

    #[test]
    fn planning_twice_is_identical(
        steps in prop::collection::vec((0usize..4, 0usize..64, 0usize..64), 1..30),
        n_threads in 1usize..9
    ) {
        let mut ctx = Context::new(ArenaConfig::new(1 << 20)).unwrap();
        let root = random_dag(&mut ctx, 2, &steps);
        let mut graph = ctx.new_graph().unwrap();
        graph.build_forward_expand(&ctx, root).unwrap();

        let first = ExecutionPlan::new(&ctx, &graph, n_threads).unwrap();
        let second = ExecutionPlan::new(&ctx, &graph, n_threads).unwrap();
        prop_assert_eq!(first.work_size(), second.work_size());
        let parts = |p: &ExecutionPlan| p.nodes().iter().map(|n| n.split.parts).collect::<Vec<_>>();
        prop_assert_eq!(parts(&first), parts(&second));
        prop_assert_eq!(first, second);
    }
}
