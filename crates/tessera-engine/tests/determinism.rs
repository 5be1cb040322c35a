//! Integration test: results do not depend on the worker count.
//!
//! The same graph is planned and executed with 1, 2, 4 and 8 threads;
//! every run must produce bit-identical output.

use proptest::prelude::*;
use tessera_arena::WorkBuffer;
use tessera_core::TensorId;
use tessera_engine::{execute, ExecutionPlan, PoolConfig, ThreadPool};
use tessera_graph::{Context, Graph};
use tessera_test_utils::bit_identical;
use tessera_test_utils::fixtures::{AddMul, BroadcastChain};

const THREAD_COUNTS: [usize; 4] = [1, 2, 4, 8];

fn run(ctx: &mut Context, graph: &Graph, out: TensorId, n_threads: usize) -> Vec<f32> {
    let pool = ThreadPool::new(PoolConfig::new(n_threads)).unwrap();
    let plan = ExecutionPlan::new(ctx, graph, n_threads).unwrap();
    let mut work = WorkBuffer::new(plan.work_size());
    execute(ctx, &plan, &pool, Some(&mut work)).unwrap();
    ctx.data(out).unwrap().to_vec()
}

#[test]
fn broadcast_chain_is_thread_count_independent() {
    let mut fx = BroadcastChain::new(7, 13).unwrap();
    let baseline = run(&mut fx.ctx, &fx.graph, fx.q, 1);
    for n in THREAD_COUNTS {
        let out = run(&mut fx.ctx, &fx.graph, fx.q, n);
        assert!(bit_identical(&out, &baseline), "{n} threads diverged");
    }
}

#[test]
fn each_context_gets_its_own_run() {
    // Separate contexts and pools do not share state.
    let mut results = Vec::new();
    for n in THREAD_COUNTS {
        let mut fx = BroadcastChain::new(5, 9).unwrap();
        results.push(run(&mut fx.ctx, &fx.graph, fx.q, n));
    }
    for r in &results[1..] {
        assert!(bit_identical(r, &results[0]));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn add_mul_is_thread_count_independent(
        a in prop::collection::vec(-1.0e3f32..1.0e3, 1..600),
        offset in -50.0f32..50.0
    ) {
        let b: Vec<f32> = a.iter().map(|x| x * 0.75 + offset).collect();
        let mut fx = AddMul::new(&a, &b).unwrap();
        let baseline = run(&mut fx.ctx, &fx.graph, fx.out, THREAD_COUNTS[0]);
        for n in &THREAD_COUNTS[1..] {
            let out = run(&mut fx.ctx, &fx.graph, fx.out, *n);
            prop_assert!(bit_identical(&out, &baseline));
        }
    }

    #[test]
    fn broadcast_shapes_are_thread_count_independent(rows in 1usize..12, cols in 1usize..40) {
        let mut fx = BroadcastChain::new(rows, cols).unwrap();
        let baseline = run(&mut fx.ctx, &fx.graph, fx.q, 1);
        for n in THREAD_COUNTS {
            let out = run(&mut fx.ctx, &fx.graph, fx.q, n);
            prop_assert!(bit_identical(&out, &baseline));
        }
    }
}
