//! Integration test: the 2048-element add-then-square workload.
//!
//! A = 1..=2048, B = 5..=2052, sum = A + B, out = sum * sum, executed on
//! four workers. Every output element must equal `(A[i] + B[i])^2`.

use tessera_engine::{execute, ExecutionPlan, PoolConfig, ThreadPool};
use tessera_test_utils::fixtures::AddMul;
use tessera_test_utils::sequence;

const N: usize = 2048;

#[test]
fn add_then_square_2048_on_four_threads() {
    let a = sequence(1.0, N);
    let b = sequence(5.0, N);
    let mut fx = AddMul::new(&a, &b).unwrap();
    let pool = ThreadPool::new(PoolConfig::new(4)).unwrap();

    let plan = ExecutionPlan::new(&fx.ctx, &fx.graph, 4).unwrap();
    assert_eq!(plan.work_size(), 0);
    let metrics = execute(&mut fx.ctx, &plan, &pool, None).unwrap();

    let out = fx.ctx.data(fx.out).unwrap();
    assert_eq!(out[0], 36.0);
    assert_eq!(out[1], 64.0);
    assert_eq!(out, AddMul::expected(&a, &b).as_slice());
    assert_eq!(out[N - 1], (2048.0f32 + 2052.0).powi(2));

    // Operands are untouched; the intermediate holds A + B.
    assert_eq!(fx.ctx.data(fx.a).unwrap(), a.as_slice());
    assert_eq!(fx.ctx.data(fx.b).unwrap(), b.as_slice());
    assert_eq!(fx.ctx.data(fx.sum).unwrap()[0], 6.0);

    assert_eq!(metrics.node_us.len(), 2);
    assert_eq!(metrics.chunks_dispatched, 8);
    assert_eq!(metrics.n_threads, 4);
}

#[test]
fn rerunning_a_plan_gives_the_same_result() {
    let a = sequence(1.0, N);
    let b = sequence(5.0, N);
    let mut fx = AddMul::new(&a, &b).unwrap();
    let pool = ThreadPool::new(PoolConfig::new(4)).unwrap();
    let plan = ExecutionPlan::new(&fx.ctx, &fx.graph, 4).unwrap();

    execute(&mut fx.ctx, &plan, &pool, None).unwrap();
    let first = fx.ctx.data(fx.out).unwrap().to_vec();
    execute(&mut fx.ctx, &plan, &pool, None).unwrap();
    assert_eq!(fx.ctx.data(fx.out).unwrap(), first.as_slice());
}

#[test]
fn new_inputs_flow_through_an_existing_plan() {
    let mut fx = AddMul::new(&sequence(0.0, 16), &sequence(0.0, 16)).unwrap();
    let pool = ThreadPool::new(PoolConfig::new(2)).unwrap();
    let plan = ExecutionPlan::new(&fx.ctx, &fx.graph, 2).unwrap();

    fx.ctx.fill(fx.a, 1.0).unwrap();
    fx.ctx.fill(fx.b, 2.0).unwrap();
    execute(&mut fx.ctx, &plan, &pool, None).unwrap();
    assert_eq!(fx.ctx.data(fx.out).unwrap(), &[9.0; 16]);
}

#[test]
fn plan_with_more_threads_than_pool_workers() {
    let a = sequence(1.0, 100);
    let b = sequence(2.0, 100);
    let mut fx = AddMul::new(&a, &b).unwrap();
    let pool = ThreadPool::new(PoolConfig::new(2)).unwrap();
    let plan = ExecutionPlan::new(&fx.ctx, &fx.graph, 16).unwrap();
    let metrics = execute(&mut fx.ctx, &plan, &pool, None).unwrap();
    assert_eq!(metrics.chunks_dispatched, 32);
    assert_eq!(fx.ctx.data(fx.out).unwrap(), AddMul::expected(&a, &b).as_slice());
}
