//! Integration test: engine results against element-by-element
//! reference arithmetic, for every op kind and random broadcast shapes.

use proptest::prelude::*;
use tessera_arena::{ArenaConfig, WorkBuffer};
use tessera_core::{BinaryOp, DType, Shape};
use tessera_engine::{execute, ExecutionPlan, PoolConfig, ThreadPool};
use tessera_graph::{Context, GraphError};
use tessera_test_utils::{bit_identical, reference_binary};

/// Run `lhs kind rhs` through the engine and return the output.
fn run_engine(
    kind: BinaryOp,
    lhs: &[f32],
    lhs_shape: &Shape,
    rhs: &[f32],
    rhs_shape: &Shape,
    n_threads: usize,
) -> Vec<f32> {
    let mut ctx = Context::new(ArenaConfig::new(1 << 20)).unwrap();
    let l = ctx.new_tensor(DType::F32, lhs_shape.dims()).unwrap();
    let r = ctx.new_tensor(DType::F32, rhs_shape.dims()).unwrap();
    ctx.set_data(l, lhs).unwrap();
    ctx.set_data(r, rhs).unwrap();
    let out = ctx.binary_op(kind, l, r).unwrap();
    let mut graph = ctx.new_graph().unwrap();
    graph.build_forward_expand(&ctx, out).unwrap();

    let pool = ThreadPool::new(PoolConfig::new(n_threads)).unwrap();
    let plan = ExecutionPlan::new(&ctx, &graph, n_threads).unwrap();
    let mut work = WorkBuffer::new(plan.work_size());
    execute(&mut ctx, &plan, &pool, Some(&mut work)).unwrap();
    ctx.data(out).unwrap().to_vec()
}

/// An output shape and two operand shapes that broadcast to it.
fn broadcast_triple() -> impl Strategy<Value = (Vec<usize>, Vec<usize>, Vec<usize>)> {
    prop::collection::vec(1usize..6, 1..=4).prop_flat_map(|out| {
        let rank = out.len();
        let operand = move |out: Vec<usize>| {
            (0..=rank, prop::collection::vec(any::<bool>(), rank)).prop_map(move |(drop, ones)| {
                out.iter()
                    .zip(&ones)
                    .skip(drop)
                    .map(|(&d, &one)| if one { 1 } else { d })
                    .collect::<Vec<_>>()
            })
        };
        (Just(out.clone()), operand(out.clone()), operand(out))
    })
}

fn values(len: usize) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-100.0f32..100.0, len)
}

proptest! {
    #[test]
    fn engine_matches_reference(
        (_, l_dims, r_dims) in broadcast_triple(),
        kind_idx in 0usize..4,
        n_threads in 1usize..5
    ) {
        let kind = BinaryOp::ALL[kind_idx];
        let l_shape = Shape::new(&l_dims).unwrap();
        let r_shape = Shape::new(&r_dims).unwrap();
        let lhs: Vec<f32> = (0..l_shape.elem_count()).map(|i| (i as f32) * 0.5 - 3.0).collect();
        let rhs: Vec<f32> = (0..r_shape.elem_count()).map(|i| (i as f32) * 1.25 + 1.0).collect();

        let (_, expected) = reference_binary(kind, &lhs, &l_shape, &rhs, &r_shape);
        let actual = run_engine(kind, &lhs, &l_shape, &rhs, &r_shape, n_threads);
        prop_assert!(bit_identical(&actual, &expected), "{kind} {l_shape} {r_shape}");
    }

    #[test]
    fn same_shape_values_match_reference(
        len in 1usize..300,
        kind_idx in 0usize..4,
        a in values(300),
        b in values(300)
    ) {
        let kind = BinaryOp::ALL[kind_idx];
        let shape = Shape::new(&[len]).unwrap();
        let (_, expected) = reference_binary(kind, &a[..len], &shape, &b[..len], &shape);
        let actual = run_engine(kind, &a[..len], &shape, &b[..len], &shape, 3);
        prop_assert!(bit_identical(&actual, &expected));
    }
}

#[test]
fn add_then_square_matches_reference() {
    let shape = Shape::new(&[4, 5]).unwrap();
    let a: Vec<f32> = (0..20).map(|i| i as f32).collect();
    let b: Vec<f32> = (0..20).map(|i| 2.0 * i as f32 - 7.0).collect();
    let (_, s) = reference_binary(BinaryOp::Add, &a, &shape, &b, &shape);
    let (_, expected) = reference_binary(BinaryOp::Mul, &s, &shape, &s, &shape);

    let mut ctx = Context::new(ArenaConfig::new(1 << 20)).unwrap();
    let ta = ctx.new_tensor_2d(DType::F32, 4, 5).unwrap();
    let tb = ctx.new_tensor_2d(DType::F32, 4, 5).unwrap();
    ctx.set_data(ta, &a).unwrap();
    ctx.set_data(tb, &b).unwrap();
    let ts = ctx.add(ta, tb).unwrap();
    let out = ctx.mul(ts, ts).unwrap();
    let mut graph = ctx.new_graph().unwrap();
    graph.build_forward_expand(&ctx, out).unwrap();

    let pool = ThreadPool::new(PoolConfig::new(3)).unwrap();
    let plan = ExecutionPlan::new(&ctx, &graph, 3).unwrap();
    execute(&mut ctx, &plan, &pool, None).unwrap();
    assert_eq!(ctx.data(out).unwrap(), expected.as_slice());
}

#[test]
fn size_one_dims_broadcast_and_others_must_match() {
    let mut ctx = Context::new(ArenaConfig::new(1 << 20)).unwrap();
    let a = ctx.new_tensor_3d(DType::F32, 2, 1, 4).unwrap();
    let b = ctx.new_tensor_2d(DType::F32, 3, 1).unwrap();
    let c = ctx.new_tensor_1d(DType::F32, 3).unwrap();

    let ab = ctx.add(a, b).unwrap();
    assert_eq!(ctx.tensor(ab).unwrap().shape().dims(), &[2, 3, 4]);

    let count = ctx.tensor_count();
    assert!(matches!(ctx.mul(a, c), Err(GraphError::ShapeMismatch { .. })));
    assert_eq!(ctx.tensor_count(), count);
}
