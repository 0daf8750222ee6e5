use tensorfold_dtype::DataType;
use tensorfold_evaluator::ReferenceEvaluator;
use tensorfold_ir::shape::{Dim, Shape};
use tensorfold_ir::{ExprId, Graph, Tensor, TensorType};

use crate::config::PassOptions;
use crate::error::Error;
use crate::pass::{Pass, PassManager, ShapeInferPass};

/// `Reshape(x, Concat(Slice(ShapeOf(x), 0..1), [-1]))`: flatten all but the batch axis.
fn flatten(graph: &mut Graph, x: ExprId) -> ExprId {
    let shape = graph.shape_of(x);
    let begins = graph.const_i64s(&[0]);
    let ends = graph.const_i64s(&[1]);
    let axes = graph.const_i64s(&[0]);
    let steps = graph.const_i64s(&[1]);
    let batch = graph.slice(shape, begins, ends, axes, steps);
    let rest = graph.const_i64s(&[-1]);
    let parts = graph.tuple(&[batch, rest]);
    let target = graph.concat(parts, 0);
    graph.reshape(x, target)
}

fn static_flatten(graph: &mut Graph) -> ExprId {
    let x = graph.var("x", TensorType::fixed(DataType::Float32, &[1, 3, 240, 320]));
    let body = flatten(graph, x);
    graph.function("main", body, &[x])
}

#[test]
fn test_shape_computation_collapses() {
    let mut graph = Graph::new();
    let function = static_flatten(&mut graph);

    let mut out = ShapeInferPass::new().run(&mut graph, function, &PassOptions::default()).unwrap();
    assert_ne!(out.function, function);
    assert_eq!(out.rewrites, 3);
    assert_eq!(out.sweeps, 2);

    let body = graph.as_function(out.function).unwrap().body;
    let reshape = graph.as_call(body).unwrap();
    assert_eq!(graph.as_const(reshape.args[1]), Some(&Tensor::from_i64s(&[1, -1])));
    assert_eq!(
        out.types.type_of(&graph, out.function),
        &TensorType::fixed(DataType::Float32, &[1, 230400]).into()
    );
}

#[test]
fn test_parameters_survive() {
    let mut graph = Graph::new();
    let function = static_flatten(&mut graph);
    let params = graph.as_function(function).unwrap().params.clone();

    let out = ShapeInferPass::new().run(&mut graph, function, &PassOptions::default()).unwrap();
    assert_eq!(graph.as_function(out.function).unwrap().params, params);
}

#[test]
fn test_pass_is_idempotent() {
    let mut graph = Graph::new();
    let function = static_flatten(&mut graph);
    let pass = ShapeInferPass::with_evaluator(ReferenceEvaluator::new());
    let options = PassOptions::default();

    let first = pass.run(&mut graph, function, &options).unwrap();
    let second = pass.run(&mut graph, first.function, &options).unwrap();
    assert_eq!(second.function, first.function);
    assert_eq!(second.rewrites, 0);
    assert_eq!(second.sweeps, 1);
}

#[test]
fn test_unknown_batch_stays_symbolic() {
    let mut graph = Graph::new();
    let dims = [Dim::Unknown, Dim::Fixed(3), Dim::Fixed(4)].into_iter().collect();
    let x = graph.var("x", TensorType::new(DataType::Float32, Shape::Ranked(dims)));
    let body = flatten(&mut graph, x);
    let function = graph.function("main", body, &[x]);

    let mut out = ShapeInferPass::new().run(&mut graph, function, &PassOptions::default()).unwrap();
    assert_eq!(out.function, function);
    assert_eq!(out.rewrites, 0);
    let ty = out.types.type_of(&graph, function).clone();
    assert_eq!(ty, TensorType::new(DataType::Float32, Shape::unknown(2)).into());
}

#[test]
fn test_not_a_function() {
    let mut graph = Graph::new();
    let x = graph.scalar(1i64);
    let err = ShapeInferPass::new().run(&mut graph, x, &PassOptions::default()).unwrap_err();
    assert_eq!(err, Error::NotAFunction { expr: x });
}

#[test]
fn test_sweep_cap_is_reported() {
    let mut graph = Graph::new();
    let function = static_flatten(&mut graph);
    let options = PassOptions::builder().max_sweeps(1).build();

    let err = ShapeInferPass::new().run(&mut graph, function, &options).unwrap_err();
    assert_eq!(err, Error::DidNotConverge { pass: "shape-infer".to_string(), sweeps: 1 });
}

#[test]
fn test_manager_threads_function_handle() {
    let mut graph = Graph::new();
    let function = static_flatten(&mut graph);
    let manager = PassManager::new(PassOptions::default()).with_pass(ShapeInferPass::new()).with_pass(ShapeInferPass::new());
    assert_eq!(manager.len(), 2);

    let result = manager.run(&mut graph, function).unwrap();
    let mut reference = Graph::new();
    let expected = static_flatten(&mut reference);
    let expected = ShapeInferPass::new().run(&mut reference, expected, &PassOptions::default()).unwrap().function;
    assert!(graph.structurally_equal_in(result, &reference, expected));
}

#[test]
fn test_empty_manager_is_identity() {
    let mut graph = Graph::new();
    let function = static_flatten(&mut graph);
    assert_eq!(PassManager::default().run(&mut graph, function), Ok(function));
}
