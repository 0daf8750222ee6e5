use smallvec::smallvec;
use tensorfold_dtype::DataType;

use crate::expr::{ExprId, Graph};
use crate::op::{Op, OpKind};
use crate::pattern::{ConstPredicate, OpFilter, Pattern};
use crate::tensor::Tensor;
use crate::ty::TensorType;
use crate::types::{BinaryOp, UnaryOp};

fn f32_var(graph: &mut Graph, name: &str) -> ExprId {
    graph.var(name, TensorType::fixed(DataType::Float32, &[4]))
}

#[test]
fn test_wildcard_binds_operands() {
    let mut graph = Graph::new();
    let x = f32_var(&mut graph, "x");
    let c = graph.scalar(2.0f32);
    let prod = graph.mul(x, c);

    let m = (Pattern::wild("x") * Pattern::cvar("c")).match_expr(&graph, prod).unwrap();
    assert_eq!(m.root, prod);
    assert_eq!(m.get("x"), Some(x));
    assert_eq!(m.get("c"), Some(c));
    assert_eq!(m.get("missing"), None);

    // Operator filter and operand order both count.
    assert!(!(Pattern::wild("x") + Pattern::cvar("c")).matches(&graph, prod));
    assert!(!(Pattern::cvar("c") * Pattern::wild("x")).matches(&graph, prod));
}

#[test]
fn test_repeated_name_requires_equal_nodes() {
    let mut graph = Graph::new();
    let x = f32_var(&mut graph, "x");
    let y = f32_var(&mut graph, "y");
    let twice = Pattern::wild("a") + Pattern::wild("a");

    let same = graph.add(x, x);
    let different = graph.add(x, y);
    assert!(twice.matches(&graph, same));
    assert!(!twice.matches(&graph, different));

    // Distinct handles of structurally equal trees also unify.
    let n1 = graph.neg(x);
    let n2 = graph.neg(x);
    let equal_trees = graph.add(n1, n2);
    let m = twice.match_expr(&graph, equal_trees).unwrap();
    assert_eq!(m.get("a"), Some(n1));
}

#[test]
fn test_const_predicates() {
    let mut graph = Graph::new();
    let zero = graph.scalar(0.0f32);
    let one = graph.scalar(1i32);
    let ones = graph.constant(Tensor::from_slice(&[3], &[1i64, 1, 1]).unwrap());
    let empty = graph.constant(Tensor::from_slice::<f32>(&[0], &[]).unwrap());
    let x = f32_var(&mut graph, "x");

    assert!(Pattern::zero_const("z").matches(&graph, zero));
    assert!(!Pattern::zero_const("z").matches(&graph, one));
    assert!(!Pattern::zero_const("z").matches(&graph, empty));
    assert!(Pattern::one_const("o").matches(&graph, one));
    assert!(Pattern::one_const("o").matches(&graph, ones));
    assert!(Pattern::scalar_const("s").matches(&graph, zero));
    assert!(!Pattern::scalar_const("s").matches(&graph, ones));
    assert!(Pattern::const_where("c", ConstPredicate::DType(DataType::Int64)).matches(&graph, ones));
    assert!(!Pattern::is_const().matches(&graph, x));

    let positive = ConstPredicate::custom(|t| t.to_f64_vec().iter().all(|&v| v > 0.0));
    assert!(Pattern::const_where("p", positive.clone()).matches(&graph, ones));
    assert!(!Pattern::const_where("p", positive).matches(&graph, zero));
}

#[test]
fn test_var_pattern() {
    let mut graph = Graph::new();
    let x = f32_var(&mut graph, "x");
    let c = graph.scalar(1.0f32);
    assert!(Pattern::input("v").matches(&graph, x));
    assert!(!Pattern::input("v").matches(&graph, c));
}

#[test]
fn test_any_commits_to_first_alternative() {
    let mut graph = Graph::new();
    let x = f32_var(&mut graph, "x");
    let c = graph.scalar(3.0f32);
    let sum = graph.add(c, x);

    let pat = Pattern::any(vec![
        Pattern::binary(BinaryOp::Add, Pattern::cvar("first"), Pattern::wild("other")),
        Pattern::binary(BinaryOp::Add, Pattern::wild("any"), Pattern::wild("other")),
    ]);
    let m = pat.match_expr(&graph, sum).unwrap();
    assert_eq!(m.get("first"), Some(c));
    // Bindings of the rejected alternative never leak.
    assert_eq!(m.get("any"), None);

    // The first alternative fails partway, leaving no stale bindings behind.
    let flipped = graph.add(x, c);
    let m = pat.match_expr(&graph, flipped).unwrap();
    assert_eq!(m.get("first"), None);
    assert_eq!(m.get("any"), Some(x));
    assert_eq!(m.get("other"), Some(c));
}

#[test]
fn test_named_any_binds_whole_node() {
    let mut graph = Graph::new();
    let x = f32_var(&mut graph, "x");
    let cast = graph.cast(x, DataType::Float16);

    let pat = Pattern::input("v").or_casted().named("src");
    assert_eq!(pat.match_expr(&graph, x).unwrap().get("src"), Some(x));
    let m = pat.match_expr(&graph, cast).unwrap();
    assert_eq!(m.get("src"), Some(cast));
    assert_eq!(m.get("v"), Some(x));
}

#[test]
fn test_tuple_fields() {
    let mut graph = Graph::new();
    let a = graph.scalar(1i32);
    let b = graph.scalar(2i32);
    let x = graph.var("x", TensorType::scalar(DataType::Int32));
    let consts = graph.tuple(&[a, b, a]);
    let mixed = graph.tuple(&[a, x]);

    assert!(Pattern::tuple_of(Pattern::is_const()).matches(&graph, consts));
    assert!(!Pattern::tuple_of(Pattern::is_const()).matches(&graph, mixed));
    assert!(Pattern::tuple(vec![Pattern::is_const(), Pattern::input("x")]).matches(&graph, mixed));
    assert!(!Pattern::tuple(vec![Pattern::is_const()]).matches(&graph, mixed));
}

#[test]
fn test_variadic_call() {
    let mut graph = Graph::new();
    let p = f32_var(&mut graph, "p");
    let q = f32_var(&mut graph, "q");
    let body = graph.add(p, q);
    let func = graph.function("f", body, &[p, q]);
    let c1 = graph.constant(Tensor::full(DataType::Float32, &[4], 1.0f32.into()).unwrap());
    let c2 = graph.constant(Tensor::full(DataType::Float32, &[4], 2.0f32.into()).unwrap());
    let x = f32_var(&mut graph, "x");

    let folded = graph.invoke(func, &[c1, c2]);
    let symbolic = graph.invoke(func, &[c1, x]);
    let pat = Pattern::invoke(Pattern::function(Pattern::wildcard()).named("f"), Pattern::is_const());

    assert_eq!(pat.match_expr(&graph, folded).unwrap().get("f"), Some(func));
    assert!(!pat.matches(&graph, symbolic));
}

#[test]
fn test_function_pattern_matches_body() {
    let mut graph = Graph::new();
    let p = f32_var(&mut graph, "p");
    let body = graph.neg(p);
    let func = graph.function("f", body, &[p]);

    let pat = Pattern::function(-Pattern::input("param"));
    let m = pat.match_expr(&graph, func).unwrap();
    assert_eq!(m.get("param"), Some(p));
    assert!(!Pattern::function(Pattern::is_const()).matches(&graph, func));
}

#[test]
fn test_op_filters() {
    let mut graph = Graph::new();
    let x = f32_var(&mut graph, "x");
    let y = f32_var(&mut graph, "y");
    let sum = graph.add(x, y);
    let max = graph.max(x, y);
    let exp = graph.unary(UnaryOp::Exp, x);
    let shape = graph.shape_of(x);
    let reduced = graph.reduce(crate::ReduceOp::Sum, x, &[0], false);

    let add_or_max = Pattern::binary_any(&[BinaryOp::Add, BinaryOp::Max], Pattern::wildcard(), Pattern::wildcard());
    assert!(add_or_max.matches(&graph, sum));
    assert!(add_or_max.matches(&graph, max));
    assert!(!add_or_max.matches(&graph, exp));

    assert!(Pattern::unary(UnaryOp::Exp, Pattern::wildcard()).matches(&graph, exp));
    assert!(Pattern::shape_of(Pattern::wild("x")).matches(&graph, shape));
    assert!(Pattern::call_repeat(OpFilter::AnyOp, Pattern::input("v")).matches(&graph, sum));

    let any_reduce = Pattern::call(OpFilter::Kind(OpKind::Reduce), vec![Pattern::wildcard()]);
    let sum_axis1 = Op::Reduce { op: crate::ReduceOp::Sum, axes: smallvec![1], keep_dims: false };
    assert!(any_reduce.matches(&graph, reduced));
    assert!(!Pattern::call(OpFilter::Exact(sum_axis1), vec![Pattern::wildcard()]).matches(&graph, reduced));

    let unary_filter = OpFilter::Unary(smallvec![UnaryOp::Exp, UnaryOp::Log]);
    assert!(unary_filter.accepts(&Op::Unary(UnaryOp::Log)));
    assert!(!unary_filter.accepts(&Op::Binary(BinaryOp::Add)));
}

#[test]
fn test_operator_overloads() {
    let mut graph = Graph::new();
    let x = f32_var(&mut graph, "x");
    let y = f32_var(&mut graph, "y");
    let cases: [(Pattern, ExprId); 5] = [
        (Pattern::wild("a") + Pattern::wild("b"), graph.add(x, y)),
        (Pattern::wild("a") - Pattern::wild("b"), graph.sub(x, y)),
        (Pattern::wild("a") / Pattern::wild("b"), graph.div(x, y)),
        (Pattern::wild("a") % Pattern::wild("b"), graph.rem(x, y)),
        (-Pattern::wild("a"), graph.neg(x)),
    ];
    for (pat, id) in &cases {
        let m = pat.match_expr(&graph, *id).unwrap();
        assert_eq!(m.get("a"), Some(x));
    }
    assert!(!cases[0].0.matches(&graph, cases[1].1));
}
