use tensorfold_dtype::DataType;

use crate::error::Error;
use crate::expr::{ExprId, Graph};
use crate::pattern::Pattern;
use crate::rewrite::{Convergence, PatternRule, RewriteOptions, RuleSet, SelectionPolicy, rewrite, rewrite_with_options};
use crate::ty::TensorType;

fn f32_var(graph: &mut Graph, name: &str) -> ExprId {
    graph.var(name, TensorType::scalar(DataType::Float32))
}

/// `x + c` becomes `c + x`.
fn const_to_front() -> RuleSet {
    RuleSet::default().with_rule(PatternRule::new(
        "const-to-front",
        Pattern::wild("x") + Pattern::cvar("c"),
        |m, graph, _| Some(graph.add(m.get("c")?, m.get("x")?)),
    ))
}

fn identities() -> RuleSet {
    let mut rules = RuleSet::default();
    rules.add("add-zero", Pattern::wild("x") + Pattern::zero_const("z"), |m, _, _| m.get("x"));
    rules.add("mul-one", Pattern::wild("x") * Pattern::one_const("o"), |m, _, _| m.get("x"));
    rules.add("neg-neg", -(-Pattern::wild("x")), |m, _, _| m.get("x"));
    rules
}

#[test]
fn test_rewrite_reaches_fixpoint() {
    let mut graph = Graph::new();
    let v = f32_var(&mut graph, "v");
    let one = graph.scalar(1.0f32);
    let root = graph.add(v, one);

    let out = rewrite(&mut graph, root, &const_to_front(), &mut ());
    assert_eq!(out.convergence, Convergence::Fixpoint);
    assert!(out.converged());
    assert_eq!(out.sweeps, 2);
    assert_eq!(out.rewrites, 1);

    let mut expected = Graph::new();
    let ev = f32_var(&mut expected, "v");
    let eone = expected.scalar(1.0f32);
    let eroot = expected.add(eone, ev);
    assert!(graph.structurally_equal_in(out.root, &expected, eroot));

    // The original node is still in the arena, unchanged.
    assert_eq!(graph.operands(root).as_slice(), &[v, one]);
    assert_eq!(out.resolve(root), out.root);
    let new_root = out.root;
    assert_eq!(out.into_result(), Ok(new_root));
}

#[test]
fn test_rewrite_preserves_sharing() {
    let mut graph = Graph::new();
    let v = f32_var(&mut graph, "v");
    let w = f32_var(&mut graph, "w");
    let one = graph.scalar(1.0f32);
    let shared = graph.add(v, one);
    let prod = graph.mul(shared, shared);
    let untouched = graph.neg(w);
    let root = graph.tuple(&[prod, untouched]);

    let out = rewrite(&mut graph, root, &const_to_front(), &mut ());
    assert!(out.converged());
    assert_eq!(out.rewrites, 1);

    let fields = graph.operands(out.root);
    assert_eq!(fields[1], untouched);
    assert_eq!(out.resolve(untouched), untouched);

    let new_prod = graph.operands(fields[0]);
    assert_eq!(new_prod[0], new_prod[1]);
    assert_eq!(new_prod[0], out.resolve(shared));
    assert_eq!(graph.operands(new_prod[0]).as_slice(), &[one, v]);
}

#[test]
fn test_rules_chain_on_the_same_node() {
    let mut graph = Graph::new();
    let v = f32_var(&mut graph, "v");
    let zero = graph.scalar(0.0f32);
    let one = graph.scalar(1.0f32);
    let inner = graph.add(v, zero);
    let outer = graph.add(inner, zero);
    let root = graph.mul(outer, one);

    let out = rewrite(&mut graph, root, &identities(), &mut ());
    assert!(out.converged());
    assert_eq!(out.root, v);
    assert_eq!(out.rewrites, 3);
    assert_eq!(out.sweeps, 2);
    assert_eq!(out.resolve(inner), v);
    assert_eq!(out.resolve(outer), v);
}

#[test]
fn test_replacement_is_matched_again() {
    let mut rules = RuleSet::default();
    rules.add("add-zero-to-mul", Pattern::wild("x") + Pattern::zero_const("z"), |m, graph, _| {
        let one = graph.scalar(1.0f32);
        Some(graph.mul(m.get("x")?, one))
    });
    rules.add("mul-one", Pattern::wild("x") * Pattern::one_const("o"), |m, _, _| m.get("x"));

    let mut graph = Graph::new();
    let v = f32_var(&mut graph, "v");
    let zero = graph.scalar(0.0f32);
    let root = graph.add(v, zero);

    let out = rewrite(&mut graph, root, &rules, &mut ());
    assert_eq!(out.root, v);
    assert_eq!(out.rewrites, 2);
}

#[test]
fn test_double_negation_collapses() {
    let mut graph = Graph::new();
    let v = f32_var(&mut graph, "v");
    let mut node = v;
    for _ in 0..4 {
        node = graph.neg(node);
    }

    let out = rewrite(&mut graph, node, &identities(), &mut ());
    assert!(out.converged());
    assert_eq!(out.root, v);
}

#[test]
fn test_local_limit_reports_non_convergence() {
    let mut rules = RuleSet::default();
    rules.add("swap-consts", Pattern::cvar("a") + Pattern::cvar("b"), |m, graph, _| {
        Some(graph.add(m.get("b")?, m.get("a")?))
    });

    let mut graph = Graph::new();
    let a = graph.scalar(1.0f32);
    let b = graph.scalar(2.0f32);
    let root = graph.add(a, b);

    let options = RewriteOptions::builder().max_local_iterations(8).build();
    let out = rewrite_with_options(&mut graph, root, &rules, &mut (), &options);
    assert_eq!(out.convergence, Convergence::IterationLimit);
    assert_eq!(out.sweeps, 1);
    assert_eq!(out.rewrites, 8);
    assert_eq!(out.into_result(), Err(Error::NotConverged { sweeps: 1 }));
}

#[test]
fn test_sweep_limit_reports_non_convergence() {
    let mut graph = Graph::new();
    let v = f32_var(&mut graph, "v");
    let one = graph.scalar(1.0f32);
    let root = graph.add(v, one);

    let options = RewriteOptions::builder().max_sweeps(1).build();
    let out = rewrite_with_options(&mut graph, root, &const_to_front(), &mut (), &options);
    assert_eq!(out.convergence, Convergence::IterationLimit);
    assert_eq!(out.sweeps, 1);
    assert_ne!(out.root, root);
}

#[test]
fn test_returning_the_candidate_is_not_a_rewrite() {
    let mut rules = RuleSet::default();
    rules.add("identity", Pattern::wildcard(), |m, _, _| Some(m.root));

    let mut graph = Graph::new();
    let v = f32_var(&mut graph, "v");
    let root = graph.neg(v);

    let out = rewrite(&mut graph, root, &rules, &mut ());
    assert_eq!(out.root, root);
    assert_eq!(out.rewrites, 0);
    assert_eq!(out.sweeps, 1);
    assert!(out.becomes.is_empty());
}

#[test]
fn test_selection_policy() {
    let build = |policy| -> RuleSet {
        RuleSet::new(policy)
            .with_rule(PatternRule::new("to-neg", Pattern::wild("x") + Pattern::zero_const("z"), |m, graph, _| {
                Some(graph.neg(m.get("x")?))
            }))
            .with_rule(
                PatternRule::new("drop-zero", Pattern::wild("x") + Pattern::zero_const("z"), |m, _, _| m.get("x"))
                    .with_priority(10),
            )
    };

    let mut graph = Graph::new();
    let v = f32_var(&mut graph, "v");
    let zero = graph.scalar(0.0f32);
    let sum = graph.add(v, zero);

    let first_match = build(SelectionPolicy::FirstMatch);
    let replaced = first_match.apply(&mut graph, sum, &mut ()).unwrap();
    assert_eq!(graph.operands(replaced).as_slice(), &[v]);

    let priority = build(SelectionPolicy::Priority);
    assert_eq!(priority.policy(), SelectionPolicy::Priority);
    assert_eq!(priority.iter().map(|r| r.name()).collect::<Vec<_>>(), ["drop-zero", "to-neg"]);
    assert_eq!(priority.apply(&mut graph, sum, &mut ()), Some(v));
}

#[test]
fn test_rules_share_a_context() {
    let mut rules: RuleSet<usize> = RuleSet::default();
    rules.add("count-add-zero", Pattern::wild("x") + Pattern::zero_const("z"), |m, _, fired: &mut usize| {
        *fired += 1;
        m.get("x")
    });

    let mut graph = Graph::new();
    let a = f32_var(&mut graph, "a");
    let b = f32_var(&mut graph, "b");
    let zero = graph.scalar(0.0f32);
    let lhs = graph.add(a, zero);
    let rhs = graph.add(b, zero);
    let root = graph.sub(lhs, rhs);

    let mut fired = 0;
    let out = rewrite(&mut graph, root, &rules, &mut fired);
    assert_eq!(fired, 2);
    assert_eq!(graph.operands(out.root).as_slice(), &[a, b]);
}

#[test]
fn test_swap_below_a_parent() {
    // (x + 1) * 10 becomes (1 + x) * 10.
    let mut graph = Graph::new();
    let x = f32_var(&mut graph, "x");
    let one = graph.scalar(1.0f32);
    let ten = graph.scalar(10.0f32);
    let sum = graph.add(x, one);
    let root = graph.mul(sum, ten);

    let out = rewrite(&mut graph, root, &const_to_front(), &mut ());
    assert!(out.converged());
    assert_eq!(out.rewrites, 1);

    let mut expected = Graph::new();
    let ex = f32_var(&mut expected, "x");
    let eone = expected.scalar(1.0f32);
    let eten = expected.scalar(10.0f32);
    let esum = expected.add(eone, ex);
    let eroot = expected.mul(esum, eten);
    assert!(graph.structurally_equal_in(out.root, &expected, eroot));
    assert_eq!(graph.operands(out.root)[1], ten);
}

#[test]
fn test_function_parameters_are_not_rewritten() {
    let mut rules = RuleSet::default();
    rules.add("rename", Pattern::input("v"), |m, graph, _| {
        let var = graph.get(m.get("v")?).as_var()?.clone();
        (var.name.len() == 1).then(|| graph.var(format!("{}2", var.name), var.ty))
    });

    let mut graph = Graph::new();
    let x = f32_var(&mut graph, "x");
    let y = f32_var(&mut graph, "y");
    let body = graph.add(x, y);
    let function = graph.function("f", body, &[x]);

    let out = rewrite(&mut graph, function, &rules, &mut ());
    assert!(out.converged());
    assert_eq!(out.rewrites, 1);

    let func = graph.as_function(out.root).unwrap();
    assert_eq!(func.params.as_slice(), &[x]);
    let operands = graph.operands(func.body);
    assert_eq!(operands[0], x);
    assert_eq!(graph.get(operands[1]).as_var().map(|v| v.name.as_str()), Some("y2"));
}
