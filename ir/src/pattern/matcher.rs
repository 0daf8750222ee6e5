//! Single-solution matching of patterns against graph nodes.
//!
//! Matching is one top-down descent. Operands are matched left to right and a
//! failed operand fails the whole match; there is no backtracking into earlier
//! siblings or into other alternatives of an `Any` that already matched.

use smallvec::SmallVec;
use tracing::trace;

use super::{FieldPattern, MatchResult, Pattern};
use crate::expr::{Expr, ExprId, Graph};

type Bindings = SmallVec<[(String, ExprId); 4]>;

impl Pattern {
    /// Match this pattern against node `id`. Never mutates the graph.
    pub fn match_expr(&self, graph: &Graph, id: ExprId) -> Option<MatchResult> {
        let mut bindings = Bindings::new();
        if self.match_into(graph, id, &mut bindings) {
            Some(MatchResult { root: id, bindings })
        } else {
            None
        }
    }

    pub fn matches(&self, graph: &Graph, id: ExprId) -> bool {
        self.match_expr(graph, id).is_some()
    }

    fn match_into(&self, graph: &Graph, id: ExprId, bindings: &mut Bindings) -> bool {
        let expr = graph.get(id);
        let (name, matched) = match self {
            Pattern::Any(alternatives) => {
                for alternative in alternatives {
                    let mut attempt = bindings.clone();
                    if alternative.match_into(graph, id, &mut attempt) {
                        *bindings = attempt;
                        return true;
                    }
                }
                return false;
            }
            Pattern::Wildcard { name } => (name, true),
            Pattern::Const { name, predicate } => {
                let matched = match expr {
                    Expr::Const(tensor) => predicate.as_ref().is_none_or(|p| p.matches(tensor)),
                    _ => false,
                };
                (name, matched)
            }
            Pattern::Var { name } => (name, matches!(expr, Expr::Var(_))),
            Pattern::Tuple { name, fields } => {
                let matched = match expr {
                    Expr::Tuple(operands) => match_fields(fields, graph, operands, bindings),
                    _ => false,
                };
                (name, matched)
            }
            Pattern::Call { name, op, args } => {
                let matched = match expr {
                    Expr::Call(call) => op.accepts(&call.op) && match_fields(args, graph, &call.args, bindings),
                    _ => false,
                };
                (name, matched)
            }
            Pattern::Function { name, body } => {
                let matched = match expr {
                    Expr::Function(func) => body.match_into(graph, func.body, bindings),
                    _ => false,
                };
                (name, matched)
            }
        };

        matched && name.as_ref().is_none_or(|name| bind(graph, bindings, name, id))
    }
}

fn match_fields(fields: &FieldPattern, graph: &Graph, operands: &[ExprId], bindings: &mut Bindings) -> bool {
    match fields {
        FieldPattern::Exact(patterns) => {
            patterns.len() == operands.len()
                && patterns.iter().zip(operands).all(|(p, &id)| p.match_into(graph, id, bindings))
        }
        FieldPattern::Repeat(pattern) => operands.iter().all(|&id| pattern.match_into(graph, id, bindings)),
        FieldPattern::Variadic { head, rest } => {
            operands.len() >= head.len()
                && head.iter().zip(operands).all(|(p, &id)| p.match_into(graph, id, bindings))
                && operands[head.len()..].iter().all(|&id| rest.match_into(graph, id, bindings))
        }
    }
}

/// Bind `name` to `id`. A name already bound must refer to an identical or
/// structurally equal node.
fn bind(graph: &Graph, bindings: &mut Bindings, name: &str, id: ExprId) -> bool {
    match bindings.iter().find(|(n, _)| n == name) {
        Some(&(_, bound)) => {
            let consistent = graph.structurally_equal(bound, id);
            if !consistent {
                trace!(name, %bound, candidate = %id, "binding conflict");
            }
            consistent
        }
        None => {
            bindings.push((name.to_string(), id));
            true
        }
    }
}
