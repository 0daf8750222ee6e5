//! Sweep-based fixpoint rewrite driver.
//!
//! # Algorithm
//!
//! Each sweep visits the nodes reachable from the current root in topological
//! order (operands first). A visited node is first rebuilt with the
//! replacements of its operands, then rewritten to a local fixpoint: the
//! replacement produced by a rule is matched again before the parents are
//! visited, which lets rules chain. A substitution map keyed by the original
//! handle keeps sharing intact; a node shared by several parents is rewritten
//! once and untouched nodes keep their identity.
//!
//! Function parameters are never rewritten, so a rule matching `Var` nodes
//! only sees free variables.
//!
//! Sweeps repeat until one fires no rule, or an iteration cap is hit. Hitting a
//! cap is reported as [`Convergence::IterationLimit`], never silently.

use std::collections::{HashMap, HashSet};

use bon::Builder;
use tracing::{debug, warn};

use super::rule::RuleSet;
use crate::error::{NotConvergedSnafu, Result};
use crate::expr::{ExprId, Graph};

/// Iteration caps of the driver.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct RewriteOptions {
    /// Maximum number of bottom-up sweeps.
    #[builder(default = 64)]
    pub max_sweeps: usize,
    /// Maximum rewrites applied to a single node within one sweep.
    #[builder(default = 1000)]
    pub max_local_iterations: usize,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self { max_sweeps: 64, max_local_iterations: 1000 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convergence {
    /// The last sweep fired no rule.
    Fixpoint,
    /// A cap stopped the driver; the graph may still be rewritable.
    IterationLimit,
}

#[derive(Debug, Clone)]
pub struct RewriteOutput {
    pub root: ExprId,
    pub convergence: Convergence,
    pub sweeps: usize,
    /// Total number of rule applications.
    pub rewrites: usize,
    /// Every rewritten original node mapped to its final replacement.
    pub becomes: HashMap<ExprId, ExprId>,
}

impl RewriteOutput {
    pub fn converged(&self) -> bool {
        self.convergence == Convergence::Fixpoint
    }

    /// Final replacement of `id`, or `id` itself if it was never rewritten.
    pub fn resolve(&self, id: ExprId) -> ExprId {
        self.becomes.get(&id).copied().unwrap_or(id)
    }

    /// The new root, or [`Error::NotConverged`](crate::Error::NotConverged) if a cap was hit.
    pub fn into_result(self) -> Result<ExprId> {
        match self.convergence {
            Convergence::Fixpoint => Ok(self.root),
            Convergence::IterationLimit => NotConvergedSnafu { sweeps: self.sweeps }.fail(),
        }
    }
}

/// Result lookup with path compression.
///
/// Successive sweeps produce chains `a → b → c`; lookups follow the chain and
/// point every visited entry straight at the end.
#[derive(Default)]
struct ResultMap {
    results: HashMap<ExprId, ExprId>,
}

impl ResultMap {
    fn get(&mut self, id: ExprId) -> ExprId {
        let mut current = id;
        let mut path = Vec::new();
        while let Some(&next) = self.results.get(&current) {
            if next == current {
                break;
            }
            path.push(current);
            current = next;
        }
        for k in path {
            self.results.insert(k, current);
        }
        current
    }

    fn link(&mut self, original: ExprId, result: ExprId) {
        if original != result {
            self.results.insert(original, result);
        }
    }

    fn into_resolved(mut self) -> HashMap<ExprId, ExprId> {
        let keys: Vec<_> = self.results.keys().copied().collect();
        keys.into_iter().map(|k| (k, self.get(k))).collect()
    }
}

struct SweepOutcome {
    root: ExprId,
    rewrites: usize,
    capped: bool,
}

struct RewriteEngine<'a, C> {
    graph: &'a mut Graph,
    rules: &'a RuleSet<C>,
    ctx: &'a mut C,
    options: &'a RewriteOptions,
    results: ResultMap,
}

impl<C> RewriteEngine<'_, C> {
    fn sweep(&mut self, root: ExprId) -> SweepOutcome {
        let mut substitutions: HashMap<ExprId, ExprId> = HashMap::new();
        let mut rewrites = 0;
        let mut capped = false;

        let order = self.graph.reachable(root);
        // Parameters are binders: rewriting one would detach the body's uses
        // from the function that declares it.
        let params: HashSet<ExprId> = order
            .iter()
            .filter_map(|&id| self.graph.as_function(id))
            .flat_map(|func| func.params.iter().copied())
            .collect();

        for id in order {
            if params.contains(&id) {
                continue;
            }
            let rebuilt = self.graph.map_operands(id, |op| substitutions.get(&op).copied().unwrap_or(op));
            let (result, fired, hit_cap) = self.local_fixpoint(rebuilt);
            rewrites += fired;
            capped |= hit_cap;
            if result != id {
                substitutions.insert(id, result);
                self.results.link(id, result);
            }
        }

        let root = substitutions.get(&root).copied().unwrap_or(root);
        SweepOutcome { root, rewrites, capped }
    }

    /// Rewrite one node until no rule applies. Returns the final node, the
    /// number of rules fired and whether the local cap was hit.
    fn local_fixpoint(&mut self, mut node: ExprId) -> (ExprId, usize, bool) {
        for fired in 0..self.options.max_local_iterations {
            match self.rules.apply(self.graph, node, self.ctx) {
                Some(replacement) => node = replacement,
                None => return (node, fired, false),
            }
        }
        warn!(expr = %node, limit = self.options.max_local_iterations, "local rewrite limit reached");
        (node, self.options.max_local_iterations, true)
    }
}

/// Rewrite the graph below `root` with default options.
pub fn rewrite<C>(graph: &mut Graph, root: ExprId, rules: &RuleSet<C>, ctx: &mut C) -> RewriteOutput {
    rewrite_with_options(graph, root, rules, ctx, &RewriteOptions::default())
}

pub fn rewrite_with_options<C>(
    graph: &mut Graph,
    root: ExprId,
    rules: &RuleSet<C>,
    ctx: &mut C,
    options: &RewriteOptions,
) -> RewriteOutput {
    let mut engine = RewriteEngine { graph, rules, ctx, options, results: ResultMap::default() };
    let mut current = root;
    let mut sweeps = 0;
    let mut rewrites = 0;

    let convergence = loop {
        if sweeps == options.max_sweeps {
            warn!(sweeps, rewrites, "rewrite sweep limit reached before fixpoint");
            break Convergence::IterationLimit;
        }
        sweeps += 1;

        let outcome = engine.sweep(current);
        debug!(sweep = sweeps, fired = outcome.rewrites, from = %current, to = %outcome.root, "sweep finished");
        current = outcome.root;
        rewrites += outcome.rewrites;

        if outcome.capped {
            break Convergence::IterationLimit;
        }
        if outcome.rewrites == 0 {
            break Convergence::Fixpoint;
        }
    };

    let becomes = engine.results.into_resolved();
    RewriteOutput { root: current, convergence, sweeps, rewrites, becomes }
}
