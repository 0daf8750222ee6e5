//! Function-level passes and the pass manager.

use snafu::{OptionExt, ResultExt};
use tensorfold_evaluator::ReferenceEvaluator;
use tensorfold_ir::{Evaluator, ExprId, Graph, TypeTable, rewrite_with_options};
use tracing::debug;

use crate::config::PassOptions;
use crate::error::{DidNotConvergeSnafu, IrSnafu, NotAFunctionSnafu, Result};
use crate::fold::{FoldContext, folding_rules};

/// Outcome of running one pass on a function.
#[derive(Debug, Clone)]
pub struct PassOutput {
    /// The rewritten function. Equal to the input handle when nothing changed.
    pub function: ExprId,
    pub sweeps: usize,
    pub rewrites: usize,
    /// Types of every node reachable from `function`.
    pub types: TypeTable,
}

/// A transformation from one function to an equivalent one.
pub trait Pass {
    fn name(&self) -> &str;

    fn run(&self, graph: &mut Graph, function: ExprId, options: &PassOptions) -> Result<PassOutput>;
}

/// Shape inference with folding.
///
/// Infers the function, folds every shape computation and closed
/// sub-expression of its body to constants, rebuilds the function around the
/// new body and infers it again. Sub-expressions that depend on inputs of
/// unknown shape stay symbolic.
///
/// Running the pass on its own output fires no rule and returns the same
/// function handle.
#[derive(Debug, Clone, Default)]
pub struct ShapeInferPass<E = ReferenceEvaluator> {
    evaluator: E,
}

impl ShapeInferPass {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: Evaluator> ShapeInferPass<E> {
    pub fn with_evaluator(evaluator: E) -> Self {
        Self { evaluator }
    }
}

impl<E: Evaluator> Pass for ShapeInferPass<E> {
    fn name(&self) -> &str {
        "shape-infer"
    }

    fn run(&self, graph: &mut Graph, function: ExprId, options: &PassOptions) -> Result<PassOutput> {
        let mut operands = graph.operands(function);
        let body = graph.as_function(function).context(NotAFunctionSnafu { expr: function })?.body;

        let mut ctx = FoldContext::new(&self.evaluator);
        if !ctx.types.infer(graph, function) {
            debug!(function = %function, "function has ill-typed nodes");
        }
        debug!(pass = self.name(), expr.tree = graph.tree_with_types(function, &ctx.types), "before pass");

        let rules = folding_rules();
        let output = rewrite_with_options(graph, body, &rules, &mut ctx, &options.rewrite_options());
        if !output.converged() {
            return DidNotConvergeSnafu { pass: self.name(), sweeps: output.sweeps }.fail();
        }

        operands[0] = output.root;
        let function = graph.try_with_operands(function, &operands).context(IrSnafu)?;
        ctx.types.infer(graph, function);
        debug!(
            pass = self.name(),
            sweeps = output.sweeps,
            rewrites = output.rewrites,
            expr.tree = graph.tree_with_types(function, &ctx.types),
            "after pass"
        );

        Ok(PassOutput { function, sweeps: output.sweeps, rewrites: output.rewrites, types: ctx.into_types() })
    }
}

/// Runs passes in order, handing each the function produced by the previous one.
#[derive(Default)]
pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
    options: PassOptions,
}

impl PassManager {
    pub fn new(options: PassOptions) -> Self {
        Self { passes: Vec::new(), options }
    }

    pub fn with_pass(mut self, pass: impl Pass + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    pub fn options(&self) -> &PassOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Run every pass. Returns the final function handle.
    pub fn run(&self, graph: &mut Graph, function: ExprId) -> Result<ExprId> {
        let mut current = function;
        for pass in &self.passes {
            let output = pass.run(graph, current, &self.options)?;
            debug!(pass = pass.name(), from = %current, to = %output.function, rewrites = output.rewrites, "pass finished");
            current = output.function;
        }
        Ok(current)
    }
}
