use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::mem::discriminant;

use snafu::ensure;

use super::{Call, Expr, ExprId, Function, Operands};
use crate::error::{DanglingOperandSnafu, ParameterNotVarSnafu, Result};
use crate::tensor::Tensor;

#[derive(Debug, Clone)]
struct Node {
    expr: Expr,
    /// Structural hash: covers the payload and operand hashes, never operand ids.
    hash: u64,
}

/// Append-only arena of immutable expression nodes.
///
/// Rewriting never edits a node in place; it inserts new nodes and hands out
/// their handles. Nodes unreachable from the roots a caller keeps are dead and
/// are released together with the graph.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a node.
    ///
    /// # Panics
    ///
    /// Panics if an operand is not a node of this graph or a function
    /// parameter is not a `Var`. Use [`Graph::try_insert`] to get an error
    /// instead.
    pub fn insert(&mut self, expr: Expr) -> ExprId {
        match self.try_insert(expr) {
            Ok(id) => id,
            Err(err) => panic!("malformed expression: {err}"),
        }
    }

    pub fn try_insert(&mut self, expr: Expr) -> Result<ExprId> {
        for operand in expr.operands() {
            ensure!(operand.index() < self.nodes.len(), DanglingOperandSnafu { operand, len: self.nodes.len() });
        }
        if let Expr::Function(func) = &expr {
            for &param in &func.params {
                ensure!(matches!(self.get(param), Expr::Var(_)), ParameterNotVarSnafu { param });
            }
        }

        let hash = self.content_hash(&expr);
        let id = ExprId(self.nodes.len() as u32);
        self.nodes.push(Node { expr, hash });
        Ok(id)
    }

    fn content_hash(&self, expr: &Expr) -> u64 {
        let mut hasher = DefaultHasher::new();
        discriminant(expr).hash(&mut hasher);
        match expr {
            Expr::Var(var) => var.hash(&mut hasher),
            Expr::Const(tensor) => tensor.hash(&mut hasher),
            Expr::Tuple(_) => {}
            Expr::Call(call) => call.op.hash(&mut hasher),
            Expr::Function(func) => func.name.hash(&mut hasher),
        }
        let operands = expr.operands();
        operands.len().hash(&mut hasher);
        for operand in operands {
            self.nodes[operand.index()].hash.hash(&mut hasher);
        }
        hasher.finish()
    }

    /// # Panics
    ///
    /// Panics if `id` does not belong to this graph.
    pub fn get(&self, id: ExprId) -> &Expr {
        &self.nodes[id.index()].expr
    }

    pub fn contains(&self, id: ExprId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Structural hash of a node. Structurally equal nodes hash equally, in
    /// this graph and across graphs.
    pub fn hash_of(&self, id: ExprId) -> u64 {
        self.nodes[id.index()].hash
    }

    pub fn operands(&self, id: ExprId) -> Operands {
        self.get(id).operands()
    }

    pub fn as_const(&self, id: ExprId) -> Option<&Tensor> {
        self.get(id).as_const()
    }

    pub fn as_call(&self, id: ExprId) -> Option<&Call> {
        self.get(id).as_call()
    }

    pub fn as_function(&self, id: ExprId) -> Option<&Function> {
        self.get(id).as_function()
    }

    /// Copy of node `id` with its operands replaced, in [`Expr::operands`] order.
    ///
    /// Returns `id` itself when nothing changes, so untouched nodes keep their
    /// identity.
    ///
    /// # Panics
    ///
    /// Panics if the operand count differs from the node's or the new node
    /// would be malformed.
    pub fn with_operands(&mut self, id: ExprId, operands: &[ExprId]) -> ExprId {
        match self.try_with_operands(id, operands) {
            Ok(id) => id,
            Err(err) => panic!("malformed expression: {err}"),
        }
    }

    pub fn try_with_operands(&mut self, id: ExprId, operands: &[ExprId]) -> Result<ExprId> {
        let current = self.operands(id);
        assert_eq!(current.len(), operands.len(), "operand count of {id} cannot change");
        if current.as_slice() == operands {
            return Ok(id);
        }

        let expr = match self.get(id) {
            Expr::Var(_) | Expr::Const(_) => return Ok(id),
            Expr::Tuple(_) => Expr::Tuple(Operands::from_slice(operands)),
            Expr::Call(call) => Expr::Call(Call { op: call.op.clone(), args: Operands::from_slice(operands) }),
            Expr::Function(func) => Expr::Function(Function {
                name: func.name.clone(),
                body: operands[0],
                params: Operands::from_slice(&operands[1..]),
            }),
        };
        self.try_insert(expr)
    }

    /// Rebuild node `id` with every substitutable operand passed through `f`.
    ///
    /// Function parameters are binders and are never substituted; only the
    /// body of a function goes through `f`.
    pub fn map_operands(&mut self, id: ExprId, mut f: impl FnMut(ExprId) -> ExprId) -> ExprId {
        let mut operands = self.operands(id);
        match self.get(id) {
            Expr::Function(_) => operands[0] = f(operands[0]),
            _ => operands.iter_mut().for_each(|op| *op = f(*op)),
        }
        self.with_operands(id, &operands)
    }

    /// Nodes reachable from `root`, operands before the nodes using them.
    pub fn reachable(&self, root: ExprId) -> Vec<ExprId> {
        let mut seen = vec![false; root.index() + 1];
        let mut stack = vec![root];
        seen[root.index()] = true;
        while let Some(id) = stack.pop() {
            for operand in self.operands(id) {
                if !seen[operand.index()] {
                    seen[operand.index()] = true;
                    stack.push(operand);
                }
            }
        }

        seen.iter().enumerate().filter(|&(_, &s)| s).map(|(i, _)| ExprId(i as u32)).collect()
    }

    /// All handles in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = ExprId> + '_ {
        (0..self.nodes.len() as u32).map(ExprId)
    }
}
