//! Expression nodes and the arena that owns them.
//!
//! Expressions form a DAG stored in a [`Graph`]; nodes refer to their operands
//! by [`ExprId`]. A node may only refer to nodes inserted before it, so every
//! graph is acyclic and ascending id order is a topological order.

mod constructors;
mod equality;
mod graph;
pub mod tree;

use std::fmt;

use smallvec::SmallVec;

use crate::op::Op;
use crate::tensor::Tensor;
use crate::ty::TensorType;

pub use graph::Graph;

pub type Operands = SmallVec<[ExprId; 4]>;

/// Stable handle of a node inside a [`Graph`].
///
/// Two handles are identical iff they are equal; structural equality is a
/// separate question answered by [`Graph::structurally_equal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExprId(pub(crate) u32);

impl ExprId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Named graph input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Var {
    pub name: String,
    pub ty: TensorType,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Call {
    pub op: Op,
    pub args: Operands,
}

/// Callable body over parameter variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Function {
    pub name: String,
    pub body: ExprId,
    pub params: Operands,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Var(Var),
    Const(Tensor),
    Tuple(Operands),
    Call(Call),
    Function(Function),
}

impl Expr {
    /// Operands in order. A function lists its body first, then its parameters.
    pub fn operands(&self) -> Operands {
        match self {
            Expr::Var(_) | Expr::Const(_) => Operands::new(),
            Expr::Tuple(fields) => fields.clone(),
            Expr::Call(call) => call.args.clone(),
            Expr::Function(func) => {
                let mut ops = Operands::with_capacity(func.params.len() + 1);
                ops.push(func.body);
                ops.extend_from_slice(&func.params);
                ops
            }
        }
    }

    pub fn as_const(&self) -> Option<&Tensor> {
        match self {
            Expr::Const(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&Call> {
        match self {
            Expr::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Expr::Function(func) => Some(func),
            _ => None,
        }
    }

    pub fn as_var(&self) -> Option<&Var> {
        match self {
            Expr::Var(var) => Some(var),
            _ => None,
        }
    }

    pub fn is_const(&self) -> bool {
        matches!(self, Expr::Const(_))
    }
}
