//! Common imports for building and rewriting expression graphs.
//!
//! ```rust
//! use tensorfold_ir::prelude::*;
//! ```

// Graph
pub use crate::expr::{Expr, ExprId, Graph};
pub use crate::op::{Op, OpKind};

// Values and types
pub use crate::shape::{Dim, Shape};
pub use crate::tensor::{Tensor, Value};
pub use crate::ty::{CheckedType, TensorType, TypeError};
pub use crate::types::{BinaryOp, ConstValue, ReduceOp, UnaryOp};

// Inference, matching and rewriting
pub use crate::infer::TypeTable;
pub use crate::pattern::{ConstPredicate, MatchResult, OpFilter, Pattern};
pub use crate::rewrite::{RewriteOptions, RewriteRule, RuleSet, rewrite};

// Re-exports from dependencies
pub use tensorfold_dtype::DataType;
