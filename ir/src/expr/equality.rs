use std::collections::HashSet;

use super::{Expr, ExprId, Graph};

impl Graph {
    /// Structural equality of two nodes of this graph, independent of sharing.
    ///
    /// Identical handles are trivially equal. Variables compare by name and
    /// declared type.
    pub fn structurally_equal(&self, a: ExprId, b: ExprId) -> bool {
        a == b || self.structurally_equal_in(a, self, b)
    }

    /// Structural equality of node `a` of this graph and node `b` of `other`.
    pub fn structurally_equal_in(&self, a: ExprId, other: &Graph, b: ExprId) -> bool {
        StructuralEq { lhs: self, rhs: other, proven: HashSet::new() }.eq(a, b)
    }
}

struct StructuralEq<'g> {
    lhs: &'g Graph,
    rhs: &'g Graph,
    /// Pairs already shown equal; shared sub-DAGs are compared once.
    proven: HashSet<(ExprId, ExprId)>,
}

impl StructuralEq<'_> {
    fn eq(&mut self, a: ExprId, b: ExprId) -> bool {
        if std::ptr::eq(self.lhs, self.rhs) && a == b {
            return true;
        }
        if self.lhs.hash_of(a) != self.rhs.hash_of(b) {
            return false;
        }
        if self.proven.contains(&(a, b)) {
            return true;
        }

        let shallow = match (self.lhs.get(a), self.rhs.get(b)) {
            (Expr::Var(x), Expr::Var(y)) => x == y,
            (Expr::Const(x), Expr::Const(y)) => x == y,
            (Expr::Tuple(_), Expr::Tuple(_)) => true,
            (Expr::Call(x), Expr::Call(y)) => x.op == y.op,
            (Expr::Function(x), Expr::Function(y)) => x.name == y.name,
            _ => false,
        };
        if !shallow {
            return false;
        }

        let lhs_ops = self.lhs.operands(a);
        let rhs_ops = self.rhs.operands(b);
        let equal = lhs_ops.len() == rhs_ops.len() && lhs_ops.iter().zip(&rhs_ops).all(|(&x, &y)| self.eq(x, y));
        if equal {
            self.proven.insert((a, b));
        }
        equal
    }
}
