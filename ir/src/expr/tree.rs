//! Tree visualization for expression graphs.
//!
//! Renders a DAG as an ASCII tree. Nodes reachable along several paths are
//! printed once; later occurrences show `[%id] → (see above)`.

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::io;
use std::rc::Rc;

use ptree::{Style, TreeItem};

use super::{Expr, ExprId, Graph};
use crate::infer::TypeTable;

#[derive(Clone)]
pub struct ExprTree<'g> {
    graph: &'g Graph,
    types: Option<&'g TypeTable>,
    id: ExprId,
    visited: Rc<RefCell<HashSet<ExprId>>>,
    is_backref: Cell<bool>,
}

impl<'g> ExprTree<'g> {
    pub fn new(graph: &'g Graph, root: ExprId) -> Self {
        Self { graph, types: None, id: root, visited: Rc::default(), is_backref: Cell::new(false) }
    }

    /// Annotate every node with its entry in `types`, if any.
    pub fn with_types(mut self, types: &'g TypeTable) -> Self {
        self.types = Some(types);
        self
    }

    fn child(&self, id: ExprId) -> Self {
        Self { graph: self.graph, types: self.types, id, visited: self.visited.clone(), is_backref: Cell::new(false) }
    }
}

impl TreeItem for ExprTree<'_> {
    type Child = Self;

    fn write_self<W: io::Write>(&self, f: &mut W, _style: &Style) -> io::Result<()> {
        let mut visited = self.visited.borrow_mut();
        if !visited.insert(self.id) {
            self.is_backref.set(true);
            return write!(f, "[{}] → (see above)", self.id);
        }

        write!(f, "[{}] {}", self.id, format_node(self.graph.get(self.id)))?;
        if let Some(ty) = self.types.and_then(|types| types.get(self.id)) {
            write!(f, " : {ty}")?;
        }
        Ok(())
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        if self.is_backref.get() {
            return Cow::Borrowed(&[]);
        }
        Cow::Owned(self.graph.operands(self.id).into_iter().map(|id| self.child(id)).collect())
    }
}

fn format_node(expr: &Expr) -> String {
    match expr {
        Expr::Var(var) => format!("Var('{}': {})", var.name, var.ty),
        Expr::Const(tensor) => format!("Const({tensor})"),
        Expr::Tuple(fields) => format!("Tuple(len={})", fields.len()),
        Expr::Call(call) => format!("{}", call.op),
        Expr::Function(func) => format!("Function('{}', params={})", func.name, func.params.len()),
    }
}

impl Graph {
    /// Render the graph below `root` as an ASCII tree.
    pub fn tree(&self, root: ExprId) -> String {
        render(&ExprTree::new(self, root))
    }

    /// Like [`Graph::tree`], with inferred types next to each node.
    pub fn tree_with_types(&self, root: ExprId, types: &TypeTable) -> String {
        render(&ExprTree::new(self, root).with_types(types))
    }
}

fn render(tree: &ExprTree<'_>) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = ptree::write_tree(tree, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}
