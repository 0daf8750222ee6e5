use tensorfold_dtype::DataType;

use crate::expr::Graph;
use crate::infer::TypeTable;
use crate::ty::TensorType;

#[test]
fn test_tree_prints_shared_nodes_once() {
    let mut graph = Graph::new();
    let x = graph.var("x", TensorType::fixed(DataType::Float32, &[2]));
    let n = graph.neg(x);
    let root = graph.add(n, n);

    let tree = graph.tree(root);
    assert!(tree.contains(&format!("[{root}] Add")));
    assert!(tree.contains(&format!("[{n}] Neg")));
    assert!(tree.contains("Var('x': f32[2])"));
    assert!(tree.contains(&format!("[{n}] → (see above)")));
    assert_eq!(tree.matches("Var(").count(), 1);
}

#[test]
fn test_tree_with_types() {
    let mut graph = Graph::new();
    let x = graph.var("x", TensorType::fixed(DataType::Int32, &[3]));
    let shape = graph.shape_of(x);
    let c = graph.scalar(1i64);
    let root = graph.tuple(&[shape, c]);

    let mut types = TypeTable::new();
    types.infer(&graph, root);
    let tree = graph.tree_with_types(root, &types);
    assert!(tree.contains("Tuple(len=2)"));
    assert!(tree.contains("ShapeOf : i64[1]"));
    assert!(tree.contains("Const(i64[] 1)"));
}
