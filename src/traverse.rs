//! Pre-order walking and filtering of syntax trees.
//!
//! All walkers visit a node before its children and children left to right.
//! They use an explicit stack, so arbitrarily deep trees (including ones
//! built by hand or deserialized) cannot exhaust the call stack.

use crate::types::{Node, NodeKind, NodeKinds};

/// Calls `visit(node, parent)` for every node of the tree in pre-order.
///
/// The root is visited with `parent == None`.
///
/// ```
/// use mathexpr::engine::parse_expression;
/// use mathexpr::traverse::traverse;
///
/// let ast = parse_expression("a + f(b)").unwrap();
/// let mut seen = Vec::new();
/// traverse(&ast, |node, parent| seen.push((node.to_string(), parent.is_some())));
/// assert_eq!(seen[0], ("a + f(b)".to_string(), false));
/// assert_eq!(seen.len(), 4);
/// ```
pub fn traverse<'a, F>(root: &'a Node, mut visit: F)
where
    F: FnMut(&'a Node, Option<&'a Node>),
{
    let mut stack: Vec<(&'a Node, Option<&'a Node>)> = vec![(root, None)];
    while let Some((node, parent)) = stack.pop() {
        visit(node, parent);
        // Reversed so the leftmost child is popped first
        for child in node.children().iter().rev() {
            stack.push((child, Some(node)));
        }
    }
}

/// Every node for which `predicate` holds, in pre-order.
pub fn filter<'a, P>(root: &'a Node, mut predicate: P) -> Vec<&'a Node>
where
    P: FnMut(&Node) -> bool,
{
    let mut matches = Vec::new();
    traverse(root, |node, _| {
        if predicate(node) {
            matches.push(node);
        }
    });
    matches
}

/// Canonical text of every node of `kind`, in pre-order.
///
/// Duplicates are kept, so a variable referenced twice is listed twice.
/// The name of a called function counts as a symbol and is listed right
/// after its call, before the arguments: `cos(x)` contributes `cos` and then
/// `x` to the symbol list.
pub fn collect_nodes(root: &Node, kind: NodeKind) -> Vec<String> {
    collect_nodes_matching(root, NodeKinds::from(kind))
}

/// Like [`collect_nodes`], for any of several kinds in a single pass.
pub fn collect_nodes_matching(root: &Node, kinds: NodeKinds) -> Vec<String> {
    let mut texts = Vec::new();
    let callees = kinds.contains_kind(NodeKind::Symbol);
    traverse(root, |node, _| {
        if kinds.contains_kind(node.kind()) {
            texts.push(node.to_string());
        }
        if let Node::Function { name, .. } = node {
            if callees {
                texts.push(name.clone());
            }
        }
    });
    texts
}

/// Number of occurrences of each kind, indexed like [`NodeKind::ALL`].
///
/// Counts agree with [`collect_nodes`], so function names add to the symbol
/// count.
pub fn count_kinds(root: &Node) -> [usize; 5] {
    let mut counts = [0; 5];
    traverse(root, |node, _| {
        let index = NodeKind::ALL
            .iter()
            .position(|kind| *kind == node.kind())
            .unwrap_or(0);
        counts[index] += 1;
        if node.kind() == NodeKind::Function {
            counts[0] += 1;
        }
    });
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::parse_expression;
    use crate::types::Operator;

    const REFERENCE: &str = "( num1+ (string2* cos(float0) )-num1+sqrt(int0)/ num1)";

    #[test]
    fn test_symbols_in_reference_expression() {
        let ast = parse_expression(REFERENCE).unwrap();
        assert_eq!(
            collect_nodes(&ast, NodeKind::Symbol),
            vec!["num1", "string2", "cos", "float0", "num1", "sqrt", "int0", "num1"]
        );
    }

    #[test]
    fn test_callee_names_are_symbols() {
        let ast = parse_expression("sqrt(x)").unwrap();
        assert_eq!(collect_nodes(&ast, NodeKind::Symbol), vec!["sqrt", "x"]);

        let ast = parse_expression("max(a, min(b, 2))").unwrap();
        assert_eq!(
            collect_nodes(&ast, NodeKind::Symbol),
            vec!["max", "a", "min", "b"]
        );
        assert_eq!(
            collect_nodes_matching(&ast, NodeKinds::SYMBOL | NodeKinds::FUNCTION),
            vec!["max(a, min(b, 2))", "max", "a", "min(b, 2)", "min", "b"]
        );
        assert_eq!(collect_nodes(&ast, NodeKind::Constant), vec!["2"]);
    }

    #[test]
    fn test_other_kinds_in_reference_expression() {
        let ast = parse_expression(REFERENCE).unwrap();
        assert_eq!(
            collect_nodes(&ast, NodeKind::Function),
            vec!["cos(float0)", "sqrt(int0)"]
        );
        assert_eq!(
            collect_nodes(&ast, NodeKind::Parenthesis),
            vec![
                "(num1 + (string2 * cos(float0)) - num1 + sqrt(int0) / num1)",
                "(string2 * cos(float0))",
            ]
        );
        assert!(collect_nodes(&ast, NodeKind::Constant).is_empty());
        let operators = collect_nodes(&ast, NodeKind::Operator);
        assert_eq!(operators.len(), 5);
        assert_eq!(
            operators[0],
            "num1 + (string2 * cos(float0)) - num1 + sqrt(int0) / num1"
        );
    }

    #[test]
    fn test_pre_order_and_duplicates() {
        let ast = parse_expression("1 + 2 * 1").unwrap();
        assert_eq!(collect_nodes(&ast, NodeKind::Constant), vec!["1", "2", "1"]);
        assert_eq!(
            collect_nodes(&ast, NodeKind::Operator),
            vec!["1 + 2 * 1", "2 * 1"]
        );
    }

    #[test]
    fn test_collect_multiple_kinds() {
        let ast = parse_expression("x * 2.50").unwrap();
        let texts = collect_nodes_matching(&ast, NodeKinds::SYMBOL | NodeKinds::CONSTANT);
        assert_eq!(texts, vec!["x", "2.5"]);
        assert!(collect_nodes_matching(&ast, NodeKinds::empty()).is_empty());
    }

    #[test]
    fn test_traverse_reports_parents() {
        let ast = parse_expression("-(a)").unwrap();
        let mut pairs = Vec::new();
        traverse(&ast, |node, parent| {
            pairs.push((node.kind(), parent.map(Node::kind)));
        });
        assert_eq!(
            pairs,
            vec![
                (NodeKind::Operator, None),
                (NodeKind::Parenthesis, Some(NodeKind::Operator)),
                (NodeKind::Symbol, Some(NodeKind::Parenthesis)),
            ]
        );
    }

    #[test]
    fn test_filter_and_counts() {
        let ast = parse_expression("max(a, b) + a").unwrap();
        let named_a = filter(&ast, |node| matches!(node, Node::Symbol { name } if name == "a"));
        assert_eq!(named_a.len(), 2);
        assert_eq!(count_kinds(&ast), [4, 1, 0, 0, 1]);
    }

    #[test]
    fn test_deep_tree_does_not_recurse() {
        let mut node = Node::symbol("x");
        for _ in 0..100_000 {
            node = Node::unary(Operator::UnaryMinus, node);
        }
        let symbols = filter(&node, |n| n.kind() == NodeKind::Symbol);
        assert_eq!(symbols.len(), 1);
        assert_eq!(collect_nodes(&node, NodeKind::Symbol), vec!["x"]);
    }
}
