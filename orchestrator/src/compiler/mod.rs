//! Expression compiler
//!
//! Two passes:
//! 1. [`postfix::to_postfix`] scans the infix text into number/operator
//!    tokens and reorders them with an explicit operator stack.
//! 2. [`dag::build_graph`] folds the postfix stream into a [`Graph`],
//!    checking operator arity as it goes. This pass is what rejects inputs
//!    such as `2++3`.

pub mod dag;
pub mod postfix;

use crate::error::CompileError;
use crate::graph::Graph;

pub use postfix::{to_postfix, PostfixToken, Token};

/// Compile infix text into a dependency graph.
pub fn compile(input: &str) -> Result<Graph, CompileError> {
    let postfix = to_postfix(input)?;
    dag::build_graph(postfix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeKind, NodeStatus};

    fn level_labels(graph: &Graph) -> Vec<(usize, Vec<String>)> {
        graph
            .levels()
            .into_iter()
            .map(|(level, nodes)| {
                (
                    level,
                    nodes.iter().map(|n| n.label().to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_simple_addition() {
        let graph = compile("2+3").unwrap();
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.max_level(), 1);
        assert_eq!(
            level_labels(&graph),
            vec![
                (0, vec!["2".to_string(), "3".to_string()]),
                (1, vec!["+".to_string()]),
            ]
        );
    }

    #[test]
    fn test_precedence_sets_levels() {
        let graph = compile("2+3*4").unwrap();
        assert_eq!(graph.len(), 5);
        assert_eq!(graph.max_level(), 2);

        let levels = graph.levels();
        assert_eq!(levels[&1].len(), 1);
        assert_eq!(levels[&1][0].label(), "*");
        assert_eq!(levels[&2][0].label(), "+");
    }

    #[test]
    fn test_parentheses() {
        let graph = compile("(2+3)*4").unwrap();
        assert_eq!(graph.len(), 5);
        assert_eq!(graph.max_level(), 2);
        assert_eq!(graph.levels()[&2][0].label(), "*");
    }

    #[test]
    fn test_nested_expression() {
        let graph = compile("((2+3)*(4-1))/5").unwrap();
        assert_eq!(graph.len(), 9);
        assert_eq!(graph.max_level(), 3);
        assert_eq!(graph.levels()[&1].len(), 2);
    }

    #[test]
    fn test_ids_ascend_by_level_and_dependencies_point_back() {
        let graph = compile("1-2*3+(4/5)").unwrap();
        let mut previous_level = 0;
        for (index, node) in graph.nodes().enumerate() {
            assert_eq!(node.id, index as u64 + 1);
            assert!(node.level >= previous_level);
            previous_level = node.level;

            if let NodeKind::Pending { left, right, .. } = node.kind {
                let left = graph.node(left).unwrap();
                let right = graph.node(right).unwrap();
                assert!(left.id < node.id && right.id < node.id);
                assert_eq!(node.level, left.level.max(right.level) + 1);
            }
        }
    }

    #[test]
    fn test_dependencies_keep_source_order() {
        let graph = compile("8-3").unwrap();
        let root = graph.node(3).unwrap();
        let NodeKind::Pending { left, right, .. } = root.kind else {
            panic!("root should be pending");
        };
        assert_eq!(graph.node(left).unwrap().label(), "8");
        assert_eq!(graph.node(right).unwrap().label(), "3");
    }

    #[test]
    fn test_fresh_graph_statuses() {
        let graph = compile("2+3").unwrap();
        assert_eq!(graph.node(1).unwrap().status, NodeStatus::Done);
        assert_eq!(graph.node(3).unwrap().status, NodeStatus::Created);
    }

    #[test]
    fn test_decimal_literals() {
        let graph = compile("2.5+3,5").unwrap();
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.node(2).unwrap().value(), Some("3.5"));
    }

    #[test]
    fn test_single_literal() {
        let graph = compile(" 42 ").unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.max_level(), 0);
    }

    #[test]
    fn test_compile_errors() {
        assert_eq!(compile("2+(3*4"), Err(CompileError::UnbalancedParentheses));
        assert_eq!(compile("2++3"), Err(CompileError::MalformedExpression));
        assert_eq!(compile("2 3"), Err(CompileError::MalformedExpression));
        assert_eq!(compile("*"), Err(CompileError::MalformedExpression));
        assert_eq!(compile(""), Err(CompileError::MalformedExpression));
        assert_eq!(compile("()"), Err(CompileError::MalformedExpression));
        assert_eq!(compile("-3"), Err(CompileError::MalformedExpression));
        assert!(matches!(
            compile("1..2+3"),
            Err(CompileError::InvalidNumberLiteral(_))
        ));
    }
}
