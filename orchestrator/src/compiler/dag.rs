//! Postfix token stream -> leveled dependency graph

use crate::error::CompileError;
use crate::graph::{Graph, Node, NodeId, Operator};

use super::postfix::PostfixToken;

/// Node as first built, addressed by its position in postfix order.
struct Draft {
    level: usize,
    kind: DraftKind,
}

enum DraftKind {
    Leaf(String),
    Op {
        op: Operator,
        left: usize,
        right: usize,
    },
}

pub fn build_graph(postfix: Vec<PostfixToken>) -> Result<Graph, CompileError> {
    let mut drafts: Vec<Draft> = Vec::with_capacity(postfix.len());
    let mut operands: Vec<usize> = Vec::new();

    for token in postfix {
        match token {
            PostfixToken::Number(value) => {
                operands.push(drafts.len());
                drafts.push(Draft {
                    level: 0,
                    kind: DraftKind::Leaf(value),
                });
            }
            PostfixToken::Op(op) => {
                // Right operand sits on top of the stack.
                let right = operands.pop().ok_or(CompileError::MalformedExpression)?;
                let left = operands.pop().ok_or(CompileError::MalformedExpression)?;
                let level = drafts[left].level.max(drafts[right].level) + 1;

                operands.push(drafts.len());
                drafts.push(Draft {
                    level,
                    kind: DraftKind::Op { op, left, right },
                });
            }
        }
    }

    if operands.len() != 1 {
        return Err(CompileError::MalformedExpression);
    }

    Ok(number_by_level(drafts))
}

/// Assign local ids `1..=N` by ascending level, keeping build order within a
/// level, and rewrite dependencies to the new ids.
fn number_by_level(drafts: Vec<Draft>) -> Graph {
    let mut order: Vec<usize> = (0..drafts.len()).collect();
    order.sort_by_key(|&index| drafts[index].level);

    let mut ids: Vec<NodeId> = vec![0; drafts.len()];
    for (position, &index) in order.iter().enumerate() {
        ids[index] = position as NodeId + 1;
    }

    let mut slots: Vec<Option<Draft>> = drafts.into_iter().map(Some).collect();
    let nodes = order
        .iter()
        .filter_map(|&index| {
            let draft = slots[index].take()?;
            let id = ids[index];
            Some(match draft.kind {
                DraftKind::Leaf(value) => Node::leaf(id, value),
                DraftKind::Op { op, left, right } => {
                    Node::pending(id, draft.level, op, ids[left], ids[right])
                }
            })
        })
        .collect();

    Graph::from_nodes(nodes)
}
