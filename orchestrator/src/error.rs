use crate::graph::NodeId;

/// Why an expression could not be compiled. Never touches scheduler state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("parentheses are not balanced")]
    UnbalancedParentheses,
    /// Wrong operand/operator arity, or nothing to evaluate.
    #[error("malformed expression")]
    MalformedExpression,
    #[error("invalid number literal: {0}")]
    InvalidNumberLiteral(String),
    #[error("unexpected character: {0:?}")]
    UnexpectedCharacter(char),
}

/// Failures of the claim/report protocol.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DispatchError {
    #[error("no expressions in queue")]
    QueueEmpty,
    #[error("node {node_id} not found")]
    NodeNotFound { node_id: NodeId },
    /// The node exists but is not waiting on a worker.
    #[error("node {node_id} is not claimed by a worker")]
    NodeNotClaimed { node_id: NodeId },
    #[error("invalid operand value: {0}")]
    InvalidOperand(String),
}
