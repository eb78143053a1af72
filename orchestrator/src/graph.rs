//! Dependency graph of a compiled expression
//!
//! Nodes live in a per-expression arena addressed by dense local ids
//! `1..=N`. Ids are assigned in ascending level order, so a dependency
//! always points at a lower id than its dependent.

use std::collections::BTreeMap;

use crate::error::DispatchError;

/// Local node id, unique within one expression.
pub type NodeId = u64;

/// Binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Sub),
            '*' => Some(Operator::Mul),
            '/' => Some(Operator::Div),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
        }
    }

    /// Binding strength; every operator is left-associative.
    pub fn precedence(&self) -> u8 {
        match self {
            Operator::Add | Operator::Sub => 1,
            Operator::Mul | Operator::Div => 2,
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Created,
    InQueue,
    AtWorker,
    Done,
}

/// What a node holds at this point of its life.
///
/// `Pending` is the only variant with dependencies; it becomes `Resolved`
/// (or `Failed`) exactly once, through [`Graph::resolve`] or [`Graph::fail`].
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Numeric literal from the source text.
    Leaf { value: String },
    Pending {
        op: Operator,
        left: NodeId,
        right: NodeId,
    },
    /// Operator node whose result came back from a worker.
    Resolved { op: Operator, value: String },
    /// Operator node whose worker reported an error. Done, but never usable
    /// as an operand.
    Failed { op: Operator, error: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub level: usize,
    pub status: NodeStatus,
    pub kind: NodeKind,
}

impl Node {
    pub(crate) fn leaf(id: NodeId, value: String) -> Self {
        Self {
            id,
            level: 0,
            status: NodeStatus::Done,
            kind: NodeKind::Leaf { value },
        }
    }

    pub(crate) fn pending(
        id: NodeId,
        level: usize,
        op: Operator,
        left: NodeId,
        right: NodeId,
    ) -> Self {
        Self {
            id,
            level,
            status: NodeStatus::Created,
            kind: NodeKind::Pending { op, left, right },
        }
    }

    /// True when dependents may consume this node's value.
    pub fn is_resolved(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. } | NodeKind::Resolved { .. })
    }

    pub fn value(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Leaf { value } | NodeKind::Resolved { value, .. } => Some(value),
            NodeKind::Pending { .. } | NodeKind::Failed { .. } => None,
        }
    }

    pub fn operator(&self) -> Option<Operator> {
        match &self.kind {
            NodeKind::Leaf { .. } => None,
            NodeKind::Pending { op, .. }
            | NodeKind::Resolved { op, .. }
            | NodeKind::Failed { op, .. } => Some(*op),
        }
    }

    /// Source-level label: the literal for leaves, the symbol otherwise.
    pub fn label(&self) -> &str {
        match &self.kind {
            NodeKind::Leaf { value } => value,
            NodeKind::Pending { op, .. }
            | NodeKind::Resolved { op, .. }
            | NodeKind::Failed { op, .. } => op.symbol(),
        }
    }
}

/// A node handed to a worker: both operands already parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimedNode {
    pub id: NodeId,
    pub op: Operator,
    pub arg1: f64,
    pub arg2: f64,
}

/// Render a worker result the way it is stored in a resolved node.
pub fn format_value(value: f64) -> String {
    format!("{value:.5}")
}

pub(crate) fn parse_value(text: &str) -> Result<f64, DispatchError> {
    text.parse::<f64>()
        .map_err(|_| DispatchError::InvalidOperand(text.to_string()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    nodes: Vec<Node>,
    max_level: usize,
}

impl Graph {
    /// `nodes[i].id` must equal `i + 1` and dependencies must point backwards.
    pub(crate) fn from_nodes(nodes: Vec<Node>) -> Self {
        let max_level = nodes.iter().map(|n| n.level).max().unwrap_or(0);
        Self { nodes, max_level }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn max_level(&self) -> usize {
        self.max_level
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.nodes.get(index)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.nodes.get_mut(index)
    }

    /// Level -> nodes at that level, in id order.
    pub fn levels(&self) -> BTreeMap<usize, Vec<&Node>> {
        let mut levels: BTreeMap<usize, Vec<&Node>> = BTreeMap::new();
        for node in &self.nodes {
            levels.entry(node.level).or_default().push(node);
        }
        levels
    }

    /// A graph without operators: its value is known at compile time.
    pub fn literal_value(&self) -> Option<Result<f64, DispatchError>> {
        match self.nodes.as_slice() {
            [node] => node.value().map(parse_value),
            _ => None,
        }
    }

    /// Created -> InQueue for every operator node.
    pub fn enqueue(&mut self) {
        for node in &mut self.nodes {
            if node.status == NodeStatus::Created {
                node.status = NodeStatus::InQueue;
            }
        }
    }

    fn is_dispatchable(&self, node: &Node) -> bool {
        let NodeKind::Pending { left, right, .. } = node.kind else {
            return false;
        };
        node.status == NodeStatus::InQueue
            && self.node(left).is_some_and(Node::is_resolved)
            && self.node(right).is_some_and(Node::is_resolved)
    }

    /// Claim the first dispatchable node, moving it to `AtWorker`.
    ///
    /// Callers must hold the owning expression's lock; that is what keeps a
    /// node from being claimed twice.
    pub fn claim_next(&mut self) -> Result<Option<ClaimedNode>, DispatchError> {
        let Some(index) = self.nodes.iter().position(|n| self.is_dispatchable(n)) else {
            return Ok(None);
        };

        let NodeKind::Pending { op, left, right } = self.nodes[index].kind else {
            return Ok(None);
        };
        let arg1 = self.operand(left)?;
        let arg2 = self.operand(right)?;

        let node = &mut self.nodes[index];
        node.status = NodeStatus::AtWorker;
        Ok(Some(ClaimedNode {
            id: node.id,
            op,
            arg1,
            arg2,
        }))
    }

    fn operand(&self, id: NodeId) -> Result<f64, DispatchError> {
        let value = self
            .node(id)
            .and_then(Node::value)
            .ok_or_else(|| DispatchError::InvalidOperand(format!("node {id} has no value")))?;
        parse_value(value)
    }

    fn claimed_mut(&mut self, id: NodeId) -> Result<(&mut Node, Operator), DispatchError> {
        let node = self
            .node_mut(id)
            .ok_or(DispatchError::NodeNotFound { node_id: id })?;
        let op = match (&node.kind, node.status) {
            (NodeKind::Pending { op, .. }, NodeStatus::AtWorker) => *op,
            _ => return Err(DispatchError::NodeNotClaimed { node_id: id }),
        };
        Ok((node, op))
    }

    /// AtWorker -> Done with the worker's result.
    pub fn resolve(&mut self, id: NodeId, result: f64) -> Result<(), DispatchError> {
        let (node, op) = self.claimed_mut(id)?;
        node.kind = NodeKind::Resolved {
            op,
            value: format_value(result),
        };
        node.status = NodeStatus::Done;
        Ok(())
    }

    /// AtWorker -> Done without a value.
    pub fn fail(&mut self, id: NodeId, error: &str) -> Result<(), DispatchError> {
        let (node, op) = self.claimed_mut(id)?;
        node.kind = NodeKind::Failed {
            op,
            error: error.to_string(),
        };
        node.status = NodeStatus::Done;
        Ok(())
    }

    /// Every node at the deepest level is done.
    pub fn is_complete(&self) -> bool {
        self.nodes
            .iter()
            .filter(|n| n.level == self.max_level)
            .all(|n| n.status == NodeStatus::Done)
    }

    /// Value of the deepest node, once it is resolved.
    pub fn root_value(&self) -> Result<f64, DispatchError> {
        let root = self
            .nodes
            .iter()
            .find(|n| n.level == self.max_level)
            .ok_or_else(|| DispatchError::InvalidOperand("graph has no root".to_string()))?;
        let value = root
            .value()
            .ok_or_else(|| DispatchError::InvalidOperand(format!("root {} unresolved", root.id)))?;
        parse_value(value)
    }
}
