//! Scheduler: queue, registry and the claim/report protocol
//!
//! Only the expression at the head of the queue is ever served. Claims and
//! reports both look at the head; other expressions wait until it finishes
//! or fails and is popped.
//!
//! # Locking
//!
//! Three locks, always taken in this order and never the reverse:
//!
//! 1. the queue (with the id counter)
//! 2. the registry, only during submission
//! 3. a single expression
//!
//! A claim releases the queue lock before locking the head expression; the
//! expression lock alone keeps a node from being claimed twice. A report
//! keeps the queue lock while it holds the expression lock, so that a
//! finished expression is marked terminal and popped in one step.

pub mod expression;
pub mod queue;
pub mod registry;

use std::sync::Arc;
use std::time::Duration;

use shared_types::{
    CalculateResponse, ExpressionDetail, ExpressionList, ExpressionStatus, Task, TaskReport,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::compiler;
use crate::error::{CompileError, DispatchError};
use crate::graph::Operator;

pub use expression::{Expression, ReportOutcome, SharedExpression};
pub use queue::ActiveQueue;
pub use registry::Registry;

/// Simulated cost per operator, handed to workers with each task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationLatency {
    pub addition: Duration,
    pub subtraction: Duration,
    pub multiplication: Duration,
    pub division: Duration,
}

impl OperationLatency {
    pub fn uniform(latency: Duration) -> Self {
        Self {
            addition: latency,
            subtraction: latency,
            multiplication: latency,
            division: latency,
        }
    }

    pub fn for_operator(&self, op: Operator) -> Duration {
        match op {
            Operator::Add => self.addition,
            Operator::Sub => self.subtraction,
            Operator::Mul => self.multiplication,
            Operator::Div => self.division,
        }
    }
}

pub struct Scheduler {
    queue: Mutex<ActiveQueue>,
    registry: Registry,
    latency: OperationLatency,
}

impl Scheduler {
    pub fn new(latency: OperationLatency) -> Self {
        Self {
            queue: Mutex::new(ActiveQueue::new()),
            registry: Registry::new(),
            latency,
        }
    }

    /// Compile `text` and make it available to workers.
    ///
    /// A compile failure leaves the scheduler untouched: no id is consumed.
    pub async fn submit(&self, text: &str) -> Result<CalculateResponse, CompileError> {
        let graph = compiler::compile(text)?;
        debug!(
            nodes = graph.len(),
            max_level = graph.max_level(),
            "expression compiled"
        );

        let mut queue = self.queue.lock().await;
        let id = queue.next_id();
        let mut expression = Expression::new(id, graph);

        match expression.finish_as_literal() {
            Ok(true) => {
                let status = expression.status();
                self.registry
                    .insert(Arc::new(SharedExpression::new(expression)))
                    .await;
                info!(expression_id = id, "literal expression settled without workers");
                return Ok(CalculateResponse { id, status });
            }
            Ok(false) => {}
            Err(e) => {
                // Unreachable for compiler output: literals are validated.
                warn!(expression_id = id, error = %e, "literal did not parse");
                return Err(CompileError::InvalidNumberLiteral(text.trim().to_string()));
            }
        }

        expression.enqueue();
        let status = expression.status();
        let shared = Arc::new(SharedExpression::new(expression));
        queue.push_back(Arc::clone(&shared));
        self.registry.insert(shared).await;

        info!(expression_id = id, queue_length = queue.len(), "expression queued");
        Ok(CalculateResponse { id, status })
    }

    /// Claim one ready node of the head expression.
    ///
    /// `Ok(None)` means there is nothing to do right now.
    pub async fn claim(&self) -> Result<Option<Task>, DispatchError> {
        let head = {
            let queue = self.queue.lock().await;
            match queue.head() {
                Some(head) => head,
                None => return Ok(None),
            }
        };

        let mut expression = head.lock().await;
        let Some(claimed) = expression.claim()? else {
            debug!(expression_id = head.id(), "no dispatchable node");
            return Ok(None);
        };

        let operation_time = self.latency.for_operator(claimed.op);
        info!(
            expression_id = head.id(),
            node_id = claimed.id,
            arg1 = claimed.arg1,
            operation = %claimed.op,
            arg2 = claimed.arg2,
            "task dispatched"
        );

        Ok(Some(Task {
            id: claimed.id,
            arg1: claimed.arg1,
            arg2: claimed.arg2,
            operation: claimed.op.symbol().to_string(),
            operation_time,
        }))
    }

    /// Apply a worker report to the head expression.
    pub async fn report(&self, report: &TaskReport) -> Result<ReportOutcome, DispatchError> {
        let mut queue = self.queue.lock().await;
        let head = queue.head().ok_or(DispatchError::QueueEmpty)?;
        let mut expression = head.lock().await;

        let outcome = expression.apply_report(report)?;
        match &outcome {
            ReportOutcome::Pending => {
                debug!(
                    expression_id = head.id(),
                    node_id = report.id,
                    "node resolved"
                );
            }
            ReportOutcome::Completed { result } => {
                queue.pop_head(head.id());
                info!(
                    expression_id = head.id(),
                    result,
                    queue_length = queue.len(),
                    "expression completed"
                );
            }
            ReportOutcome::Failed { error } => {
                queue.pop_head(head.id());
                warn!(
                    expression_id = head.id(),
                    node_id = report.id,
                    error = %error,
                    queue_length = queue.len(),
                    "expression failed"
                );
            }
        }

        Ok(outcome)
    }

    pub async fn list(&self) -> ExpressionList {
        ExpressionList {
            expressions: self.registry.summaries().await,
        }
    }

    pub async fn detail(&self, id: u64) -> Option<ExpressionDetail> {
        self.registry.detail(id).await
    }

    pub async fn status(&self, id: u64) -> Option<ExpressionStatus> {
        self.detail(id).await.map(|d| d.status)
    }

    pub async fn queue_len(&self) -> usize {
        self.queue.lock().await.len()
    }
}
