//! Expression state machine
//!
//! `Created -> InQueue -> InProgress -> {Done, Error}`. While the expression
//! is active it bounces between `InQueue` and `InProgress`: every claim or
//! report moves it to `InProgress`, and a report that leaves work behind
//! moves it back to `InQueue`.

use shared_types::{ExpressionDetail, ExpressionStatus, ExpressionSummary, TaskReport};
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::error::DispatchError;
use crate::graph::{ClaimedNode, Graph};

#[derive(Debug)]
pub struct Expression {
    id: u64,
    graph: Graph,
    status: ExpressionStatus,
    result: f64,
    error: Option<String>,
}

/// What a successful report did to its expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    /// More nodes remain; the expression stays active.
    Pending,
    Completed { result: f64 },
    Failed { error: String },
}

impl ReportOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReportOutcome::Pending)
    }
}

impl Expression {
    pub fn new(id: u64, graph: Graph) -> Self {
        Self {
            id,
            graph,
            status: ExpressionStatus::Created,
            result: 0.0,
            error: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn status(&self) -> ExpressionStatus {
        self.status
    }

    pub fn result(&self) -> f64 {
        self.result
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Created -> InQueue, making every operator node claimable.
    pub fn enqueue(&mut self) {
        if self.status == ExpressionStatus::Created {
            self.graph.enqueue();
            self.status = ExpressionStatus::InQueue;
        }
    }

    /// Settle an operator-free expression without ever queueing it.
    pub fn finish_as_literal(&mut self) -> Result<bool, DispatchError> {
        match self.graph.literal_value() {
            Some(value) => {
                self.finish(value?);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn begin_inspection(&mut self) {
        if self.status == ExpressionStatus::InQueue {
            self.status = ExpressionStatus::InProgress;
        }
    }

    fn finish(&mut self, result: f64) {
        self.result = result;
        self.status = ExpressionStatus::Done;
    }

    fn requeue(&mut self) {
        if self.status == ExpressionStatus::InProgress {
            self.status = ExpressionStatus::InQueue;
        }
    }

    /// Hand out one dispatchable node, if any.
    pub fn claim(&mut self) -> Result<Option<ClaimedNode>, DispatchError> {
        if self.status.is_terminal() {
            return Ok(None);
        }
        self.begin_inspection();
        self.graph.claim_next()
    }

    /// Apply a worker's report to the node it names.
    ///
    /// A rejected report leaves the expression as it found it, apart from
    /// returning an inspected expression to `InQueue`.
    pub fn apply_report(&mut self, report: &TaskReport) -> Result<ReportOutcome, DispatchError> {
        if self.status.is_terminal() {
            return Err(DispatchError::NodeNotClaimed { node_id: report.id });
        }
        self.begin_inspection();

        let outcome = self.apply_inner(report);
        if outcome.is_err() {
            self.requeue();
        }
        outcome
    }

    fn apply_inner(&mut self, report: &TaskReport) -> Result<ReportOutcome, DispatchError> {
        if let Some(error) = report.error_message() {
            self.graph.fail(report.id, error)?;
            self.error = Some(error.to_string());
            self.status = ExpressionStatus::Error;
            return Ok(ReportOutcome::Failed {
                error: error.to_string(),
            });
        }

        self.graph.resolve(report.id, report.result)?;
        if !self.graph.is_complete() {
            debug!(
                expression_id = self.id,
                node_id = report.id,
                "expression not complete yet"
            );
            self.requeue();
            return Ok(ReportOutcome::Pending);
        }

        let result = self.graph.root_value()?;
        self.finish(result);
        Ok(ReportOutcome::Completed { result })
    }

    pub fn summary(&self) -> ExpressionSummary {
        ExpressionSummary {
            id: self.id,
            status: self.status,
            result: self.result,
            error: self.error.clone(),
        }
    }

    pub fn detail(&self) -> ExpressionDetail {
        ExpressionDetail {
            id: self.id,
            status: self.status,
            result: self.result,
        }
    }
}

/// An expression behind its own lock, shared by the queue and the registry.
#[derive(Debug)]
pub struct SharedExpression {
    id: u64,
    inner: Mutex<Expression>,
}

impl SharedExpression {
    pub fn new(expression: Expression) -> Self {
        Self {
            id: expression.id(),
            inner: Mutex::new(expression),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub async fn lock(&self) -> MutexGuard<'_, Expression> {
        self.inner.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::graph::NodeStatus;

    fn queued(text: &str) -> Expression {
        let mut expression = Expression::new(1, compile(text).unwrap());
        expression.enqueue();
        expression
    }

    #[test]
    fn test_lifecycle_to_done() {
        let mut expression = Expression::new(1, compile("2+3*4").unwrap());
        assert_eq!(expression.status(), ExpressionStatus::Created);
        expression.enqueue();
        assert_eq!(expression.status(), ExpressionStatus::InQueue);

        let mul = expression.claim().unwrap().unwrap();
        assert_eq!((mul.arg1, mul.arg2), (3.0, 4.0));
        assert_eq!(expression.status(), ExpressionStatus::InProgress);
        // `+` waits on `*`.
        assert_eq!(expression.claim().unwrap(), None);

        let outcome = expression
            .apply_report(&TaskReport::success(mul.id, 12.0))
            .unwrap();
        assert_eq!(outcome, ReportOutcome::Pending);
        assert_eq!(expression.status(), ExpressionStatus::InQueue);

        let add = expression.claim().unwrap().unwrap();
        assert_eq!((add.arg1, add.arg2), (2.0, 12.0));
        let outcome = expression
            .apply_report(&TaskReport::success(add.id, 14.0))
            .unwrap();
        assert_eq!(outcome, ReportOutcome::Completed { result: 14.0 });
        assert_eq!(expression.status(), ExpressionStatus::Done);
        assert_eq!(expression.result(), 14.0);
    }

    #[test]
    fn test_error_report_is_terminal() {
        let mut expression = queued("4/0");
        let div = expression.claim().unwrap().unwrap();
        let outcome = expression
            .apply_report(&TaskReport::failure(div.id, "division by zero"))
            .unwrap();
        assert!(outcome.is_terminal());
        assert_eq!(expression.status(), ExpressionStatus::Error);
        assert_eq!(expression.error(), Some("division by zero"));
        assert_eq!(
            expression.graph().node(div.id).unwrap().status,
            NodeStatus::Done
        );
        assert_eq!(expression.claim().unwrap(), None);
    }

    #[test]
    fn test_rejected_report_restores_in_queue() {
        let mut expression = queued("2+3");
        let err = expression
            .apply_report(&TaskReport::success(3, 5.0))
            .unwrap_err();
        assert_eq!(err, DispatchError::NodeNotClaimed { node_id: 3 });
        assert_eq!(expression.status(), ExpressionStatus::InQueue);
    }

    #[test]
    fn test_claim_without_ready_node_still_marks_in_progress() {
        let mut expression = queued("(1+2)*(3+4)");
        expression.claim().unwrap().unwrap();
        expression.claim().unwrap().unwrap();
        expression.requeue();
        assert_eq!(expression.claim().unwrap(), None);
        assert_eq!(expression.status(), ExpressionStatus::InProgress);
    }

    #[test]
    fn test_literal_expression_finishes_immediately() {
        let mut expression = Expression::new(7, compile("7,25").unwrap());
        assert!(expression.finish_as_literal().unwrap());
        assert_eq!(expression.status(), ExpressionStatus::Done);
        assert_eq!(expression.detail().result, 7.25);

        let mut expression = Expression::new(8, compile("1+1").unwrap());
        assert!(!expression.finish_as_literal().unwrap());
        assert_eq!(expression.status(), ExpressionStatus::Created);
    }
}
