//! Durable record of every expression ever accepted

use std::collections::BTreeMap;
use std::sync::Arc;

use shared_types::{ExpressionDetail, ExpressionSummary};
use tokio::sync::Mutex;

use super::expression::SharedExpression;

/// Expressions by id. Entries are never removed; terminal expressions stay
/// here for queries after they leave the queue.
#[derive(Debug, Default)]
pub struct Registry {
    entries: Mutex<BTreeMap<u64, Arc<SharedExpression>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, expression: Arc<SharedExpression>) {
        self.entries.lock().await.insert(expression.id(), expression);
    }

    pub async fn get(&self, id: u64) -> Option<Arc<SharedExpression>> {
        self.entries.lock().await.get(&id).cloned()
    }

    /// All summaries in ascending id order.
    ///
    /// The registry lock is released before any expression lock is taken.
    pub async fn summaries(&self) -> Vec<ExpressionSummary> {
        let expressions: Vec<Arc<SharedExpression>> =
            self.entries.lock().await.values().cloned().collect();

        let mut out = Vec::with_capacity(expressions.len());
        for expression in expressions {
            out.push(expression.lock().await.summary());
        }
        out
    }

    pub async fn detail(&self, id: u64) -> Option<ExpressionDetail> {
        let expression = self.get(id).await?;
        let detail = expression.lock().await.detail();
        Some(detail)
    }
}
