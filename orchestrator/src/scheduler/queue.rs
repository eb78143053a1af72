//! Arrival-ordered set of expressions still waiting on workers

use std::collections::VecDeque;
use std::sync::Arc;

use super::expression::SharedExpression;

/// Active expressions plus the id counter, guarded together by one lock.
#[derive(Debug, Default)]
pub struct ActiveQueue {
    active: VecDeque<Arc<SharedExpression>>,
    last_id: u64,
}

impl ActiveQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids start at 1 and are never reused.
    pub fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }

    pub fn push_back(&mut self, expression: Arc<SharedExpression>) {
        self.active.push_back(expression);
    }

    /// The only expression eligible for claims and reports.
    pub fn head(&self) -> Option<Arc<SharedExpression>> {
        self.active.front().cloned()
    }

    /// Pop the head, but only if it is still the expression `id`.
    pub fn pop_head(&mut self, id: u64) -> bool {
        match self.active.front() {
            Some(head) if head.id() == id => {
                self.active.pop_front();
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::scheduler::expression::Expression;

    fn shared(queue: &mut ActiveQueue) -> Arc<SharedExpression> {
        let id = queue.next_id();
        Arc::new(SharedExpression::new(Expression::new(
            id,
            compile("1+1").unwrap(),
        )))
    }

    #[test]
    fn test_ids_strictly_increase() {
        let mut queue = ActiveQueue::new();
        assert_eq!(queue.next_id(), 1);
        assert_eq!(queue.next_id(), 2);
        assert_eq!(queue.next_id(), 3);
    }

    #[test]
    fn test_head_is_oldest_and_pop_checks_identity() {
        let mut queue = ActiveQueue::new();
        let first = shared(&mut queue);
        let second = shared(&mut queue);
        queue.push_back(first.clone());
        queue.push_back(second.clone());

        assert_eq!(queue.head().unwrap().id(), first.id());
        assert!(!queue.pop_head(second.id()));
        assert_eq!(queue.len(), 2);
        assert!(queue.pop_head(first.id()));
        assert_eq!(queue.head().unwrap().id(), second.id());
        assert!(queue.pop_head(second.id()));
        assert!(queue.is_empty());
        assert!(queue.head().is_none());
    }
}
