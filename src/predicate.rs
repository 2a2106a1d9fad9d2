use std::future::Future;
use std::sync::Arc;

use crate::outcome::{Evaluation, Outcome};

/// Calls the caller's predicate for one element at a time.
///
/// Predicates have the shape `Fn(&T) -> Fut`. The future they
/// return may not borrow the element, so a kept element can be
/// moved back out of the evaluation afterwards.
pub(crate) struct Invoker<F> {
    predicate: F,
}

impl<F> Invoker<F> {
    pub(crate) fn new(predicate: F) -> Self {
        Invoker { predicate }
    }

    /// Invoke the predicate exactly once. Errors pass through
    /// untouched.
    pub(crate) fn call<T, E, Fut>(&self, item: &T) -> Fut
    where
        F: Fn(&T) -> Fut,
        Fut: Future<Output = Result<bool, E>>,
    {
        (self.predicate)(item)
    }

    /// Body of one spawned evaluation: run the predicate on
    /// `item` and tag the outcome with its input position.
    pub(crate) async fn evaluate<T, E, Fut>(self: Arc<Self>, index: usize, item: T) -> Evaluation<T, E>
    where
        F: Fn(&T) -> Fut,
        Fut: Future<Output = Result<bool, E>>,
    {
        let verdict = self.call(&item);
        (index, Outcome::from_verdict(verdict.await, item))
    }
}

#[cfg(test)]
mod tests {
    use super::Invoker;
    use crate::outcome::Outcome;
    use futures::future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[async_std::test]
    async fn evaluate_tags_outcome_with_index() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let invoker = Arc::new(Invoker::new(move |x: &i32| {
            counter.fetch_add(1, Ordering::SeqCst);
            future::ready(if *x < 0 { Err("negative") } else { Ok(*x % 2 == 0) })
        }));

        assert_eq!(invoker.clone().evaluate(4, 10).await, (4, Outcome::Kept(10)));
        assert_eq!(invoker.clone().evaluate(5, 11).await, (5, Outcome::Dropped));
        assert_eq!(invoker.clone().evaluate(6, -1).await, (6, Outcome::Failed("negative")));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
