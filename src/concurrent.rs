use std::future::Future;
use std::sync::Arc;

use futures::StreamExt;

use crate::outcome::{Evaluation, Outcome, ResultBuffer};
use crate::predicate::Invoker;
use crate::spawner::{Blocker, Priority, Spawner};
use crate::task_group::TaskGroup;
use crate::{FilterError, JoinError};

/// Filters a sequence by spawning one evaluation per element
/// onto `Sp`, optionally capping how many run at once.
///
/// Kept elements always come back in input order. The first
/// predicate failure observed (by completion, not by position)
/// is returned; every other evaluation is then cancelled and
/// joined before the call returns.
#[derive(Clone, Debug)]
pub struct ConcurrentFilter<Sp> {
    spawner: Sp,
    max_concurrent: Option<usize>,
    priority: Option<Priority>,
}

impl<Sp: Default> Default for ConcurrentFilter<Sp> {
    fn default() -> Self {
        ConcurrentFilter::new(Sp::default())
    }
}

impl<Sp> ConcurrentFilter<Sp> {
    /// Unbounded filter on `spawner`.
    pub fn new(spawner: Sp) -> Self {
        ConcurrentFilter {
            spawner,
            max_concurrent: None,
            priority: None,
        }
    }

    /// Never run more than `limit` evaluations at once. A limit
    /// of zero is rejected when `filter` is called.
    pub fn max_concurrent(mut self, limit: usize) -> Self {
        self.max_concurrent = Some(limit);
        self
    }

    pub fn priority(mut self, priority: Option<Priority>) -> Self {
        self.priority = priority;
        self
    }

    pub async fn filter<I, T, E, F, Fut>(&self, items: I, predicate: F) -> Result<Vec<T>, FilterError<E>>
    where
        Sp: Spawner<Evaluation<T, E>> + Blocker + Clone,
        I: IntoIterator<Item = T>,
        T: Send + 'static,
        E: Send + 'static,
        F: Fn(&T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool, E>> + Send + 'static,
    {
        if self.max_concurrent == Some(0) {
            return Err(FilterError::InvalidArgument { max_concurrent: 0 });
        }

        let items = items.into_iter();
        let mut buffer = ResultBuffer::with_capacity(items.size_hint().0);
        let mut group = TaskGroup::new(self.spawner.clone()).with_priority(self.priority);
        let invoker = Arc::new(Invoker::new(predicate));

        log::debug!("filtering with max_concurrent={:?}, priority={:?}", self.max_concurrent, self.priority);

        for item in items {
            if let Some(limit) = self.max_concurrent {
                // Throttle point: the budget is full, so one
                // evaluation has to finish before the next starts.
                if group.remaining() >= limit {
                    log::trace!("{} evaluations in flight, waiting for one", group.remaining());
                    if let Some(joined) = group.next().await {
                        if let Err(err) = settle(&mut buffer, joined) {
                            return abort(group, err).await;
                        }
                    }
                }
            }

            let index = buffer.admit();
            log::trace!("admitting element {}", index);
            group.spawn_cancellable(
                invoker.clone().evaluate(index, item),
                move || (index, Outcome::Cancelled),
            );
        }

        while let Some(joined) = group.next().await {
            if let Err(err) = settle(&mut buffer, joined) {
                return abort(group, err).await;
            }
        }

        log::debug!("evaluated {} elements", group.len());
        Ok(buffer.into_kept())
    }
}

/// Record one joined evaluation, or turn it into the error that
/// ends the call.
fn settle<T, E>(
    buffer: &mut ResultBuffer<T>,
    joined: Result<Evaluation<T, E>, JoinError>,
) -> Result<(), FilterError<E>> {
    let (index, outcome) = joined?;
    match outcome {
        Outcome::Kept(item) => buffer.keep(index, item),
        Outcome::Dropped => buffer.discard(index),
        Outcome::Failed(err) => return Err(FilterError::Predicate(err)),
        // Only produced once `abort` has cancelled the group.
        Outcome::Cancelled => return Err(JoinError::Cancelled.into()),
    }
    Ok(())
}

/// Fail fast: stop every outstanding evaluation and join it,
/// discarding outcomes, before reporting `err`.
async fn abort<T, E, Sp>(mut group: TaskGroup<Evaluation<T, E>, Sp>, err: FilterError<E>) -> Result<Vec<T>, FilterError<E>>
where
    T: Send + 'static,
    E: Send + 'static,
    Sp: Spawner<Evaluation<T, E>> + Blocker,
{
    log::debug!("cancelling {} outstanding evaluations after failure", group.remaining());
    group.cancel();
    group.drain().await;
    Err(err)
}

#[cfg(all(test, feature = "use-async-std"))]
mod tests {
    use super::ConcurrentFilter;
    use crate::spawner::use_async_std::AsyncStdSpawner;
    use crate::FilterError;
    use futures::future;

    #[async_std::test]
    async fn zero_limit_is_rejected_before_evaluating() {
        let filter = ConcurrentFilter::new(AsyncStdSpawner).max_concurrent(0);
        let result = filter.filter(vec![1, 2, 3], |_: &i32| -> future::Ready<Result<bool, ()>> {
            panic!("predicate must not run")
        }).await;

        match result {
            Err(FilterError::InvalidArgument { max_concurrent }) => assert_eq!(max_concurrent, 0),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[async_std::test]
    async fn filter_is_reusable() {
        let filter = ConcurrentFilter::new(AsyncStdSpawner).max_concurrent(2);
        for _ in 0..3 {
            let odds = filter.filter(1..=7u32, |x: &u32| future::ready(Ok::<_, ()>(x % 2 == 1))).await;
            assert_eq!(odds.unwrap(), vec![1, 3, 5, 7]);
        }
    }
}
