use std::task::{Poll, Context};
use std::pin::Pin;
use std::sync::Arc;

use futures::{Stream, Future, StreamExt};
use futures::stream::FuturesUnordered;

use pin_project::{pin_project, pinned_drop};

use crate::cancellable_future::CancellableFuture;
use crate::cancellation::Cancellation;
use crate::spawner::{Blocker, Priority, Spawner};
use crate::JoinError;

/// A join-set of tasks spawned on `Sp`. Tasks are yielded in
/// the order they finish by the `Stream` impl. Futures can
/// be spawned using `spawn` or `spawn_cancellable` methods.
///
/// # Exit barrier
///
/// Dropping a group that still has outstanding tasks
/// cancels it and blocks the current thread (through
/// `Blocker`) until every task has been joined. Callers
/// that can await should `cancel` and `drain` instead.
#[pin_project(PinnedDrop)]
pub struct TaskGroup<T, Sp: Spawner<T> + Blocker> {
    len: usize,
    remaining: usize,
    priority: Option<Priority>,
    cancellation: Arc<Cancellation>,
    spawner: Sp,
    #[pin]
    futs: FuturesUnordered<Sp::SpawnHandle>,
}

impl<T: Send + 'static, Sp: Spawner<T> + Blocker> TaskGroup<T, Sp> {
    pub fn new(spawner: Sp) -> Self {
        TaskGroup {
            len: 0,
            remaining: 0,
            priority: None,
            cancellation: Arc::new(Cancellation::new()),
            spawner,
            futs: FuturesUnordered::new(),
        }
    }

    /// Scheduling hint used for every task spawned afterwards.
    pub fn with_priority(mut self, priority: Option<Priority>) -> Self {
        self.priority = priority;
        self
    }

    /// Spawn a future onto the group's spawner.
    pub fn spawn<F: Future<Output=T> + Send + 'static>(&mut self, f: F) {
        let handle = match self.priority {
            Some(priority) => self.spawner.spawn_with_priority(f, priority),
            None => self.spawner.spawn(f),
        };
        self.futs.push(handle);
        self.len += 1;
        self.remaining += 1;
    }

    /// Spawn a cancellable future.
    ///
    /// The future resolves to `cancellation()` instead of
    /// running further once the group is cancelled, either
    /// explicitly via `cancel` or by dropping the group.
    #[inline]
    pub fn spawn_cancellable<F: Future<Output=T> + Send + 'static,
                             Fu: FnOnce() -> T + Send + 'static>(&mut self, f: F, cancellation: Fu) {
        let fut = CancellableFuture::new(self.cancellation.clone(), f, cancellation);
        self.spawn(fut)
    }
}

impl<T, Sp: Spawner<T> + Blocker> TaskGroup<T, Sp> {
    /// Cancel all futures spawned with cancellation.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Total number of futures spawned in this group.
    pub fn len(&self) -> usize { self.len }

    pub fn is_empty(&self) -> bool { self.len == 0 }

    /// Number of futures spawned but not yet joined.
    pub fn remaining(&self) -> usize { self.remaining }

    /// Join every outstanding task, collecting the outputs in
    /// completion order.
    ///
    /// ```
    /// # async_std::task::block_on(async {
    /// use concurrent_filter::TaskGroup;
    /// use concurrent_filter::spawner::use_async_std::AsyncStdSpawner;
    ///
    /// let mut group = TaskGroup::new(AsyncStdSpawner);
    /// for i in 0..3u32 {
    ///     group.spawn(async move { i * 2 });
    /// }
    /// let mut doubled: Vec<u32> = group.collect().await
    ///     .into_iter()
    ///     .map(Result::unwrap)
    ///     .collect();
    /// doubled.sort();
    /// assert_eq!(doubled, vec![0, 2, 4]);
    /// assert_eq!(group.remaining(), 0);
    /// # });
    /// ```
    pub async fn collect(&mut self) -> Vec<Result<T, JoinError>> {
        let mut proc_outputs = Vec::with_capacity(self.remaining);

        while let Some(item) = self.next().await {
            proc_outputs.push(item);
        }

        proc_outputs
    }

    /// Join every outstanding task, discarding the outputs.
    pub async fn drain(&mut self) {
        let mut discarded = 0;
        while self.next().await.is_some() {
            discarded += 1;
        }
        if discarded > 0 {
            log::trace!("drained {} outstanding tasks", discarded);
        }
    }
}

impl<T, Sp: Spawner<T> + Blocker> Stream for TaskGroup<T, Sp> {
    type Item = Result<T, JoinError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context)
                 -> Poll<Option<Self::Item>> {

        let this = self.project();
        let poll = this.futs.poll_next(cx);
        if let Poll::Ready(Some(_)) = poll {
            *this.remaining -= 1;
        }
        poll

    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

#[pinned_drop]
impl<T, Sp: Spawner<T> + Blocker> PinnedDrop for TaskGroup<T, Sp> {
    fn drop(self: Pin<&mut Self>) {
        let this = self.project();
        if *this.remaining == 0 {
            return;
        }
        log::debug!("task group dropped with {} outstanding tasks, cancelling", this.remaining);

        this.cancellation.cancel();
        let mut futs = this.futs;
        this.spawner.block_on(async {
            while futs.next().await.is_some() {}
        });
    }
}

#[cfg(all(test, feature = "use-async-std"))]
mod tests {
    use super::TaskGroup;
    use crate::spawner::use_async_std::AsyncStdSpawner;
    use async_std::task::sleep;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    #[async_std::test]
    async fn yields_in_completion_order() {
        let mut group = TaskGroup::new(AsyncStdSpawner);
        for i in 0..3u64 {
            group.spawn(async move {
                sleep(Duration::from_millis(150 - 50 * i)).await;
                i
            });
        }
        assert_eq!(group.len(), 3);
        assert_eq!(group.remaining(), 3);

        let outputs: Vec<u64> = group.collect().await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect();
        assert_eq!(outputs, vec![2, 1, 0]);
        assert_eq!(group.remaining(), 0);
    }

    #[async_std::test]
    async fn cancel_resolves_pending_tasks() {
        let mut group = TaskGroup::new(AsyncStdSpawner);
        for _ in 0..4 {
            group.spawn_cancellable(async {
                sleep(Duration::from_secs(30)).await;
                false
            }, || true);
        }

        let start = Instant::now();
        group.cancel();
        let outputs = group.collect().await;

        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(outputs.len(), 4);
        assert!(outputs.into_iter().all(|joined| joined.unwrap()));
    }

    /// Dropping a group with work in flight must not leave
    /// anything running behind it.
    #[async_std::test]
    async fn drop_joins_outstanding_tasks() {
        struct Running(Arc<AtomicUsize>);
        impl Drop for Running {
            fn drop(&mut self) {
                self.0.fetch_sub(1, Ordering::SeqCst);
            }
        }

        let running = Arc::new(AtomicUsize::new(0));
        {
            let mut group = TaskGroup::new(AsyncStdSpawner);
            for _ in 0..5 {
                running.fetch_add(1, Ordering::SeqCst);
                let guard = Running(running.clone());
                group.spawn_cancellable(async move {
                    let _guard = guard;
                    sleep(Duration::from_secs(30)).await;
                }, || ());
            }
        }
        assert_eq!(running.load(Ordering::SeqCst), 0);
    }
}
