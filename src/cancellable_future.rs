use std::{
    future::Future, pin::Pin,
    sync::Arc,
    task::{Poll, Context}};
use pin_project::{pin_project, pinned_drop};

use crate::cancellation::Cancellation;

/// A wrapper for `Future` to make it cancellable from the
/// task group that spawned it. Once the group is cancelled,
/// the next poll resolves to the output of `cancellation`
/// without polling `fut` again; `fut` is then dropped along
/// with the finished task.
#[pin_project(PinnedDrop)]
pub struct CancellableFuture<I, F: Future<Output=I>, Fu: FnOnce() -> I> {
    key: Option<usize>,
    flag: Arc<Cancellation>,
    cancellation: Option<Fu>,
    #[pin]
    fut: F,
}

impl<I, F: Future<Output=I>, Fu: FnOnce() -> I> CancellableFuture<I, F, Fu> {
    pub fn new(flag: Arc<Cancellation>, fut: F, cancellation: Fu) -> Self {
        CancellableFuture{key: None, flag, fut, cancellation: Some(cancellation)}
    }
}

impl<I, F: Future<Output=I>, Fu: FnOnce() -> I> Future
    for CancellableFuture<I, F, Fu>
{
    type Output = I;

    fn poll(self: Pin<&mut Self>, cx: &mut Context)
            -> Poll<Self::Output> {

        let this = self.project();

        if this.flag.is_cancelled() {
            this.flag.deregister(this.key);
            let cancellation = this.cancellation.take()
                .expect("CancellableFuture polled after completion");
            return Poll::Ready(cancellation());
        }

        let poll_result = this.fut.poll(cx);
        if poll_result.is_ready() {
            this.flag.deregister(this.key);
        } else if !this.flag.register(this.key, cx.waker()) {
            // Cancelled while we were polling `fut`: come back
            // right away to resolve as cancelled.
            cx.waker().wake_by_ref();
        }
        poll_result
    }
}

#[pinned_drop]
impl<I, F: Future<Output=I>, Fu: FnOnce() -> I> PinnedDrop for CancellableFuture<I, F, Fu> {
    fn drop(self: Pin<&mut Self>) {
        let this = self.project();
        this.flag.deregister(this.key);
    }
}
