use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::task::Waker;
use slab::Slab;

/// Shared cancellation flag of a task group, together with
/// the wakers of every task currently parked under it.
pub struct Cancellation {
    flag: AtomicBool,
    read_wakers: Mutex<Slab<Waker>>,
}

impl Cancellation {
    pub fn new() -> Self {
        Cancellation {
            flag: AtomicBool::new(false),
            read_wakers: Mutex::new(Slab::new()),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Trigger cancellation: raise the flag and wake all
    /// futures registered with us. Idempotent.
    pub fn cancel(&self) {
        let mut list = self.wakers();
        if self.flag.swap(true, Ordering::AcqRel) { return; }

        // At this point, the read_wakers list is stable.
        // No more wakers could be added any more (as the flag is set).
        for w in list.drain() {
            w.wake();
        }
    }

    /// Record `waker` under `key`, allocating a slot on the
    /// first call. Returns `false` without registering if
    /// cancellation has already happened.
    pub fn register(&self, key: &mut Option<usize>, waker: &Waker) -> bool {
        let mut list = self.wakers();
        // Checked under the lock so that `cancel` cannot slip
        // in between the check and the insertion.
        if self.flag.load(Ordering::Acquire) { return false; }

        match *key {
            Some(id) if list.contains(id) => {
                if !list[id].will_wake(waker) {
                    list[id] = waker.clone();
                }
            }
            _ => *key = Some(list.insert(waker.clone())),
        }
        true
    }

    pub fn deregister(&self, key: &mut Option<usize>) {
        if let Some(id) = key.take() {
            let mut list = self.wakers();
            if list.contains(id) {
                list.remove(id);
            }
        }
    }

    fn wakers(&self) -> MutexGuard<'_, Slab<Waker>> {
        // Nothing panics while holding this lock, but a
        // poisoned registry is still a usable registry.
        self.read_wakers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Cancellation::new()
    }
}

#[cfg(test)]
mod tests {
    use super::Cancellation;
    use futures::task::{waker, ArcWake};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingWaker(AtomicUsize);

    impl ArcWake for CountingWaker {
        fn wake_by_ref(arc_self: &Arc<Self>) {
            arc_self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn cancel_wakes_registered_once() {
        let counter = Arc::new(CountingWaker::default());
        let w = waker(counter.clone());
        let cancellation = Cancellation::new();

        let mut key = None;
        assert!(cancellation.register(&mut key, &w));
        assert!(cancellation.register(&mut key, &w));
        assert!(key.is_some());

        cancellation.cancel();
        cancellation.cancel();
        assert!(cancellation.is_cancelled());
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);

        let mut late = None;
        assert!(!cancellation.register(&mut late, &w));
        assert!(late.is_none());
    }

    #[test]
    fn deregistered_wakers_are_not_woken() {
        let counter = Arc::new(CountingWaker::default());
        let w = waker(counter.clone());
        let cancellation = Cancellation::new();

        let mut key = None;
        cancellation.register(&mut key, &w);
        cancellation.deregister(&mut key);
        assert!(key.is_none());

        cancellation.cancel();
        assert_eq!(counter.0.load(Ordering::SeqCst), 0);
    }
}
