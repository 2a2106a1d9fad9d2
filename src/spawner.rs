//! There you can find traits that are necessary for plugging an executor
//! into a [`TaskGroup`](crate::TaskGroup). Evaluations are `'static`, so the
//! only contract on an implementation is that the returned handle resolves
//! once the spawned future has completed and been dropped.
use futures::Future;

use crate::JoinError;

/// Scheduling hint forwarded to the executor when spawning evaluations.
///
/// It never changes which elements are kept or their order. Executors
/// without task priorities ignore it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Priority {
    High,
    Medium,
    Low,
    Background,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

pub trait Spawner<T> {
    type SpawnHandle: Future<Output = Result<T, JoinError>> + Send;

    fn spawn<F: Future<Output = T> + Send + 'static>(&self, f: F) -> Self::SpawnHandle;

    /// Spawn with a scheduling hint. The default ignores the hint.
    fn spawn_with_priority<F: Future<Output = T> + Send + 'static>(
        &self,
        f: F,
        priority: Priority,
    ) -> Self::SpawnHandle {
        log::trace!("spawner has no task priorities, ignoring {:?}", priority);
        self.spawn(f)
    }
}

pub trait Blocker {
    fn block_on<T, F: Future<Output = T>>(&self, f: F) -> T;
}

#[cfg(feature = "use-async-std")]
pub mod use_async_std {
    use super::*;
    use async_std::task::{block_on, spawn};
    use futures::future::{BoxFuture, FutureExt};

    #[derive(Clone, Copy, Debug, Default)]
    pub struct AsyncStdSpawner;

    impl<T: Send + 'static> Spawner<T> for AsyncStdSpawner {
        type SpawnHandle = BoxFuture<'static, Result<T, JoinError>>;

        // `async_std` join handles re-raise panics on their own and never
        // report cancellation.
        fn spawn<F: Future<Output = T> + Send + 'static>(&self, f: F) -> Self::SpawnHandle {
            spawn(f).map(Ok).boxed()
        }
    }

    impl Blocker for AsyncStdSpawner {
        fn block_on<T, F: Future<Output = T>>(&self, f: F) -> T {
            block_on(f)
        }
    }
}

#[cfg(feature = "use-tokio")]
pub mod use_tokio {
    use super::*;
    use futures::future::{BoxFuture, FutureExt};
    use tokio::{
        runtime::{Handle, Runtime},
        task::block_in_place,
    };

    pub struct TokioSpawner(Option<TokioRuntime>);

    impl Clone for TokioSpawner {
        fn clone(&self) -> Self {
            Self(self.0.as_ref().map(|rt| match rt {
                TokioRuntime::ByHandle(handle) => TokioRuntime::ByHandle(handle.clone()),
                TokioRuntime::Owned(runtime) => TokioRuntime::ByHandle(runtime.handle().clone()),
            }))
        }
    }

    const RUNTIME_INVARIANT_ERR: &str =
        "invariant: runtime must be available during the spawner's lifetime";

    impl Drop for TokioSpawner {
        /// Graceful shutdown owned runtime.
        fn drop(&mut self) {
            if let Some(TokioRuntime::Owned(rt)) = self.0.take() {
                rt.shutdown_background()
            }
        }
    }

    impl TokioSpawner {
        pub fn new(rt_handle: Handle) -> Self {
            Self(Some(TokioRuntime::ByHandle(rt_handle)))
        }

        fn handle(&self) -> &Handle {
            match &self.0.as_ref().expect(RUNTIME_INVARIANT_ERR) {
                TokioRuntime::ByHandle(handle) => handle,
                TokioRuntime::Owned(runtime) => runtime.handle(),
            }
        }
    }

    /// Variants of supplied tokio runtime.
    /// Is needed because runtime can be either passed or created.
    enum TokioRuntime {
        /// User provides its own runtime, we'll refer to it by handle.
        ByHandle(Handle),
        /// We've created our own ad-hoc runtime, so we'll own it.
        Owned(Runtime),
    }

    // By default, `TokioSpawner` operates on globally available runtime.
    // Ad-hoc runtime would only be created if it is not available globally.
    // It is multi-threaded so its workers drive spawned tasks without anyone
    // calling `block_on` on it. Newly created runtime would be destroyed when
    // spawner is gone.
    impl Default for TokioSpawner {
        fn default() -> Self {
            if let Ok(handle) = Handle::try_current() {
                return Self(Some(TokioRuntime::ByHandle(handle)));
            }
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .expect("failed to build an ad-hoc tokio runtime");
            Self(Some(TokioRuntime::Owned(runtime)))
        }
    }

    impl<T: Send + 'static> Spawner<T> for TokioSpawner {
        type SpawnHandle = BoxFuture<'static, Result<T, JoinError>>;

        fn spawn<F: Future<Output = T> + Send + 'static>(&self, f: F) -> Self::SpawnHandle {
            self.handle()
                .spawn(f)
                .map(|joined| {
                    joined.map_err(|err| {
                        // Surface panics the way an `async_std` handle does.
                        if err.is_panic() {
                            std::panic::resume_unwind(err.into_panic())
                        }
                        JoinError::Cancelled
                    })
                })
                .boxed()
        }
    }

    impl Blocker for TokioSpawner {
        /// Block the current thread on `f` via `block_in_place`.
        ///
        /// # Panics
        ///
        /// Panics when called from within a current-thread tokio
        /// runtime, including the default `#[tokio::test]` flavor.
        /// A [`TaskGroup`](crate::TaskGroup) calls this when dropped
        /// with tasks outstanding, e.g. when a filter future is
        /// dropped mid-flight.
        fn block_on<T, F: Future<Output = T>>(&self, f: F) -> T {
            block_in_place(|| match self.0.as_ref().expect(RUNTIME_INVARIANT_ERR) {
                TokioRuntime::ByHandle(handle) => handle.block_on(f),
                // if runtime is owned, `block_on` must be called directly on it,
                // not via it's handle. Otherwise, future won't be able to run IO-tasks.
                TokioRuntime::Owned(runtime) => runtime.block_on(f),
            })
        }
    }
}
