//! Order-preserving `filter` over a finite sequence, where
//! the inclusion predicate is asynchronous and may fail.
//!
//! ## Motivation
//!
//! Filtering with an async predicate one element at a time
//! leaves the executor idle while each predicate waits.
//! Running every predicate at once fixes that, but makes the
//! output order depend on which predicate finishes first,
//! and nothing bounds the number of tasks. This crate runs
//! the predicates on the executor's thread-pool, optionally
//! under a hard cap, and always returns the kept elements in
//! input order.
//!
//! ## Evaluators
//!
//! - [`serial_filter`] awaits the predicate for each element
//!   in turn. It needs no executor and is the reference
//!   behaviour for the others.
//! - [`concurrent_filter`] spawns one evaluation per element
//!   at once.
//! - [`concurrent_filter_bounded`] keeps at most
//!   `max_concurrent` evaluations in flight, admitting the
//!   next element only once an earlier one has finished.
//!
//! ``` rust
//! # async_std::task::block_on(async {
//! use std::convert::Infallible;
//! use concurrent_filter::{concurrent_filter_bounded, serial_filter};
//!
//! let is_even = |x: &i32| {
//!     let x = *x;
//!     async move { Ok::<_, Infallible>(x % 2 == 0) }
//! };
//! let evens = concurrent_filter_bounded(vec![1, 2, 3, 4, 5], 2, None, is_even).await?;
//! assert_eq!(evens, vec![2, 4]);
//! assert_eq!(serial_filter(vec![1, 2, 3, 4, 5], is_even).await?, evens);
//! # Ok::<(), concurrent_filter::FilterError<Infallible>>(())
//! # }).unwrap();
//! ```
//!
//! Predicates have the shape `Fn(&T) -> Fut`. As with
//! [`futures::StreamExt::filter`], the returned future must
//! not borrow the element; copy out what it needs first.
//!
//! ## Failures
//!
//! The first predicate error observed (by completion, not
//! by position) becomes the result as
//! [`FilterError::Predicate`]; no partial output is
//! returned. The concurrent evaluators fail fast: once an
//! error is seen, no more elements are admitted, the
//! remaining evaluations are cancelled, and every spawned
//! task is joined before the error is returned.
//!
//! ## Executors
//!
//! Evaluations are spawned through a [`TaskGroup`], a
//! join-set over a [`Spawner`]. Enable `use-async-std`
//! (default) or `use-tokio` for a ready-made spawner, or
//! implement [`Spawner`] and [`Blocker`] and drive a
//! [`ConcurrentFilter`] with it. An optional [`Priority`]
//! is passed to the spawner as a scheduling hint.
//!
//! A [`TaskGroup`] dropped with tasks outstanding cancels
//! them and blocks the current thread until they are
//! joined, so no evaluation outlives the call that started
//! it, even when the caller drops the filter future early.
//! With tokio this requires a multi-threaded runtime. Called
//! outside any tokio runtime, the default tokio spawner builds
//! and owns a multi-threaded one.
//!
//! [`TaskGroup`]: task_group::TaskGroup
//! [`Spawner`]: spawner::Spawner
//! [`Blocker`]: spawner::Blocker
//! [`Priority`]: spawner::Priority
#[macro_use]
mod utils;

mod cancellable_future;
mod cancellation;
mod concurrent;
mod error;
mod outcome;
mod predicate;
mod serial;

pub mod spawner;
pub mod task_group;

pub use concurrent::ConcurrentFilter;
pub use error::{FilterError, JoinError};
pub use outcome::{Evaluation, Outcome};
pub use serial::serial_filter;
pub use spawner::{Blocker, Priority, Spawner};
pub use task_group::TaskGroup;

cfg_async_std! {
    /// Spawner used by [`concurrent_filter`] and
    /// [`concurrent_filter_bounded`].
    pub type DefaultSpawner = spawner::use_async_std::AsyncStdSpawner;
}

cfg_async_std_or_else! {
    /// Spawner used by [`concurrent_filter`] and
    /// [`concurrent_filter_bounded`].
    pub type DefaultSpawner = spawner::use_tokio::TokioSpawner;
}

cfg_any_spawner! {
    /// Returns the elements of `items` that satisfy
    /// `predicate`, in order, evaluating every element
    /// concurrently on the [`DefaultSpawner`].
    pub async fn concurrent_filter<I, T, E, F, Fut>(
        items: I,
        priority: Option<Priority>,
        predicate: F,
    ) -> Result<Vec<T>, FilterError<E>>
    where
        I: IntoIterator<Item = T>,
        T: Send + 'static,
        E: Send + 'static,
        F: Fn(&T) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<bool, E>> + Send + 'static,
    {
        ConcurrentFilter::new(DefaultSpawner::default())
            .priority(priority)
            .filter(items, predicate)
            .await
    }

    /// Like [`concurrent_filter`], but with at most
    /// `max_concurrent` evaluations in flight at any time.
    ///
    /// Fails with [`FilterError::InvalidArgument`] when
    /// `max_concurrent` is zero.
    pub async fn concurrent_filter_bounded<I, T, E, F, Fut>(
        items: I,
        max_concurrent: usize,
        priority: Option<Priority>,
        predicate: F,
    ) -> Result<Vec<T>, FilterError<E>>
    where
        I: IntoIterator<Item = T>,
        T: Send + 'static,
        E: Send + 'static,
        F: Fn(&T) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<bool, E>> + Send + 'static,
    {
        ConcurrentFilter::new(DefaultSpawner::default())
            .max_concurrent(max_concurrent)
            .priority(priority)
            .filter(items, predicate)
            .await
    }
}
