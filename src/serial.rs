use std::future::Future;

use crate::predicate::Invoker;
use crate::FilterError;

/// Returns the elements of `items` that satisfy `predicate`, in
/// order, evaluating one element at a time.
///
/// Stops at the first predicate failure; later elements are not
/// evaluated. This needs no executor, and the predicate need not
/// be `Send` or `'static`.
pub async fn serial_filter<I, T, E, F, Fut>(items: I, predicate: F) -> Result<Vec<T>, FilterError<E>>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
{
    let invoker = Invoker::new(predicate);
    let items = items.into_iter();
    let mut kept = Vec::with_capacity(items.size_hint().0);

    for item in items {
        let verdict = invoker.call(&item);
        if verdict.await.map_err(FilterError::Predicate)? {
            kept.push(item);
        }
    }

    Ok(kept)
}
