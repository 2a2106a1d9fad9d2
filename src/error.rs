use thiserror::Error;

/// Why a spawned evaluation produced no value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    /// The task was cancelled before it produced a value, by the
    /// runtime or by its task group.
    #[error("evaluation task was cancelled before completing")]
    Cancelled,
}

/// Failure of a whole filtering call.
#[derive(Debug, Error)]
pub enum FilterError<E> {
    /// The first predicate failure observed, unchanged.
    #[error("predicate failed: {0}")]
    Predicate(E),
    #[error("max_concurrent must be at least 1, got {max_concurrent}")]
    InvalidArgument { max_concurrent: usize },
    #[error(transparent)]
    Join(#[from] JoinError),
}

impl<E> FilterError<E> {
    /// The predicate's error, if that is what stopped the call.
    pub fn into_predicate(self) -> Option<E> {
        match self {
            FilterError::Predicate(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FilterError, JoinError};

    #[test]
    fn messages() {
        let err: FilterError<&str> = FilterError::Predicate("boom");
        assert_eq!(err.to_string(), "predicate failed: boom");

        let err: FilterError<&str> = FilterError::InvalidArgument { max_concurrent: 0 };
        assert_eq!(err.to_string(), "max_concurrent must be at least 1, got 0");

        let err: FilterError<&str> = JoinError::Cancelled.into();
        assert_eq!(err.to_string(), "evaluation task was cancelled before completing");
        assert_eq!(err.into_predicate(), None);
    }
}
