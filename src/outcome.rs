/// Result of evaluating the predicate on one element.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome<T, E> {
    /// The predicate accepted the element; it is handed back
    /// so it can be placed in the output.
    Kept(T),
    Dropped,
    Failed(E),
    /// The task was stopped by its group before the predicate
    /// settled.
    Cancelled,
}

impl<T, E> Outcome<T, E> {
    pub fn from_verdict(verdict: Result<bool, E>, item: T) -> Self {
        match verdict {
            Ok(true) => Outcome::Kept(item),
            Ok(false) => Outcome::Dropped,
            Err(err) => Outcome::Failed(err),
        }
    }
}

/// What a single spawned evaluation reports back: the element's
/// input position and its outcome.
pub type Evaluation<T, E> = (usize, Outcome<T, E>);

enum Slot<T> {
    Pending,
    Kept(T),
    Dropped,
}

/// Index-keyed outcomes of one filtering call. A slot is
/// reserved when its element is admitted and written once
/// when the evaluation comes back.
pub(crate) struct ResultBuffer<T> {
    slots: Vec<Slot<T>>,
    settled: usize,
}

impl<T> ResultBuffer<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        ResultBuffer {
            slots: Vec::with_capacity(capacity),
            settled: 0,
        }
    }

    /// Reserve the next slot, returning its index.
    pub(crate) fn admit(&mut self) -> usize {
        self.slots.push(Slot::Pending);
        self.slots.len() - 1
    }

    pub(crate) fn keep(&mut self, index: usize, item: T) {
        self.settle(index, Slot::Kept(item));
    }

    pub(crate) fn discard(&mut self, index: usize) {
        self.settle(index, Slot::Dropped);
    }

    fn settle(&mut self, index: usize, value: Slot<T>) {
        let slot = &mut self.slots[index];
        debug_assert!(matches!(slot, Slot::Pending), "slot {} settled twice", index);
        *slot = value;
        self.settled += 1;
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.settled == self.slots.len()
    }

    /// Kept elements in admission order.
    pub(crate) fn into_kept(self) -> Vec<T> {
        debug_assert!(self.is_complete(), "reading an incomplete result buffer");
        self.slots
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Kept(item) => Some(item),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Outcome, ResultBuffer};

    #[test]
    fn verdicts_map_to_outcomes() {
        assert_eq!(Outcome::<_, ()>::from_verdict(Ok(true), 'a'), Outcome::Kept('a'));
        assert_eq!(Outcome::<_, ()>::from_verdict(Ok(false), 'a'), Outcome::Dropped);
        assert_eq!(Outcome::from_verdict(Err("boom"), 'a'), Outcome::Failed("boom"));
    }

    #[test]
    fn out_of_order_settlement_reads_back_in_index_order() {
        let mut buffer = ResultBuffer::with_capacity(4);
        let indices: Vec<usize> = (0..4).map(|_| buffer.admit()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);

        buffer.keep(3, "d");
        buffer.discard(1);
        assert!(!buffer.is_complete());
        buffer.keep(0, "a");
        buffer.keep(2, "c");
        assert!(buffer.is_complete());

        assert_eq!(buffer.into_kept(), vec!["a", "c", "d"]);
    }

    #[test]
    #[should_panic(expected = "settled twice")]
    #[cfg(debug_assertions)]
    fn double_settlement_is_caught() {
        let mut buffer = ResultBuffer::with_capacity(1);
        buffer.admit();
        buffer.keep(0, 1);
        buffer.discard(0);
    }
}
