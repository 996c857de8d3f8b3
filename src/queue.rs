use std::collections::VecDeque;
use std::fmt;

use crate::error::{LmcError, Result};
use crate::Word;

/// Unbounded FIFO channel used for machine input and output.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Queue {
    items: VecDeque<Word>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, value: Word) {
        self.items.push_back(value);
    }

    /// Fails immediately when empty, there is nothing to wait for.
    pub fn dequeue(&mut self) -> Result<Word> {
        self.items.pop_front().ok_or(LmcError::EmptyQueue)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Copy of the queued values, head first.
    pub fn snapshot(&self) -> Vec<Word> {
        self.items.iter().copied().collect()
    }
}

impl FromIterator<Word> for Queue {
    fn from_iter<I: IntoIterator<Item = Word>>(iter: I) -> Self {
        Queue {
            items: iter.into_iter().collect(),
        }
    }
}

impl Extend<Word> for Queue {
    fn extend<I: IntoIterator<Item = Word>>(&mut self, iter: I) {
        self.items.extend(iter)
    }
}

impl fmt::Display for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, value) in self.items.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_in_first_out() {
        let mut queue = Queue::new();
        queue.enqueue(3);
        queue.enqueue(1);
        queue.enqueue(4);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.dequeue(), Ok(3));
        assert_eq!(queue.dequeue(), Ok(1));
        assert_eq!(queue.dequeue(), Ok(4));
        assert!(queue.is_empty());
    }

    #[test]
    fn dequeue_on_empty_fails() {
        let mut queue: Queue = [7].into_iter().collect();
        assert_eq!(queue.dequeue(), Ok(7));
        assert_eq!(queue.dequeue(), Err(LmcError::EmptyQueue));
        // Still usable afterwards
        queue.enqueue(8);
        assert_eq!(queue.dequeue(), Ok(8));
    }

    #[test]
    fn displays_as_list() {
        let queue: Queue = [1, 22, 333].into_iter().collect();
        assert_eq!(queue.to_string(), "[1, 22, 333]");
        assert_eq!(Queue::new().to_string(), "[]");
        assert_eq!(queue.snapshot(), vec![1, 22, 333]);
    }
}
