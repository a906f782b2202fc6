// LimitedBuffer - fixed-capacity history storage

use std::collections::VecDeque;

/// Errors raised by indexed access into a [`LimitedBuffer`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    #[error("Index {index} out of range for buffer of length {len}")]
    OutOfRange { index: usize, len: usize },
}

/// Ordered sequence with a fixed capacity
///
/// Appending past the capacity evicts the oldest element, so logical
/// indices shift down by one on every eviction.
#[derive(Debug, Clone)]
pub struct LimitedBuffer<T> {
    items: VecDeque<T>,
    limit: usize,
}

impl<T> LimitedBuffer<T> {
    /// Create an empty buffer holding at most `limit` elements
    pub fn new(limit: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(limit),
            limit,
        }
    }

    /// Append at the tail
    ///
    /// Returns `true` if the oldest element had to be evicted.
    pub fn add(&mut self, item: T) -> bool {
        self.items.push_back(item);

        if self.items.len() > self.limit {
            self.items.pop_front();
            return true;
        }

        false
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Read the element at `index`
    pub fn at(&self, index: usize) -> Result<&T, BufferError> {
        self.items.get(index).ok_or(BufferError::OutOfRange {
            index,
            len: self.items.len(),
        })
    }

    /// Remove up to `count` elements starting at `from`
    ///
    /// A start past the end removes nothing. Returns the number of removed elements.
    pub fn splice(&mut self, from: usize, count: usize) -> usize {
        if from >= self.items.len() {
            return 0;
        }

        let end = from.saturating_add(count).min(self.items.len());
        self.items.drain(from..end).count()
    }

    /// Remove every element
    pub fn reset(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}
