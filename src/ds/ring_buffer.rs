#![allow(clippy::len_without_is_empty)]
use std::ops::Index;

/// A fixed-capacity ringbuffer that overwrites its oldest element once full
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    buffer: Vec<T>,
    ix: usize,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// **Panics** if `capacity` is zero
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingBuffer capacity must be positive");
        Self {
            buffer: Vec::<T>::with_capacity(capacity),
            ix: 0,
            capacity,
        }
    }

    /// Returns the buffer length
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Insert an element into the buffer, overwriting the oldest element, and return the write index
    pub fn push(&mut self, item: T) -> usize {
        let ix = self.ix;
        if ix >= self.len() {
            self.buffer.push(item);
        } else {
            self.buffer[ix] = item;
        }
        self.ix = (ix + 1) % self.capacity;
        ix
    }

    /// Iterate from the oldest to the newest element
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let split = if self.len() < self.capacity { 0 } else { self.ix };
        self.buffer[split..].iter().chain(self.buffer[..split].iter())
    }

    /// The most recently pushed element
    pub fn last(&self) -> Option<&T> {
        if self.buffer.is_empty() {
            return None;
        }
        let ix = (self.ix + self.capacity - 1) % self.capacity;
        self.buffer.get(ix)
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.ix = 0;
    }
}

impl<T> Index<usize> for RingBuffer<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.buffer[index]
    }
}
