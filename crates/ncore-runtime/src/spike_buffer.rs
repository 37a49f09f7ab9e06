//! Bounded spike input buffer
//!
//! The packet handler pushes pre-neuron indices; spike processing pops them
//! between ticks. Both sides work through `&self`, so a packet arriving in
//! the middle of processing never waits.

use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use crossbeam::queue::ArrayQueue;

/// Lock-free bounded queue of incoming spikes with overflow accounting
#[derive(Debug)]
pub struct SpikeInputBuffer {
    queue: ArrayQueue<u32>,
    received: AtomicU32,
    overflows: AtomicU32,
    max_filled: AtomicUsize,
}

impl SpikeInputBuffer {
    /// Create a buffer holding up to `capacity` spikes
    ///
    /// `capacity` must be non-zero.
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: ArrayQueue::new(capacity),
            received: AtomicU32::new(0),
            overflows: AtomicU32::new(0),
            max_filled: AtomicUsize::new(0),
        }
    }

    /// Accept a spike from pre-neuron `pre`
    ///
    /// Returns `false` and counts an overflow when the buffer is full.
    pub fn push(&self, pre: u32) -> bool {
        self.received.fetch_add(1, Ordering::Relaxed);
        match self.queue.push(pre) {
            Ok(()) => {
                self.max_filled.fetch_max(self.queue.len(), Ordering::Relaxed);
                true
            }
            Err(_) => {
                self.overflows.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Take the oldest buffered spike
    pub fn pop(&self) -> Option<u32> {
        self.queue.pop()
    }

    /// Discard every buffered spike, returning how many were dropped
    pub fn clear(&self) -> u32 {
        let mut dropped = 0;
        while self.queue.pop().is_some() {
            dropped += 1;
        }
        dropped
    }

    /// Spikes currently buffered
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether no spikes are buffered
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Buffer capacity
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Spikes offered to the buffer, accepted or not
    pub fn received(&self) -> u32 {
        self.received.load(Ordering::Relaxed)
    }

    /// Spikes rejected because the buffer was full
    pub fn overflows(&self) -> u32 {
        self.overflows.load(Ordering::Relaxed)
    }

    /// Highest fill level seen
    pub fn max_filled(&self) -> usize {
        self.max_filled.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_is_counted() {
        let buffer = SpikeInputBuffer::new(2);
        assert!(buffer.push(1));
        assert!(buffer.push(2));
        assert!(!buffer.push(3));
        assert_eq!(buffer.received(), 3);
        assert_eq!(buffer.overflows(), 1);
        assert_eq!(buffer.max_filled(), 2);

        assert_eq!(buffer.pop(), Some(1));
        assert_eq!(buffer.clear(), 1);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_concurrent_producers() {
        let buffer = SpikeInputBuffer::new(1024);
        std::thread::scope(|scope| {
            for offset in 0..4 {
                let buffer = &buffer;
                scope.spawn(move || {
                    for i in 0..100 {
                        buffer.push(offset * 100 + i);
                    }
                });
            }
        });
        assert_eq!(buffer.len(), 400);
        assert_eq!(buffer.overflows(), 0);
    }
}
