//! Bounded heap for generator state
//!
//! The core has a small fixed heap and no garbage collection. Generator
//! state is charged against it for the lifetime of a [`HeapBox`]; the charge
//! is returned when the box is freed or leaves scope, so a generation pass
//! can never leak heap between connection blocks.

use core::cell::Cell;
use core::ops::{Deref, DerefMut};

use crate::error::{ConnectError, Result};

/// Allocation granularity of the heap
pub const WORD_BYTES: usize = 4;

/// Fixed-capacity heap that generator handles are charged against
#[derive(Debug)]
pub struct GeneratorHeap {
    capacity: usize,
    in_use: Cell<usize>,
    live: Cell<usize>,
    peak: Cell<usize>,
}

impl GeneratorHeap {
    /// Create a heap of `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            in_use: Cell::new(0),
            live: Cell::new(0),
            peak: Cell::new(0),
        }
    }

    /// Move `value` into heap-charged storage
    ///
    /// Fails with [`ConnectError::OutOfMemory`] when the heap cannot hold
    /// the value; there is no partial allocation.
    pub fn alloc<T>(&self, value: T) -> Result<HeapBox<'_, T>> {
        let size = Self::charge_for::<T>();
        let available = self.available();
        if size > available {
            log::error!(
                "Generator heap exhausted: {} bytes requested, {} free",
                size,
                available
            );
            return Err(ConnectError::OutOfMemory {
                requested: size,
                available,
                capacity: self.capacity,
            });
        }
        let in_use = self.in_use.get() + size;
        self.in_use.set(in_use);
        self.live.set(self.live.get() + 1);
        self.peak.set(self.peak.get().max(in_use));
        Ok(HeapBox { value, size, heap: self })
    }

    /// Total capacity in bytes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes currently charged
    pub fn in_use(&self) -> usize {
        self.in_use.get()
    }

    /// Bytes still free
    pub fn available(&self) -> usize {
        self.capacity - self.in_use.get()
    }

    /// Number of allocations not yet released
    pub fn live_allocations(&self) -> usize {
        self.live.get()
    }

    /// High-water mark of charged bytes
    pub fn peak(&self) -> usize {
        self.peak.get()
    }

    fn charge_for<T>() -> usize {
        let size = core::mem::size_of::<T>().max(1);
        size.div_ceil(WORD_BYTES) * WORD_BYTES
    }

    fn release(&self, size: usize) {
        self.in_use.set(self.in_use.get() - size);
        self.live.set(self.live.get() - 1);
    }
}

/// Owned value charged against a [`GeneratorHeap`]
#[derive(Debug)]
pub struct HeapBox<'h, T> {
    value: T,
    size: usize,
    heap: &'h GeneratorHeap,
}

impl<'h, T> HeapBox<'h, T> {
    /// Bytes charged for this allocation
    pub fn charged(&self) -> usize {
        self.size
    }

    /// Release the allocation
    pub fn free(self) {
        drop(self)
    }
}

impl<T> Deref for HeapBox<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for HeapBox<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T> Drop for HeapBox<'_, T> {
    fn drop(&mut self) {
        self.heap.release(self.size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_and_free() {
        let heap = GeneratorHeap::new(64);
        let a = heap.alloc(5u32).unwrap();
        let b = heap.alloc([0u8; 5]).unwrap();
        assert_eq!(a.charged(), 4);
        // rounded up to whole words
        assert_eq!(b.charged(), 8);
        assert_eq!(heap.in_use(), 12);
        assert_eq!(heap.live_allocations(), 2);

        a.free();
        assert_eq!(heap.in_use(), 8);
        drop(b);
        assert_eq!(heap.in_use(), 0);
        assert_eq!(heap.live_allocations(), 0);
        assert_eq!(heap.peak(), 12);
    }

    #[test]
    fn test_exhaustion_is_reported() {
        let heap = GeneratorHeap::new(8);
        let _held = heap.alloc(1u64).unwrap();
        let err = heap.alloc(1u32).unwrap_err();
        assert_eq!(
            err,
            ConnectError::OutOfMemory { requested: 4, available: 0, capacity: 8 }
        );
        assert_eq!(heap.live_allocations(), 1);
    }

    #[test]
    fn test_deref_mut() {
        let heap = GeneratorHeap::new(16);
        let mut counter = heap.alloc(0u32).unwrap();
        *counter += 3;
        assert_eq!(*counter, 3);
    }
}
