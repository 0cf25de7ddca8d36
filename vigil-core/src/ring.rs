//! Fixed-capacity ring buffer
//!
//! Foundation for every queue in the system: the global event queue and the
//! two link packet queues. Capacity is a power of two so the read position
//! can be derived from the write cursor and item count with a mask.
//!
//! Overflow policy is always "reject the newest": a full buffer hands the
//! item back and keeps its contents.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

/// Circular FIFO of `N` items
#[derive(Debug)]
pub struct RingBuffer<T, const N: usize> {
    slots: [Option<T>; N],
    /// Next write position
    cursor: usize,
    /// Number of stored items
    count: usize,
}

impl<T, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> RingBuffer<T, N> {
    const MASK: usize = N - 1;
    const EMPTY: Option<T> = None;
    const VALID: () = assert!(
        N.is_power_of_two(),
        "ring buffer capacity must be a power of two"
    );

    /// Create an empty ring buffer
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::VALID;
        Self {
            slots: [Self::EMPTY; N],
            cursor: 0,
            count: 0,
        }
    }

    /// Maximum number of items
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of stored items
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if no items are stored
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns true if the next `put` will be rejected
    pub fn is_full(&self) -> bool {
        self.count > Self::MASK
    }

    /// Insert an item at the write cursor
    ///
    /// Returns the item back if the buffer is full; contents are unchanged.
    pub fn put(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }

        self.slots[self.cursor] = Some(item);
        self.cursor = (self.cursor + 1) & Self::MASK;
        self.count += 1;
        Ok(())
    }

    /// Remove and return the oldest item
    pub fn pop(&mut self) -> Option<T> {
        if self.count == 0 {
            return None;
        }

        let index = self.index_of(0);
        self.count -= 1;
        self.slots[index].take()
    }

    /// Borrow the `n`th-oldest item without removing it
    pub fn peek(&self, n: usize) -> Option<&T> {
        if n >= self.count {
            return None;
        }
        self.slots[self.index_of(n)].as_ref()
    }

    /// Drop all stored items
    pub fn clear(&mut self) {
        while self.pop().is_some() {}
    }

    /// Slot index of the `n`th-oldest item
    fn index_of(&self, n: usize) -> usize {
        self.cursor.wrapping_sub(self.count).wrapping_add(n) & Self::MASK
    }
}

/// Ring buffer shared between interrupt and foreground context
///
/// Each operation runs inside the raw mutex `R`; with
/// `CriticalSectionRawMutex` that is a nested interrupt-mask save/restore,
/// so operations may be called from interrupt handlers.
pub struct SharedRing<R: RawMutex, T, const N: usize> {
    inner: Mutex<R, RefCell<RingBuffer<T, N>>>,
}

impl<R: RawMutex, T, const N: usize> Default for SharedRing<R, T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RawMutex, T, const N: usize> SharedRing<R, T, N> {
    /// Create an empty shared ring
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(RingBuffer::new())),
        }
    }

    /// Insert an item; returns it back if the ring is full
    pub fn put(&self, item: T) -> Result<(), T> {
        self.inner.lock(|ring| ring.borrow_mut().put(item))
    }

    /// Remove and return the oldest item
    pub fn pop(&self) -> Option<T> {
        self.inner.lock(|ring| ring.borrow_mut().pop())
    }

    /// Copy out the `n`th-oldest item without removing it
    pub fn peek(&self, n: usize) -> Option<T>
    where
        T: Clone,
    {
        self.inner.lock(|ring| ring.borrow().peek(n).cloned())
    }

    /// Number of stored items
    pub fn len(&self) -> usize {
        self.inner.lock(|ring| ring.borrow().len())
    }

    /// Returns true if no items are stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all stored items
    pub fn clear(&self) {
        self.inner.lock(|ring| ring.borrow_mut().clear())
    }
}
