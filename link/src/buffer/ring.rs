//! Growable ring storage used by [`LinkBuffer`](super::LinkBuffer).
//!
//! `Ring` owns the slots and the two wrapping cursors. It performs no locking of
//! its own; the buffer keeps it behind its mutex.
//!
//! One slot is always left empty, so `start == end` only ever means "empty". A
//! push that would make the cursors meet grows the storage first.

use std::fmt;

/// Smallest slot count able to hold one payload next to the reserved slot.
pub(crate) const MIN_CAPACITY: usize = 2;

pub(crate) struct Ring<T> {
  slots: Box<[Option<T>]>,
  /// Oldest occupied slot.
  start: usize,
  /// Next free slot.
  end: usize,
}

impl<T> fmt::Debug for Ring<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Ring")
      .field("capacity", &self.capacity())
      .field("start", &self.start)
      .field("end", &self.end)
      .field("len", &self.len())
      .finish()
  }
}

fn empty_slots<T>(capacity: usize) -> Box<[Option<T>]> {
  std::iter::repeat_with(|| None).take(capacity).collect()
}

impl<T> Ring<T> {
  /// Creates a ring with `capacity` slots, rounded up to [`MIN_CAPACITY`].
  pub(crate) fn with_capacity(capacity: usize) -> Self {
    Self {
      slots: empty_slots(capacity.max(MIN_CAPACITY)),
      start: 0,
      end: 0,
    }
  }

  #[inline]
  pub(crate) fn capacity(&self) -> usize {
    self.slots.len()
  }

  #[inline]
  pub(crate) fn len(&self) -> usize {
    let cap = self.capacity();
    (self.end + cap - self.start) % cap
  }

  #[inline]
  pub(crate) fn is_empty(&self) -> bool {
    self.start == self.end
  }

  /// True when one more push would land on the reserved slot.
  #[inline]
  fn is_full(&self) -> bool {
    (self.end + 1) % self.capacity() == self.start
  }

  /// Appends `item` at the back, doubling the storage first if needed.
  ///
  /// Returns the new capacity when a growth happened.
  pub(crate) fn push(&mut self, item: T) -> Option<usize> {
    let grown = if self.is_full() {
      self.grow();
      Some(self.capacity())
    } else {
      None
    };

    debug_assert!(self.slots[self.end].is_none());
    self.slots[self.end] = Some(item);
    self.end = (self.end + 1) % self.capacity();
    grown
  }

  /// Removes the oldest payload.
  pub(crate) fn pop(&mut self) -> Option<T> {
    if self.is_empty() {
      return None;
    }
    let item = self.slots[self.start].take();
    debug_assert!(item.is_some());
    self.start = (self.start + 1) % self.capacity();
    item
  }

  /// Doubles the slot count, relocating the occupied range to `0..len` in
  /// logical order. Only called when the ring is full.
  fn grow(&mut self) {
    let old_cap = self.capacity();
    let mut slots = empty_slots(old_cap * 2);

    // Occupied range is [start, end) modulo old_cap: tail segment first, then
    // the wrapped head segment.
    let (tail, head) = if self.end >= self.start {
      (self.start..self.end, 0..0)
    } else {
      (self.start..old_cap, 0..self.end)
    };
    for (dst, src) in tail.chain(head).enumerate() {
      slots[dst] = self.slots[src].take();
    }

    self.slots = slots;
    self.start = 0;
    self.end = old_cap - 1;
  }

  /// Moves every buffered payload out, oldest first.
  pub(crate) fn drain(&mut self) -> Vec<T> {
    let mut out = Vec::with_capacity(self.len());
    while let Some(item) = self.pop() {
      out.push(item);
    }
    out
  }

  /// Panics if the cursor or occupancy invariants are broken.
  #[cfg(test)]
  pub(crate) fn check_invariants(&self) {
    let cap = self.capacity();
    assert!(cap >= MIN_CAPACITY, "capacity {} below minimum", cap);
    assert!(self.start < cap, "start {} out of range {}", self.start, cap);
    assert!(self.end < cap, "end {} out of range {}", self.end, cap);
    assert!(self.len() <= cap - 1, "sentinel slot occupied");

    let len = self.len();
    for offset in 0..cap {
      let idx = (self.start + offset) % cap;
      assert_eq!(
        self.slots[idx].is_some(),
        offset < len,
        "slot {} occupancy disagrees with cursors (start {}, end {})",
        idx,
        self.start,
        self.end
      );
    }
  }
}
