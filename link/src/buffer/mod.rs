// src/buffer/mod.rs

//! A growable, closable FIFO buffer that sits between a link's reader and its dispatcher.
//!
//! [`LinkBuffer`] never blocks producers: when its ring storage runs out of room it
//! doubles in place instead. Consumers may block (or await) until a payload
//! arrives or the buffer is closed. Closing does not discard anything already
//! buffered, so consumers see every accepted payload before the closed signal.
//!
//! ### Design Principles:
//!
//! 1.  **Central Mutex**: A single `parking_lot::Mutex` guards the ring cursors, the
//!     slot storage, the closed flag and the async waiter list.
//! 2.  **Condvar for threads, wakers for tasks**: blocking consumers sleep on a
//!     `parking_lot::Condvar` tied to that mutex and re-check the buffer after every
//!     wake. Async consumers register a `Waker` in a FIFO list.
//! 3.  **Put wakes one, close wakes all**: each accepted payload wakes one blocked
//!     thread and one pending task; closing wakes everybody so they can observe
//!     the closed-and-drained state.

mod async_impl;
mod ring;

pub use async_impl::{PopFuture, PopStream};

use self::ring::Ring;
use crate::error::{CloseError, PopError, PopTimeoutError, PutError, TryPopError};
use crate::telemetry;

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::fmt;
use std::task::Waker;
use std::time::{Duration, Instant};

const DEFAULT_CAPACITY: usize = 16;

/// A parked async consumer.
#[derive(Debug)]
struct AsyncWaiter {
  id: u64,
  waker: Waker,
}

/// State protected by the buffer's mutex.
#[derive(Debug)]
struct State<T> {
  ring: Ring<T>,
  closed: bool,
  async_waiters: VecDeque<AsyncWaiter>,
  next_waiter_id: u64,
}

impl<T> State<T> {
  fn wake_one_async(&mut self) {
    if let Some(waiter) = self.async_waiters.pop_front() {
      waiter.waker.wake();
    }
  }
}

/// A thread-safe, unbounded FIFO queue of payloads with an explicit close.
///
/// Share it between producers and consumers through an `Arc`. Payloads default
/// to `Vec<u8>`, but any owned type can be buffered.
///
/// ```
/// use fibre_link::LinkBuffer;
///
/// let buffer: LinkBuffer = LinkBuffer::new(2);
/// buffer.put(b"hello".to_vec()).unwrap();
/// buffer.close().unwrap();
/// assert_eq!(buffer.pop().unwrap(), b"hello".to_vec());
/// assert!(buffer.pop().is_err());
/// ```
pub struct LinkBuffer<T = Vec<u8>> {
  state: Mutex<State<T>>,
  available: Condvar,
}

/// A buffer of raw byte payloads.
pub type ByteLinkBuffer = LinkBuffer<Vec<u8>>;

impl<T> fmt::Debug for LinkBuffer<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = self.state.lock();
    f.debug_struct("LinkBuffer")
      .field("len", &state.ring.len())
      .field("capacity", &state.ring.capacity())
      .field("closed", &state.closed)
      .field("async_waiters", &state.async_waiters.len())
      .finish()
  }
}

impl<T> Default for LinkBuffer<T> {
  fn default() -> Self {
    Self::new(DEFAULT_CAPACITY)
  }
}

impl<T> LinkBuffer<T> {
  /// Creates an open, empty buffer with room for `initial_capacity` slots.
  ///
  /// One slot is always kept free, so capacities below 2 are rounded up to 2.
  pub fn new(initial_capacity: usize) -> Self {
    Self {
      state: Mutex::new(State {
        ring: Ring::with_capacity(initial_capacity),
        closed: false,
        async_waiters: VecDeque::new(),
        next_waiter_id: 0,
      }),
      available: Condvar::new(),
    }
  }

  /// Number of buffered payloads.
  pub fn len(&self) -> usize {
    self.state.lock().ring.len()
  }

  pub fn is_empty(&self) -> bool {
    self.state.lock().ring.is_empty()
  }

  /// Current number of slots, including the one kept free.
  pub fn capacity(&self) -> usize {
    self.state.lock().ring.capacity()
  }

  pub fn is_closed(&self) -> bool {
    self.state.lock().closed
  }

  /// Closes the buffer and wakes every waiting consumer.
  ///
  /// Payloads already buffered stay poppable. Returns `Err(CloseError)` if the
  /// buffer was already closed.
  pub fn close(&self) -> Result<(), CloseError> {
    let mut state = self.state.lock();
    if state.closed {
      return Err(CloseError);
    }
    state.closed = true;

    let remaining = state.ring.len();
    for waiter in state.async_waiters.drain(..) {
      waiter.waker.wake();
    }
    self.available.notify_all();
    drop(state);

    tracing::debug!(remaining, "link buffer closed");
    telemetry::increment_counter("LinkBuffer::close", "Closed");
    telemetry::log_event(Some(remaining), "LinkBuffer::close", "Closed", None);
    Ok(())
  }

  /// Appends a payload, growing the storage if needed. Never blocks.
  ///
  /// On a closed buffer the payload is handed back inside the error.
  pub fn put(&self, item: T) -> Result<(), PutError<T>> {
    let mut state = self.state.lock();
    if state.closed {
      drop(state);
      telemetry::increment_counter("LinkBuffer::put", "Rejected");
      return Err(PutError::Closed(item));
    }

    let grown = state.ring.push(item);
    state.wake_one_async();
    self.available.notify_one();
    let len = state.ring.len();
    drop(state);

    if let Some(capacity) = grown {
      tracing::trace!(capacity, len, "link buffer grew");
      telemetry::increment_counter("LinkBuffer::put", "Grow");
      telemetry::log_event(Some(capacity), "LinkBuffer::put", "Grow", None);
    }
    telemetry::increment_counter("LinkBuffer::put", "Accepted");
    Ok(())
  }

  /// Takes the oldest payload, blocking the current thread while the buffer is
  /// empty and open.
  ///
  /// Returns `Err(PopError::Closed)` once the buffer is closed and drained.
  pub fn pop(&self) -> Result<T, PopError> {
    let mut state = self.state.lock();
    loop {
      if let Some(item) = state.ring.pop() {
        telemetry::increment_counter("LinkBuffer::pop", "Popped");
        return Ok(item);
      }
      if state.closed {
        return Err(PopError::Closed);
      }
      telemetry::increment_counter("LinkBuffer::pop", "Wait");
      self.available.wait(&mut state);
    }
  }

  /// Takes the oldest payload without blocking.
  pub fn try_pop(&self) -> Result<T, TryPopError> {
    let mut state = self.state.lock();
    match state.ring.pop() {
      Some(item) => {
        telemetry::increment_counter("LinkBuffer::try_pop", "Popped");
        Ok(item)
      }
      None if state.closed => Err(TryPopError::Closed),
      None => Err(TryPopError::Empty),
    }
  }

  /// Like [`pop`](Self::pop), but gives up once `timeout` has elapsed.
  pub fn pop_timeout(&self, timeout: Duration) -> Result<T, PopTimeoutError> {
    let deadline = match Instant::now().checked_add(timeout) {
      Some(deadline) => deadline,
      None => return self.pop().map_err(PopTimeoutError::from),
    };

    let mut state = self.state.lock();
    loop {
      if let Some(item) = state.ring.pop() {
        telemetry::increment_counter("LinkBuffer::pop_timeout", "Popped");
        return Ok(item);
      }
      if state.closed {
        return Err(PopTimeoutError::Closed);
      }
      if Instant::now() >= deadline {
        telemetry::increment_counter("LinkBuffer::pop_timeout", "Timeout");
        return Err(PopTimeoutError::Timeout);
      }
      telemetry::increment_counter("LinkBuffer::pop_timeout", "Wait");
      // Spurious or stolen wakeups loop back with the same deadline.
      let _ = self.available.wait_until(&mut state, deadline);
    }
  }

  /// Returns a future that resolves to the oldest payload.
  pub fn pop_async(&self) -> PopFuture<'_, T> {
    PopFuture::new(self)
  }

  /// Returns a stream yielding payloads until the buffer is closed and drained.
  pub fn stream(&self) -> PopStream<'_, T> {
    PopStream::new(self)
  }

  /// Removes every buffered payload without blocking, oldest first.
  pub fn drain(&self) -> Vec<T> {
    let items = self.state.lock().ring.drain();
    telemetry::log_event(Some(items.len()), "LinkBuffer::drain", "Drained", None);
    items
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;
  use std::thread;

  fn assert_send_sync<T: Send + Sync>() {}

  #[test]
  fn buffer_is_send_and_sync() {
    assert_send_sync::<LinkBuffer<Vec<u8>>>();
    assert_send_sync::<LinkBuffer<String>>();
  }

  #[test]
  fn invariants_hold_across_growth() {
    let buffer = LinkBuffer::new(2);
    for i in 0..10u32 {
      buffer.put(i).unwrap();
      buffer.state.lock().ring.check_invariants();
    }
    for i in 0..5u32 {
      assert_eq!(buffer.pop(), Ok(i));
      buffer.state.lock().ring.check_invariants();
    }
    assert_eq!(buffer.len(), 5);
    assert_eq!(buffer.capacity(), 16);
  }

  #[test]
  fn default_capacity() {
    let buffer: ByteLinkBuffer = LinkBuffer::default();
    assert_eq!(buffer.capacity(), DEFAULT_CAPACITY);
    assert!(buffer.is_empty());
    assert!(!buffer.is_closed());
  }

  #[test]
  fn debug_output_reports_state() {
    let buffer = LinkBuffer::new(4);
    buffer.put(vec![1u8]).unwrap();
    let rendered = format!("{:?}", buffer);
    assert!(rendered.contains("len: 1"), "{}", rendered);
    assert!(rendered.contains("capacity: 4"), "{}", rendered);
    assert!(rendered.contains("closed: false"), "{}", rendered);
  }

  #[test]
  fn close_wakes_all_blocked_consumers() {
    let buffer = Arc::new(LinkBuffer::<u32>::new(2));
    let handles: Vec<_> = (0..4)
      .map(|_| {
        let buffer = buffer.clone();
        thread::spawn(move || buffer.pop())
      })
      .collect();

    thread::sleep(Duration::from_millis(50));
    buffer.close().unwrap();

    for handle in handles {
      assert_eq!(handle.join().unwrap(), Err(PopError::Closed));
    }
  }

  #[test]
  fn pop_timeout_respects_deadline() {
    let buffer = LinkBuffer::<u32>::new(2);
    let start = Instant::now();
    assert_eq!(
      buffer.pop_timeout(Duration::from_millis(50)),
      Err(PopTimeoutError::Timeout)
    );
    assert!(start.elapsed() >= Duration::from_millis(50));
  }

  #[test]
  fn pop_timeout_with_huge_duration_still_returns_items() {
    let buffer = LinkBuffer::new(2);
    buffer.put(7u32).unwrap();
    assert_eq!(buffer.pop_timeout(Duration::MAX), Ok(7));
    buffer.close().unwrap();
    assert_eq!(buffer.pop_timeout(Duration::MAX), Err(PopTimeoutError::Closed));
  }
}
