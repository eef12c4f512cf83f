//! Async consumption of a [`LinkBuffer`]: a one-shot pop future and a stream.

use super::{AsyncWaiter, LinkBuffer};
use crate::error::PopError;
use crate::telemetry;

use futures_core::Stream;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

impl<T> LinkBuffer<T> {
  /// Polls for the oldest payload on behalf of an async consumer.
  ///
  /// `waiter_id` tracks this consumer's registration in the waiter list across
  /// polls. It is cleared whenever the poll completes.
  fn poll_pop(&self, cx: &mut Context<'_>, waiter_id: &mut Option<u64>) -> Poll<Result<T, PopError>> {
    let mut state = self.state.lock();

    let outcome = match state.ring.pop() {
      Some(item) => Some(Ok(item)),
      None if state.closed => Some(Err(PopError::Closed)),
      None => None,
    };

    if let Some(result) = outcome {
      if let Some(id) = waiter_id.take() {
        state.async_waiters.retain(|w| w.id != id);
      }
      if result.is_ok() {
        telemetry::increment_counter("LinkBuffer::pop_async", "Popped");
      }
      return Poll::Ready(result);
    }

    // Still registered: refresh the waker in place so our queue position is kept.
    if let Some(id) = *waiter_id {
      if let Some(waiter) = state.async_waiters.iter_mut().find(|w| w.id == id) {
        if !waiter.waker.will_wake(cx.waker()) {
          waiter.waker = cx.waker().clone();
        }
        return Poll::Pending;
      }
    }

    // Either first poll, or we were woken and someone else took the payload.
    let id = state.next_waiter_id;
    state.next_waiter_id = state.next_waiter_id.wrapping_add(1);
    state.async_waiters.push_back(AsyncWaiter {
      id,
      waker: cx.waker().clone(),
    });
    *waiter_id = Some(id);
    telemetry::increment_counter("LinkBuffer::pop_async", "Wait");
    Poll::Pending
  }

  /// Withdraws an async consumer that stopped polling before completing.
  ///
  /// If its wakeup was already delivered, the wakeup is forwarded to the next
  /// waiting task so a buffered payload is never left without a consumer.
  fn cancel_waiter(&self, id: u64) {
    let mut state = self.state.lock();
    let before = state.async_waiters.len();
    state.async_waiters.retain(|w| w.id != id);
    let was_queued = state.async_waiters.len() != before;

    if !was_queued && !state.ring.is_empty() {
      state.wake_one_async();
    }
  }
}

/// Future returned by [`LinkBuffer::pop_async`].
#[must_use = "futures do nothing unless you .await or poll them"]
pub struct PopFuture<'a, T> {
  buffer: &'a LinkBuffer<T>,
  waiter_id: Option<u64>,
}

impl<'a, T> PopFuture<'a, T> {
  pub(super) fn new(buffer: &'a LinkBuffer<T>) -> Self {
    Self {
      buffer,
      waiter_id: None,
    }
  }
}

impl<T> fmt::Debug for PopFuture<'_, T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PopFuture")
      .field("waiter_id", &self.waiter_id)
      .finish()
  }
}

impl<T> Future for PopFuture<'_, T> {
  type Output = Result<T, PopError>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let this = self.get_mut();
    this.buffer.poll_pop(cx, &mut this.waiter_id)
  }
}

impl<T> Drop for PopFuture<'_, T> {
  fn drop(&mut self) {
    if let Some(id) = self.waiter_id.take() {
      self.buffer.cancel_waiter(id);
    }
  }
}

/// Stream returned by [`LinkBuffer::stream`].
///
/// Yields payloads in FIFO order and ends once the buffer is closed and drained.
#[must_use = "streams do nothing unless polled"]
pub struct PopStream<'a, T> {
  buffer: &'a LinkBuffer<T>,
  waiter_id: Option<u64>,
}

impl<'a, T> PopStream<'a, T> {
  pub(super) fn new(buffer: &'a LinkBuffer<T>) -> Self {
    Self {
      buffer,
      waiter_id: None,
    }
  }
}

impl<T> fmt::Debug for PopStream<'_, T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PopStream")
      .field("waiter_id", &self.waiter_id)
      .finish()
  }
}

impl<T> Stream for PopStream<'_, T> {
  type Item = T;

  fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
    let this = self.get_mut();
    match this.buffer.poll_pop(cx, &mut this.waiter_id) {
      Poll::Ready(Ok(item)) => Poll::Ready(Some(item)),
      Poll::Ready(Err(PopError::Closed)) => Poll::Ready(None),
      Poll::Pending => Poll::Pending,
    }
  }
}

impl<T> Drop for PopStream<'_, T> {
  fn drop(&mut self) {
    if let Some(id) = self.waiter_id.take() {
      self.buffer.cancel_waiter(id);
    }
  }
}
