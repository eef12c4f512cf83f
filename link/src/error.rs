// src/error.rs

use core::fmt;

// Generates `into_inner`, `Display` and `Error` for errors that hand a payload back.
macro_rules! impl_error_for_enum_with_inner {
    (
        $enum_name:ident < $generic_param:ident >,
        $($variant:ident ( $message:expr ) ),+
        $(,)?
    ) => {
        impl<$generic_param> $enum_name<$generic_param> {
            /// Consumes the error, returning the payload that could not be delivered.
            #[inline]
            pub fn into_inner(self) -> $generic_param {
                match self {
                    $( $enum_name::$variant(v) => v, )+
                }
            }
        }

        impl<$generic_param> fmt::Display for $enum_name<$generic_param> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $( $enum_name::$variant(_) => f.write_str($message), )+
                }
            }
        }

        impl<$generic_param> std::error::Error for $enum_name<$generic_param> {}
    };
}

/// Error returned by [`put`](crate::LinkBuffer::put) when the buffer no longer
/// accepts payloads.
///
/// The rejected payload is returned so the caller can drop it or report it upstream.
#[derive(PartialEq, Eq, Clone)]
pub enum PutError<T> {
  /// The buffer has been closed.
  Closed(T),
}

impl<T> fmt::Debug for PutError<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PutError::Closed(_) => write!(f, "PutError::Closed(..)"),
    }
  }
}

impl_error_for_enum_with_inner!(PutError<T>, Closed("link buffer closed"));

/// Error returned by blocking and async pops.
///
/// This is the terminal consumer signal: the buffer is closed and every
/// payload accepted before the close has been handed out.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PopError {
  Closed,
}
impl std::error::Error for PopError {}
impl fmt::Display for PopError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PopError::Closed => write!(f, "link buffer closed and drained"),
    }
  }
}

/// Error returned by [`try_pop`](crate::LinkBuffer::try_pop).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TryPopError {
  /// Nothing is buffered right now, but the buffer is still open.
  Empty,
  /// The buffer is closed and drained.
  Closed,
}
impl std::error::Error for TryPopError {}
impl fmt::Display for TryPopError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TryPopError::Empty => write!(f, "link buffer empty"),
      TryPopError::Closed => write!(f, "link buffer closed and drained"),
    }
  }
}

/// Error returned by [`pop_timeout`](crate::LinkBuffer::pop_timeout).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PopTimeoutError {
  /// The timeout elapsed before a payload arrived.
  Timeout,
  /// The buffer is closed and drained.
  Closed,
}
impl std::error::Error for PopTimeoutError {}
impl fmt::Display for PopTimeoutError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PopTimeoutError::Timeout => write!(f, "pop operation timed out"),
      PopTimeoutError::Closed => write!(f, "link buffer closed and drained"),
    }
  }
}

/// Error returned when attempting to close an already closed buffer.
///
/// Informational only; the buffer is closed either way.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct CloseError;
impl std::error::Error for CloseError {}
impl fmt::Display for CloseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "link buffer is already closed")
  }
}

impl From<PopError> for TryPopError {
  fn from(_: PopError) -> Self {
    TryPopError::Closed
  }
}

impl From<PopError> for PopTimeoutError {
  fn from(_: PopError) -> Self {
    PopTimeoutError::Closed
  }
}
