#![warn(missing_debug_implementations, rust_2018_idioms)]

//! Growable, closable FIFO buffers for decoupling a link's reader from its dispatcher.
//!
//! `fibre_link` provides [`LinkBuffer`], a thread-safe queue of opaque payloads that
//! never blocks producers (it grows instead) and lets consumers block, await, or
//! poll until data arrives or the buffer is closed.

pub mod buffer;
pub mod error;
pub mod telemetry;

pub use buffer::{ByteLinkBuffer, LinkBuffer, PopFuture, PopStream};
pub use error::{CloseError, PopError, PopTimeoutError, PutError, TryPopError};
