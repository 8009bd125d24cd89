//! Trailing-edge call coalescing.
//!
//! A [`Debouncer`] wraps a callback together with a wait interval. Calls made
//! while no window is open arm a timer; calls made while a window is already
//! open only replace the pending payload. When the timer elapses the callback
//! runs once with whatever payload was supplied last. At most one invocation
//! happens per window, and the window is never extended by later calls.

#![deny(clippy::all)]

mod debouncer;

pub use debouncer::{CancelMode, Debouncer};
