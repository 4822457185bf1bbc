#![forbid(unsafe_code)]

//! Core: cooperative scheduling primitives for reflux.
//!
//! The only primitive today is [`MicrotaskQueue`], a single-threaded FIFO
//! of deferred closures. A host drains it after each synchronous dispatch,
//! which gives queued work "after the current call stack, before the next
//! external event" timing without any real concurrency.

pub mod logging;
pub mod microtask;

pub use microtask::MicrotaskQueue;
