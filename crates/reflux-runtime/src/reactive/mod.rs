#![forbid(unsafe_code)]

//! Reactive state for reflux.
//!
//! - [`Store`]: one shared state value, updated through reducer functions
//!   and fanned out to listeners in registration order.
//! - [`Push`]: a registration's private handle for updating or leaving.
//! - [`ChangeDetector`]: suppresses unchanged values and defers delivery of
//!   changed ones to a [`MicrotaskQueue`](reflux_core::MicrotaskQueue).
//!
//! # Architecture
//!
//! Everything is single-threaded and uses `Rc<RefCell<..>>` for shared
//! ownership. Store operations run synchronously to completion; the
//! detector's callbacks are the only deferred work.

pub mod change;
pub mod store;

pub use change::{ChangeDetector, not_equals, on_change};
pub use store::{Push, Store, SubscriberId};
