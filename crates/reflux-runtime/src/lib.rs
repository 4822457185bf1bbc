#![forbid(unsafe_code)]

//! Runtime: a reducer-style reactive state store and change detection.
//!
//! - [`Store`] owns one current state value and fans every accepted update
//!   out to its registered listeners, in registration order.
//! - [`ChangeDetector`] suppresses repeated values and delivers real changes
//!   later, on a [`MicrotaskQueue`].
//!
//! # Example
//!
//! ```
//! use reflux_runtime::Store;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Counter {
//!     count: u32,
//! }
//!
//! let store = Store::new(|| Counter { count: 0 });
//! let push = store.register(|state, _push| println!("count = {}", state.count));
//!
//! let next = push.update(|s| Counter { count: s.count + 1 }).unwrap();
//! assert_eq!(next, Counter { count: 1 });
//!
//! // Unregister; later updates through this handle are rejected.
//! assert!(push.unregister());
//! assert!(push.update(|s| s.clone()).is_err());
//! ```

pub mod config;
pub mod error;
pub mod reactive;

pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use reactive::{ChangeDetector, Push, Store, SubscriberId, not_equals, on_change};
pub use reflux_core::MicrotaskQueue;
