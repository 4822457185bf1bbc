//! Logging shims.
//!
//! With the `tracing` feature the usual `tracing` macros are re-exported
//! from here. Without it, same-named no-op macros are exported at the crate
//! root so call sites compile unchanged.

#[cfg(feature = "tracing")]
pub use tracing::trace;

/// No-op `trace!` used when the `tracing` feature is disabled.
#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {{}};
}
