#![forbid(unsafe_code)]

//! Change detection with deferred delivery.
//!
//! A [`ChangeDetector`] remembers the last value it observed. Each call to
//! [`observe()`](ChangeDetector::observe) compares the incoming value with
//! that memory and, on a change, queues the callback on a
//! [`MicrotaskQueue`] instead of calling it.
//!
//! # Invariants
//!
//! 1. The first observation always schedules the callback, reporting the
//!    value itself as the previous value.
//! 2. Later observations schedule only when `has_changed(value, previous)`.
//! 3. The callback never runs inside `observe()`.
//! 4. The remembered value is always the latest one observed, scheduled or
//!    not.
//!
//! # Failure Modes
//!
//! - **Comparator panics**: nothing is scheduled and the remembered value
//!   stays as it was.

use std::cell::RefCell;
use std::fmt;

use reflux_core::MicrotaskQueue;

/// Default comparator: plain inequality.
pub fn not_equals<T: PartialEq>(a: &T, b: &T) -> bool {
    a != b
}

/// Create a detector using [`not_equals`].
pub fn on_change<T>(queue: &MicrotaskQueue) -> ChangeDetector<T>
where
    T: Clone + PartialEq + 'static,
{
    ChangeDetector::new(queue)
}

/// Remembers the previous value and schedules callbacks on real changes.
pub struct ChangeDetector<T, F = fn(&T, &T) -> bool> {
    queue: MicrotaskQueue,
    has_changed: F,
    /// `None` until the first observation.
    previous: RefCell<Option<T>>,
}

impl<T: fmt::Debug, F> fmt::Debug for ChangeDetector<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeDetector")
            .field("previous", &self.previous.borrow())
            .field("queue", &self.queue)
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> ChangeDetector<T> {
    /// Create a detector that treats `a != b` as a change.
    #[must_use]
    pub fn new(queue: &MicrotaskQueue) -> Self {
        ChangeDetector::with_comparator(queue, not_equals::<T> as fn(&T, &T) -> bool)
    }
}

impl<T, F> ChangeDetector<T, F>
where
    T: Clone + 'static,
    F: Fn(&T, &T) -> bool,
{
    /// Create a detector with a custom `has_changed(value, previous)`.
    #[must_use]
    pub fn with_comparator(queue: &MicrotaskQueue, has_changed: F) -> Self {
        Self {
            queue: queue.clone(),
            has_changed,
            previous: RefCell::new(None),
        }
    }

    /// Record `value`; if it counts as a change, queue `cb(value, previous)`.
    ///
    /// Returns whether `cb` was scheduled.
    ///
    /// # Panics
    ///
    /// Panics if the comparator observes through this same detector.
    pub fn observe(&self, value: T, cb: impl FnOnce(T, T) + 'static) -> bool {
        let report = match self.previous.borrow().as_ref() {
            None => Some(value.clone()),
            Some(previous) if (self.has_changed)(&value, previous) => Some(previous.clone()),
            Some(_) => None,
        };

        let scheduled = report.is_some();
        if let Some(previous) = report {
            let current = value.clone();
            self.queue.queue(move || cb(current, previous));
        }
        *self.previous.borrow_mut() = Some(value);
        scheduled
    }

    /// The last observed value, if any.
    #[must_use]
    pub fn previous(&self) -> Option<T> {
        self.previous.borrow().clone()
    }

    #[must_use]
    pub fn has_observed(&self) -> bool {
        self.previous.borrow().is_some()
    }

    /// Forget the remembered value; the next observation counts as the first.
    pub fn reset(&self) {
        self.previous.borrow_mut().take();
    }
}
