#![forbid(unsafe_code)]

//! Deferred task queue with microtask-style semantics.
//!
//! # Design
//!
//! [`MicrotaskQueue`] is a shared handle (`Rc` inside) to a FIFO of boxed
//! `FnOnce()` tasks. [`queue()`](MicrotaskQueue::queue) never runs anything;
//! the owner of the event loop calls
//! [`run_until_idle()`](MicrotaskQueue::run_until_idle) once the current
//! synchronous work has unwound.
//!
//! # Invariants
//!
//! 1. Tasks run in the order they were queued.
//! 2. A task queued while the queue is draining runs in the same drain,
//!    after every task that was already pending.
//! 3. A task is removed from the queue before it runs, so it may queue more
//!    work freely.
//! 4. Only the outermost `run_until_idle()` drains; a nested call from inside
//!    a running task returns 0 immediately.
//!
//! # Failure Modes
//!
//! - **Task panics**: the panic propagates out of `run_until_idle()`. The
//!   panicking task is gone, every later task stays queued, and the queue
//!   can be drained again.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

// Import tracing macros (no-op when tracing feature is disabled).
#[cfg(feature = "tracing")]
use crate::logging::trace;
#[cfg(not(feature = "tracing"))]
use crate::trace;

type Task = Box<dyn FnOnce()>;

#[derive(Default)]
struct QueueInner {
    tasks: RefCell<VecDeque<Task>>,
    draining: Cell<bool>,
}

/// Resets the draining flag even if a task unwinds.
struct DrainGuard<'a>(&'a Cell<bool>);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// A single-threaded queue of deferred closures.
///
/// Cloning a `MicrotaskQueue` creates a new handle to the **same** queue.
#[derive(Clone, Default)]
pub struct MicrotaskQueue {
    inner: Rc<QueueInner>,
}

impl fmt::Debug for MicrotaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MicrotaskQueue")
            .field("pending", &self.len())
            .field("draining", &self.inner.draining.get())
            .finish()
    }
}

impl MicrotaskQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defer `task` until the next drain.
    pub fn queue(&self, task: impl FnOnce() + 'static) {
        let mut tasks = self.inner.tasks.borrow_mut();
        tasks.push_back(Box::new(task));
        trace!(pending = tasks.len(), "microtask queued");
    }

    /// Run queued tasks until none remain, returning how many ran.
    ///
    /// Tasks queued by running tasks are picked up by this same call.
    pub fn run_until_idle(&self) -> usize {
        if self.inner.draining.replace(true) {
            return 0;
        }
        let _guard = DrainGuard(&self.inner.draining);

        let mut ran = 0;
        while let Some(task) = self.pop() {
            task();
            ran += 1;
        }
        if ran > 0 {
            trace!(ran, "microtask queue drained");
        }
        ran
    }

    /// Run only the oldest pending task. Returns `false` if there was none.
    pub fn run_one(&self) -> bool {
        match self.pop() {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Drop every pending task without running it.
    pub fn clear(&self) -> usize {
        let dropped: Vec<Task> = self.inner.tasks.borrow_mut().drain(..).collect();
        let count = dropped.len();
        // Dropping captured values may queue more work; the borrow is released.
        drop(dropped);
        trace!(count, "microtask queue cleared");
        count
    }

    /// Number of pending tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.tasks.borrow().len()
    }

    /// Whether no task is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.tasks.borrow().is_empty()
    }

    /// Whether a `run_until_idle()` call is currently in progress.
    #[must_use]
    pub fn is_draining(&self) -> bool {
        self.inner.draining.get()
    }

    fn pop(&self) -> Option<Task> {
        self.inner.tasks.borrow_mut().pop_front()
    }
}
