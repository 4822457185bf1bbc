#![forbid(unsafe_code)]

//! Reducer-style state store with ordered listener fan-out.
//!
//! # Design
//!
//! [`Store<S>`] owns exactly one current state value and an ordered list of
//! listener adapters in shared, reference-counted storage. Each call to
//! [`register()`](Store::register) creates an adapter that binds the
//! listener to its own [`Push`] handle, so every invocation receives
//! `(state, push)`.
//!
//! An update applies a pure `old -> new` function, then walks a snapshot of
//! the adapter list (taken before the walk begins) and invokes each adapter
//! with the state current at its turn. Listeners may update re-entrantly;
//! whatever an earlier listener commits is what later listeners see.
//!
//! # Invariants
//!
//! 1. `initial()` runs exactly once, in the constructor.
//! 2. A new listener is called once, synchronously, inside `register()`.
//! 3. Listeners are called in registration order, once per update.
//! 4. A listener that unregistered is never called again, even by a pass
//!    that was already running when it unregistered.
//! 5. A listener registered during a pass is not called by that pass.
//! 6. Subscriber identity is a [`SubscriberId`] token, never a position, so
//!    removals never disturb other registrations.
//!
//! # Failure Modes
//!
//! - **Update function panics**: nothing has been staged; the state is
//!   untouched and the panic propagates.
//! - **Listener panics mid-pass**: the state (and version) in place before
//!   the update is restored, then the panic propagates.
//! - **Runaway feedback**: nested updates deeper than
//!   [`StoreConfig::max_reentrant_depth`] fail with
//!   [`StoreError::ReentrancyLimit`].

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, debug_span, trace};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};

/// Stable identity of one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A registered listener bound to its own push handle.
struct Adapter<S> {
    id: SubscriberId,
    push: Push<S>,
    on_state: Box<dyn Fn(&S, &Push<S>)>,
    /// Cleared on unregister so in-flight snapshots skip this adapter.
    active: Cell<bool>,
}

impl<S> Adapter<S> {
    fn invoke(&self, state: &S) {
        (self.on_state)(state, &self.push);
    }
}

/// Shared interior for [`Store<S>`].
struct StoreInner<S> {
    config: StoreConfig,
    state: RefCell<S>,
    subscribers: RefCell<Vec<Rc<Adapter<S>>>>,
    next_id: Cell<u64>,
    /// Number of updates currently running (nesting depth).
    depth: Cell<usize>,
    /// Bumped once per committed update.
    version: Cell<u64>,
}

impl<S: Clone> StoreInner<S> {
    fn snapshot(&self) -> S {
        self.state.borrow().clone()
    }

    fn is_registered(&self, id: SubscriberId) -> bool {
        self.subscribers.borrow().iter().any(|a| a.id == id)
    }

    fn remove(&self, id: SubscriberId) -> bool {
        let removed = {
            let mut subscribers = self.subscribers.borrow_mut();
            match subscribers.iter().position(|a| a.id == id) {
                Some(pos) => subscribers.remove(pos),
                None => return false,
            }
        };
        removed.active.set(false);
        trace!(
            store = %self.config.label,
            subscriber = %id,
            subscribers = self.subscribers.borrow().len(),
            "listener unregistered"
        );
        true
    }

    /// Check that `origin` may start an update now; returns the current depth.
    fn admit(&self, origin: SubscriberId) -> Result<usize> {
        if !self.is_registered(origin) {
            return Err(StoreError::Unregistered { subscriber: origin });
        }

        let depth = self.depth.get();
        let limit = self.config.max_reentrant_depth;
        if depth > limit {
            debug!(
                store = %self.config.label,
                subscriber = %origin,
                depth,
                limit,
                "nested update rejected"
            );
            return Err(StoreError::ReentrancyLimit { depth, limit });
        }
        Ok(depth)
    }

    fn apply(&self, origin: SubscriberId, update: impl FnOnce(&S) -> S) -> Result<S> {
        let depth = self.admit(origin)?;

        let _span = debug_span!(
            "reflux.update",
            store = %self.config.label,
            subscriber = %origin,
            depth
        )
        .entered();

        // Run the updater on a copy so it may itself touch the store.
        let current = self.snapshot();
        let candidate = update(&current);
        drop(current);

        let pass: Vec<Rc<Adapter<S>>> = self.subscribers.borrow().clone();
        let previous = self.state.replace(candidate);
        let mut rollback = Rollback {
            inner: self,
            previous: Some(previous),
            version: self.version.get(),
            depth,
        };
        self.depth.set(depth + 1);

        for adapter in &pass {
            if !adapter.active.get() {
                continue;
            }
            let state = self.snapshot();
            adapter.invoke(&state);
        }

        rollback.commit();
        let version = self.version.get() + 1;
        self.version.set(version);
        trace!(
            store = %self.config.label,
            version,
            listeners = pass.len(),
            "update committed"
        );
        Ok(self.snapshot())
    }
}

/// Restores the pre-update state unless the reduction pass completed.
struct Rollback<'a, S> {
    inner: &'a StoreInner<S>,
    previous: Option<S>,
    version: u64,
    depth: usize,
}

impl<S> Rollback<'_, S> {
    fn commit(&mut self) {
        self.previous = None;
    }
}

impl<S> Drop for Rollback<'_, S> {
    fn drop(&mut self) {
        self.inner.depth.set(self.depth);
        if let Some(previous) = self.previous.take() {
            *self.inner.state.borrow_mut() = previous;
            self.inner.version.set(self.version);
            debug!(
                store = %self.inner.config.label,
                version = self.version,
                "update rolled back"
            );
        }
    }
}

/// Owner of one current state value and its ordered listeners.
///
/// Cloning a `Store` creates a new handle to the **same** store.
pub struct Store<S> {
    inner: Rc<StoreInner<S>>,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("label", &self.inner.config.label)
            .field("state", &self.inner.state.borrow())
            .field("subscribers", &self.inner.subscribers.borrow().len())
            .field("version", &self.inner.version.get())
            .finish()
    }
}

impl<S: Clone + 'static> Store<S> {
    /// Create a store whose state is produced by `initial`.
    pub fn new(initial: impl FnOnce() -> S) -> Self {
        Self::with_config(StoreConfig::default(), initial)
    }

    /// Create a store with explicit configuration.
    pub fn with_config(config: StoreConfig, initial: impl FnOnce() -> S) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                config,
                state: RefCell::new(initial()),
                subscribers: RefCell::new(Vec::new()),
                next_id: Cell::new(1),
                depth: Cell::new(0),
                version: Cell::new(0),
            }),
        }
    }

    /// Register a listener and call it once with the current state.
    ///
    /// The listener receives its [`Push`] handle on every call; the same
    /// handle is also returned here for use outside the listener.
    pub fn register(&self, on_state: impl Fn(&S, &Push<S>) + 'static) -> Push<S> {
        let id = SubscriberId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);

        let push = Push {
            store: Rc::downgrade(&self.inner),
            id,
        };
        let adapter = Rc::new(Adapter {
            id,
            push: push.clone(),
            on_state: Box::new(on_state),
            active: Cell::new(true),
        });
        self.inner.subscribers.borrow_mut().push(Rc::clone(&adapter));
        trace!(
            store = %self.inner.config.label,
            subscriber = %id,
            subscribers = self.inner.subscribers.borrow().len(),
            "listener registered"
        );

        let state = self.inner.snapshot();
        adapter.invoke(&state);
        push
    }

    /// A copy of the current state.
    #[must_use]
    pub fn state(&self) -> S {
        self.inner.snapshot()
    }

    /// Access the current state by reference.
    ///
    /// # Panics
    ///
    /// Panics if the closure updates this store (re-entrant borrow).
    pub fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.inner.state.borrow())
    }

    /// Number of active registrations.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    /// Number of committed updates so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Whether an update is currently running.
    #[must_use]
    pub fn is_updating(&self) -> bool {
        self.inner.depth.get() > 0
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }
}

/// One registration's private handle: update the state or unregister.
///
/// Holds only a weak reference, so listeners capturing it do not keep the
/// store alive.
pub struct Push<S> {
    store: Weak<StoreInner<S>>,
    id: SubscriberId,
}

impl<S> Clone for Push<S> {
    fn clone(&self) -> Self {
        Self {
            store: Weak::clone(&self.store),
            id: self.id,
        }
    }
}

impl<S> fmt::Debug for Push<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Push")
            .field("id", &self.id)
            .field("store_alive", &(self.store.strong_count() > 0))
            .finish()
    }
}

impl<S: Clone + 'static> Push<S> {
    /// Apply `update` to the current state, notify every listener, commit
    /// and return the committed state.
    pub fn update(&self, update: impl FnOnce(&S) -> S) -> Result<S> {
        self.upgrade()?.apply(self.id, update)
    }

    /// Like [`update`](Self::update), but the update function may refuse.
    /// A refusal leaves the state untouched and notifies no one.
    pub fn try_update<E>(&self, update: impl FnOnce(&S) -> std::result::Result<S, E>) -> Result<S>
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let inner = self.upgrade()?;
        inner.admit(self.id)?;
        let candidate = update(&inner.snapshot()).map_err(StoreError::rejected)?;
        inner.apply(self.id, move |_| candidate)
    }

    /// Remove this registration. Returns `false` if it was already gone.
    pub fn unregister(&self) -> bool {
        match self.store.upgrade() {
            Some(inner) => inner.remove(self.id),
            None => false,
        }
    }

    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.store
            .upgrade()
            .is_some_and(|inner| inner.is_registered(self.id))
    }

    /// A handle to the owning store, if it is still alive.
    #[must_use]
    pub fn store(&self) -> Option<Store<S>> {
        self.store.upgrade().map(|inner| Store { inner })
    }

    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    fn upgrade(&self) -> Result<Rc<StoreInner<S>>> {
        self.store.upgrade().ok_or(StoreError::Closed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
