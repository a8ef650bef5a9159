use std::cell::{Cell, RefCell};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use log::warn;

/// Identifies one active subscription on a [`Store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

/// Reactive snapshot container.
///
/// Holds the current engine state and notifies subscribers synchronously on
/// every write, in subscription order, on the writer's call stack. A
/// panicking listener is isolated and logged; the remaining listeners still
/// fire.
pub struct Store<S: Clone> {
    state: RefCell<S>,
    listeners: RefCell<Vec<(SubscriptionId, Rc<dyn Fn(&S)>)>>,
    next_id: Cell<u64>,
}

impl<S: Clone> Store<S> {
    pub fn new(initial: S) -> Self {
        Self {
            state: RefCell::new(initial),
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    /// Returns a clone of the current snapshot.
    pub fn get(&self) -> S {
        self.state.borrow().clone()
    }

    /// Reads through the current snapshot without cloning it.
    pub fn with<R>(&self, read: impl FnOnce(&S) -> R) -> R {
        read(&self.state.borrow())
    }

    /// Applies `mutate` to a copy of the current snapshot, installs the
    /// result, and notifies all subscribers with the new snapshot.
    pub fn update(&self, mutate: impl FnOnce(&mut S)) {
        let mut next = self.state.borrow().clone();
        mutate(&mut next);
        *self.state.borrow_mut() = next.clone();
        self.notify(&next);
    }

    /// Registers a listener; it fires on every subsequent write.
    pub fn subscribe(&self, listener: impl Fn(&S) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.borrow_mut().retain(|(sid, _)| *sid != id);
    }

    fn notify(&self, snapshot: &S) {
        // Snapshot the listener list so a listener may subscribe or
        // unsubscribe during notification without invalidating the iteration.
        let listeners: Vec<_> = self.listeners.borrow().clone();
        for (id, listener) in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(snapshot))).is_err() {
                warn!("Store listener {:?} panicked during notification", id);
            }
        }
    }
}
