use crate::runtime::ReactiveRuntime;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// A reactive value that notifies its observers when changed.
///
/// Signals belong to the runtime that was current when they were created.
/// Once that runtime is gone the signal keeps working as a plain shared cell.
pub struct Signal<T> {
    value: Rc<RefCell<T>>,
    id: usize,
    runtime: Weak<ReactiveRuntime>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            value: Rc::clone(&self.value),
            id: self.id,
            runtime: Weak::clone(&self.runtime),
        }
    }
}

impl<T: 'static> Signal<T> {
    /// Create a new signal with the given initial value.
    pub fn new(initial: T) -> Self {
        let runtime = ReactiveRuntime::current();
        let id = runtime.next_id();

        Self {
            value: Rc::new(RefCell::new(initial)),
            id,
            runtime: Rc::downgrade(&runtime),
        }
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.with(T::clone)
    }

    /// Read the value with a function without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.track_read(self.id);
        }
        let value = self.value.borrow();
        f(&value)
    }

    /// Set a new value for the signal.
    pub fn set(&self, new_value: T) {
        *self.value.borrow_mut() = new_value;
        self.notify();
    }

    /// Update the value in place.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.value.borrow_mut());
        self.notify();
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> usize {
        self.id
    }

    fn notify(&self) {
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.notify_observers(self.id);
        }
    }
}
