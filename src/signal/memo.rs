use crate::runtime::ReactiveRuntime;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// A memoized computed value that automatically tracks dependencies.
///
/// Memos compute lazily and only recompute after a source they read during
/// their last computation has changed.
pub struct Memo<T> {
    compute: Rc<dyn Fn() -> T>,
    cached: Rc<RefCell<Option<Rc<T>>>>,
    id: usize,
    runtime: Weak<ReactiveRuntime>,
}

impl<T> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            compute: Rc::clone(&self.compute),
            cached: Rc::clone(&self.cached),
            id: self.id,
            runtime: Weak::clone(&self.runtime),
        }
    }
}

impl<T: Clone + 'static> Memo<T> {
    /// Create a new memo with the given computation function.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> T + 'static,
    {
        let runtime = ReactiveRuntime::current();
        let id = runtime.next_id();
        runtime.register_memo(id);

        Self {
            compute: Rc::new(compute),
            cached: Rc::new(RefCell::new(None)),
            id,
            runtime: Rc::downgrade(&runtime),
        }
    }

    /// Get the current value, recomputing if necessary.
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    /// Read the memoized value with a function without cloning.
    ///
    /// The cache is not borrowed while `f` runs, so `f` may write to a
    /// source of this memo and read it again.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let Some(runtime) = self.runtime.upgrade() else {
            // Nothing can invalidate the cache without a runtime
            return f(&(self.compute)());
        };
        runtime.track_read(self.id);

        if !runtime.is_memo_dirty(self.id) {
            let cached = self.cached.borrow().clone();
            if let Some(value) = cached {
                return f(&value);
            }
        }

        // Recompute within observer context to track dependencies
        let value = Rc::new(runtime.run_observer(self.id, || (self.compute)()));
        *self.cached.borrow_mut() = Some(Rc::clone(&value));
        runtime.mark_memo_clean(self.id);
        f(&value)
    }
}

impl<T> Drop for Memo<T> {
    fn drop(&mut self) {
        // Clones share the cache; the last one out unregisters
        if Rc::strong_count(&self.cached) > 1 {
            return;
        }
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.remove_observer(self.id);
        }
    }
}
