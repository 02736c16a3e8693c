use crate::runtime::ReactiveRuntime;
use std::rc::{Rc, Weak};

/// A side effect that runs when its dependencies change.
///
/// Effects automatically track signal and memo reads and re-run when those
/// sources change. The effect runs immediately on creation to establish its
/// initial dependencies, and stops reacting once dropped.
///
/// # Examples
///
/// ```
/// use query_state::{Effect, Signal};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let count = Signal::new(0);
/// let seen = Rc::new(Cell::new(0));
///
/// let _effect = Effect::new({
///     let count = count.clone();
///     let seen = Rc::clone(&seen);
///     move || seen.set(count.get())
/// });
/// assert_eq!(seen.get(), 0);
///
/// count.set(7);
/// assert_eq!(seen.get(), 7);
/// ```
#[must_use = "an effect stops running when dropped"]
pub struct Effect {
    id: usize,
    runtime: Weak<ReactiveRuntime>,
}

impl Effect {
    /// Create a new effect that runs when dependencies change.
    pub fn new<F>(effect: F) -> Self
    where
        F: Fn() + 'static,
    {
        let runtime = ReactiveRuntime::current();
        let id = runtime.next_id();
        let effect = Rc::new(effect);

        runtime.register_effect(id, {
            let effect = Rc::clone(&effect);
            move || effect()
        });

        // Run immediately within the observer context to track dependencies
        runtime.run_observer(id, || effect());

        Self {
            id,
            runtime: Rc::downgrade(&runtime),
        }
    }
}

impl Drop for Effect {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.remove_observer(self.id);
        }
    }
}
