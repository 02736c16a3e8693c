use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

type EffectFn = Rc<dyn Fn()>;

/// Dependency bookkeeping for one runtime.
#[derive(Default)]
struct ReactiveContext {
    current_observer: Option<usize>,
    // Map from source ID (signal or memo) to the observers that read it
    dependencies: HashMap<usize, HashSet<usize>>,
    // Map from observer ID to the sources it read during its last run
    observer_deps: HashMap<usize, HashSet<usize>>,
    // Map from effect ID to the effect function
    effects: HashMap<usize, EffectFn>,
    // Map from memo ID to dirty state
    memo_dirty: HashMap<usize, bool>,
}

impl ReactiveContext {
    /// Resets the bookkeeping and hands back the effect closures, which the
    /// caller drops once the context is no longer borrowed.
    fn clear(&mut self) -> HashMap<usize, EffectFn> {
        self.current_observer = None;
        self.dependencies.clear();
        self.observer_deps.clear();
        self.memo_dirty.clear();
        std::mem::take(&mut self.effects)
    }

    fn drop_dependencies(&mut self, observer_id: usize) {
        if let Some(old_deps) = self.observer_deps.remove(&observer_id) {
            for source_id in old_deps {
                if let Some(deps) = self.dependencies.get_mut(&source_id) {
                    deps.remove(&observer_id);
                    if deps.is_empty() {
                        self.dependencies.remove(&source_id);
                    }
                }
            }
        }
    }
}

/// Reactive runtime for signals, memos and effects.
///
/// Runtimes are single-threaded: every thread has its own global runtime,
/// and [`ReactiveRuntime::scope`] pushes an isolated one for the duration of
/// a closure. The runtime records which observers read which sources and
/// re-derives them when a source changes.
///
/// # Examples
///
/// ```
/// use query_state::runtime::ReactiveRuntime;
/// use query_state::Signal;
///
/// ReactiveRuntime::scope(|| {
///     let signal = Signal::new(0);
///     assert_eq!(signal.get(), 0);
/// });
/// // Runtime and all its state is dropped here
/// ```
pub struct ReactiveRuntime {
    next_id: Cell<usize>,
    context: RefCell<ReactiveContext>,
}

thread_local! {
    static GLOBAL_RUNTIME: Rc<ReactiveRuntime> = ReactiveRuntime::new();
    static RUNTIME_STACK: RefCell<Vec<Rc<ReactiveRuntime>>> = const { RefCell::new(Vec::new()) };
}

impl ReactiveRuntime {
    fn new() -> Rc<Self> {
        Rc::new(ReactiveRuntime {
            next_id: Cell::new(0),
            context: RefCell::new(ReactiveContext::default()),
        })
    }

    /// Run a function with a fresh isolated runtime.
    ///
    /// The runtime and all its state is dropped when the function returns.
    pub fn scope<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        Self::with_runtime(Self::new(), f)
    }

    /// The calling thread's global runtime.
    pub fn global() -> Rc<Self> {
        GLOBAL_RUNTIME.with(Rc::clone)
    }

    /// Get the current reactive runtime (scoped or global fallback).
    pub fn current() -> Rc<Self> {
        RUNTIME_STACK
            .with(|stack| stack.borrow().last().cloned())
            .unwrap_or_else(Self::global)
    }

    /// Run a function with a specific runtime as the current context.
    ///
    /// The runtime is popped again even if `f` panics.
    pub fn with_runtime<F, R>(runtime: Rc<Self>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        RUNTIME_STACK.with(|stack| stack.borrow_mut().push(runtime));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

        RUNTIME_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });

        match result {
            Ok(r) => r,
            Err(e) => std::panic::resume_unwind(e),
        }
    }

    /// Clear all observers, dependencies, and state from this runtime.
    pub fn clear(&self) {
        let effects = self.context.borrow_mut().clear();
        // Closures may own memos whose drop calls back into the runtime
        drop(effects);
        self.next_id.set(0);
    }

    /// Generate the next unique ID for a reactive primitive.
    pub fn next_id(&self) -> usize {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    /// Track a read of a source by the current observer.
    pub fn track_read(&self, source_id: usize) {
        let mut ctx = self.context.borrow_mut();
        if let Some(observer) = ctx.current_observer {
            ctx.dependencies
                .entry(source_id)
                .or_default()
                .insert(observer);
            ctx.observer_deps
                .entry(observer)
                .or_default()
                .insert(source_id);
        }
    }

    /// Notify all observers that depend on a source.
    pub fn notify_observers(&self, source_id: usize) {
        let observers: Vec<usize> = self
            .context
            .borrow()
            .dependencies
            .get(&source_id)
            .map(|obs| obs.iter().copied().collect())
            .unwrap_or_default();

        for observer_id in observers {
            self.mark_observer_dirty(observer_id);
        }
    }

    /// Mark an observer (memo or effect) as dirty and propagate to dependents.
    fn mark_observer_dirty(&self, observer_id: usize) {
        let mut ctx = self.context.borrow_mut();

        if let Some(dirty) = ctx.memo_dirty.get_mut(&observer_id) {
            if *dirty {
                return;
            }
            *dirty = true;
            drop(ctx);
            // A dirty memo invalidates everything that read it
            self.notify_observers(observer_id);
            return;
        }

        let effect = ctx.effects.get(&observer_id).cloned();
        drop(ctx);

        if let Some(effect) = effect {
            self.run_observer(observer_id, || effect());
        }
    }

    /// Register an effect function under the given observer ID.
    pub fn register_effect<F>(&self, observer_id: usize, f: F)
    where
        F: Fn() + 'static,
    {
        let mut ctx = self.context.borrow_mut();
        ctx.drop_dependencies(observer_id);
        ctx.effects.insert(observer_id, Rc::new(f));
    }

    /// Remove an observer and every dependency edge that touches it.
    pub fn remove_observer(&self, observer_id: usize) {
        let effect = {
            let mut ctx = self.context.borrow_mut();
            ctx.memo_dirty.remove(&observer_id);
            ctx.drop_dependencies(observer_id);
            ctx.dependencies.remove(&observer_id);
            ctx.effects.remove(&observer_id)
        };
        drop(effect);
    }

    /// Run a function with a specific observer as the current context.
    pub fn with_observer<F, R>(&self, observer_id: usize, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let prev = self
            .context
            .borrow_mut()
            .current_observer
            .replace(observer_id);

        let result = f();

        self.context.borrow_mut().current_observer = prev;
        result
    }

    /// Re-run an observer from scratch: its old dependencies are dropped and
    /// whatever `f` reads becomes the new set.
    pub fn run_observer<F, R>(&self, observer_id: usize, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.context.borrow_mut().drop_dependencies(observer_id);
        self.with_observer(observer_id, f)
    }

    /// Register a memo and mark it as dirty initially.
    pub fn register_memo(&self, memo_id: usize) {
        self.context.borrow_mut().memo_dirty.insert(memo_id, true);
    }

    /// Check if a memo is dirty (needs recomputation).
    pub fn is_memo_dirty(&self, memo_id: usize) -> bool {
        self.context
            .borrow()
            .memo_dirty
            .get(&memo_id)
            .copied()
            .unwrap_or(true)
    }

    /// Mark a memo as clean (after recomputation).
    pub fn mark_memo_clean(&self, memo_id: usize) {
        self.context.borrow_mut().memo_dirty.insert(memo_id, false);
    }

    #[cfg(test)]
    pub(crate) fn dependents_of(&self, source_id: usize) -> usize {
        self.context
            .borrow()
            .dependencies
            .get(&source_id)
            .map_or(0, HashSet::len)
    }

    #[cfg(test)]
    pub(crate) fn is_registered(&self, observer_id: usize) -> bool {
        let ctx = self.context.borrow();
        ctx.memo_dirty.contains_key(&observer_id)
            || ctx.effects.contains_key(&observer_id)
            || ctx.observer_deps.contains_key(&observer_id)
            || ctx.dependencies.contains_key(&observer_id)
    }
}
