use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use super::{QueryPairs, QueryParams, QueryStringStore, WriteMode};
use crate::Signal;

type Subscriber = Rc<dyn Fn(&QueryParams)>;

#[derive(Debug)]
struct History {
    entries: Vec<QueryParams>,
    index: usize,
}

/// An in-memory location with browser-style history.
///
/// The current query lives in a [`Signal`], so anything that reads it from a
/// memo or effect re-derives after each navigation. Clones share the same
/// location.
///
/// # Examples
///
/// ```
/// use query_state::{MemoryStore, QueryStringStore};
///
/// let store = MemoryStore::from_query("?page=2&tag=a&tag=b");
/// assert_eq!(store.get_first("page").as_deref(), Some("2"));
/// assert_eq!(store.get_all("tag"), vec!["a", "b"]);
///
/// store.navigate("page=3");
/// assert_eq!(store.query_string(), "page=3");
/// assert!(store.back());
/// assert_eq!(store.query_string(), "page=2&tag=a&tag=b");
/// ```
#[derive(Clone)]
pub struct MemoryStore {
    current: Signal<QueryParams>,
    history: Rc<RefCell<History>>,
    subscribers: Rc<RefCell<Vec<Subscriber>>>,
}

impl MemoryStore {
    /// Creates a location with an empty query string.
    pub fn new() -> Self {
        Self::with_params(QueryParams::new())
    }

    /// Creates a location from raw query-string text.
    pub fn from_query(raw: &str) -> Self {
        Self::with_params(QueryParams::parse(raw))
    }

    fn with_params(params: QueryParams) -> Self {
        Self {
            current: Signal::new(params.clone()),
            history: Rc::new(RefCell::new(History {
                entries: vec![params],
                index: 0,
            })),
            subscribers: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Navigates to a new query string, as if the user edited the URL.
    pub fn navigate(&self, raw: &str) {
        self.commit(QueryParams::parse(raw), WriteMode::Push);
    }

    /// Steps back one history entry. Returns `false` at the oldest entry.
    pub fn back(&self) -> bool {
        self.step(|index, _| index.checked_sub(1))
    }

    /// Steps forward one history entry. Returns `false` at the newest entry.
    pub fn forward(&self) -> bool {
        self.step(|index, len| (index + 1 < len).then_some(index + 1))
    }

    /// The current query string, without a leading `?`.
    pub fn query_string(&self) -> String {
        self.current.with(QueryParams::to_query_string)
    }

    /// Number of history entries.
    pub fn history_len(&self) -> usize {
        self.history.borrow().entries.len()
    }

    /// Subscribe to navigations.
    ///
    /// The callback receives the new query after every write, navigation,
    /// and history step.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&QueryParams) + 'static,
    {
        self.subscribers.borrow_mut().push(Rc::new(callback));
    }

    fn commit(&self, params: QueryParams, mode: WriteMode) {
        {
            let mut history = self.history.borrow_mut();
            match mode {
                WriteMode::Push => {
                    let next = history.index + 1;
                    history.entries.truncate(next);
                    history.entries.push(params.clone());
                    history.index = next;
                }
                WriteMode::Replace => {
                    let index = history.index;
                    history.entries[index] = params.clone();
                }
            }
        }
        debug!(query = %params, ?mode, "location updated");
        self.show(params);
    }

    fn step(&self, target: impl FnOnce(usize, usize) -> Option<usize>) -> bool {
        let params = {
            let mut history = self.history.borrow_mut();
            let Some(index) = target(history.index, history.entries.len()) else {
                return false;
            };
            history.index = index;
            history.entries[index].clone()
        };
        self.show(params);
        true
    }

    fn show(&self, params: QueryParams) {
        self.current.set(params);
        self.notify();
    }

    /// Notify all subscribers of a navigation.
    fn notify(&self) {
        let params = self.current.with(QueryParams::clone);
        // Callbacks may subscribe or navigate, so run them from a snapshot
        let subscribers: Vec<Subscriber> = self.subscribers.borrow().clone();
        for subscriber in subscribers {
            subscriber(&params);
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryStringStore for MemoryStore {
    fn get_first(&self, name: &str) -> Option<String> {
        self.current
            .with(|params| params.get_first(name).map(str::to_owned))
    }

    fn get_all(&self, name: &str) -> Vec<String> {
        self.current.with(|params| {
            params
                .get_all(name)
                .into_iter()
                .map(str::to_owned)
                .collect()
        })
    }

    fn write(&self, pairs: QueryPairs, mode: WriteMode) {
        self.commit(QueryParams::from(&pairs), mode);
    }

    fn params(&self) -> QueryParams {
        self.current.get()
    }

    fn is_empty(&self) -> bool {
        self.current.with(QueryParams::is_empty)
    }
}
