//! The query-string boundary.
//!
//! A [`QueryStringStore`] owns the current location's query string. Typed
//! state is decoded from it and every mutation is written back through it;
//! its syntax (percent-encoding, key order, repeated keys) is the store's
//! business.
//!
//! [`MemoryStore`] is a reactive, history-backed implementation suitable for
//! applications without a browser and for tests.

mod memory;
mod params;

use indexmap::IndexMap;

pub use memory::MemoryStore;
pub use params::QueryParams;

/// How a write affects navigation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteMode {
    /// Create a new history entry.
    Push,
    /// Overwrite the current history entry.
    Replace,
}

/// The encoded form of one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Single(String),
    /// Written as one repeated key per element.
    Multiple(Vec<String>),
}

impl QueryValue {
    /// The stored strings in order.
    pub fn values(&self) -> &[String] {
        match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::Multiple(values) => values,
        }
    }
}

/// A complete set of fields to write, in write order.
pub type QueryPairs = IndexMap<String, QueryValue>;

/// Read/write access to the query string of the current location.
pub trait QueryStringStore {
    /// First stored value for `name`.
    fn get_first(&self, name: &str) -> Option<String>;

    /// Every stored value for `name`, in order.
    fn get_all(&self, name: &str) -> Vec<String>;

    /// Replace the whole query string with `pairs`.
    fn write(&self, pairs: QueryPairs, mode: WriteMode);

    /// Snapshot of the current query string.
    fn params(&self) -> QueryParams;

    /// Whether the raw query string is empty.
    fn is_empty(&self) -> bool {
        self.params().is_empty()
    }
}
