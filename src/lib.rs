//! # query-state
//!
//! Typed application state that lives in a URL query string.
//!
//! Declare a [`Schema`] of named fields (type, array-ness, required-ness,
//! default), bind it to a [`QueryStringStore`], and [`TypedQueryState`]
//! gives you:
//! - a typed view of the current query string, re-derived whenever the
//!   query string or the schema changes
//! - `update`, which sets one field and writes the whole state back
//! - `reset_to_defaults`, which writes every declared default
//!
//! The query string stays the single source of truth, so the location is
//! always a complete, shareable description of the state.
//!
//! ## Reactive primitives
//!
//! Re-derivation is built on small single-threaded reactive primitives,
//! exported for applications that want to build on them:
//! - `Signal<T>` - Reactive values that notify dependents when changed
//! - `Memo<T>` - Computed values that automatically track dependencies
//! - `Effect` - Side effects that run when dependencies change

pub mod codec;
pub mod error;
pub mod runtime;
pub mod schema;
pub mod signal;
pub mod state;
pub mod store;

// Re-export main types for convenience
pub use error::{QueryResult, QueryStateError};
pub use schema::{FieldSchema, FieldValue, Scalar, Schema, SchemaBuilder, ValueType};
pub use signal::{Effect, Memo, Signal};
pub use state::{TypedQueryState, TypedState};
pub use store::{MemoryStore, QueryPairs, QueryParams, QueryStringStore, QueryValue, WriteMode};

