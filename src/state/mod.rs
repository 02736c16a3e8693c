//! Typed state derived from the query string.

mod query_state;
mod typed;

pub use query_state::TypedQueryState;
pub use typed::TypedState;
