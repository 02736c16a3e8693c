//! Conversion between typed field values and query-string text.
//!
//! Decoding reads a [`QueryStringStore`](crate::QueryStringStore) against a
//! [`Schema`](crate::Schema); encoding turns values back into
//! [`QueryPairs`](crate::QueryPairs). Neither direction writes anything.

mod decode;
mod encode;

pub use decode::{coerce, decode, decode_field, needs_defaults};
pub use encode::{encode_defaults, encode_scalar, encode_state, encode_value};
