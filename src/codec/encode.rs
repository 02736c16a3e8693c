use crate::schema::{FieldValue, Scalar, Schema};
use crate::state::TypedState;
use crate::store::{QueryPairs, QueryValue};

/// String form of a scalar; the inverse of [`coerce`](super::coerce).
///
/// Numbers use the shortest decimal text that parses back to the same value,
/// so whole numbers print without a fractional part.
pub fn encode_scalar(value: &Scalar) -> String {
    match value {
        Scalar::String(s) => s.clone(),
        Scalar::Number(n) => n.to_string(),
        Scalar::Boolean(b) => b.to_string(),
    }
}

/// Encoded form of a field value, or `None` when the field is omitted.
///
/// Null and empty arrays are omitted.
pub fn encode_value(value: &FieldValue) -> Option<QueryValue> {
    match value {
        FieldValue::Null => None,
        FieldValue::Scalar(scalar) => Some(QueryValue::Single(encode_scalar(scalar))),
        FieldValue::Array(items) if items.is_empty() => None,
        FieldValue::Array(items) => Some(QueryValue::Multiple(
            items.iter().map(encode_scalar).collect(),
        )),
    }
}

fn collect_pairs<'a>(values: impl Iterator<Item = (&'a str, &'a FieldValue)>) -> QueryPairs {
    values
        .filter_map(|(name, value)| encode_value(value).map(|encoded| (name.to_owned(), encoded)))
        .collect()
}

/// Encodes every field of a state, in state order, skipping omitted ones.
pub fn encode_state(state: &TypedState) -> QueryPairs {
    collect_pairs(state.iter())
}

/// Encodes every field's declared default.
pub fn encode_defaults(schema: &Schema) -> QueryPairs {
    collect_pairs(schema.iter().map(|(name, field)| (name, &field.default)))
}
