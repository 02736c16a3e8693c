use tracing::{trace, warn};

use crate::schema::{FieldSchema, FieldValue, Scalar, Schema, ValueType};
use crate::state::TypedState;
use crate::store::QueryStringStore;

/// Coerces one stored string to a scalar of the declared type.
///
/// Numbers must parse as finite decimals; anything else is a coercion
/// failure and yields `None`. Booleans are `true` only for the literal
/// `"true"`. Strings are kept verbatim.
pub fn coerce(raw: &str, value_type: ValueType) -> Option<Scalar> {
    match value_type {
        ValueType::String => Some(Scalar::String(raw.to_owned())),
        ValueType::Boolean => Some(Scalar::Boolean(raw == "true")),
        ValueType::Number => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Scalar::Number),
    }
}

/// Decodes one field from the store.
///
/// With `load_defaults` the field takes its default verbatim. Otherwise an
/// absent field is its default when required and null when optional; an
/// array field keeps every stored value that coerces, in order; a scalar
/// field that fails coercion falls back the same way an absent one does.
pub fn decode_field<S>(
    name: &str,
    field: &FieldSchema,
    store: &S,
    load_defaults: bool,
) -> FieldValue
where
    S: QueryStringStore + ?Sized,
{
    if load_defaults {
        return field.default.clone();
    }

    let Some(first) = store.get_first(name) else {
        return absent(field);
    };

    if field.array {
        let stored = store.get_all(name);
        let values: Vec<Scalar> = stored
            .iter()
            .filter_map(|raw| {
                let value = coerce(raw, field.value_type);
                if value.is_none() {
                    warn!(
                        field = name,
                        raw = raw.as_str(),
                        "dropping array entry that failed coercion"
                    );
                }
                value
            })
            .collect();
        return FieldValue::Array(values);
    }

    match coerce(&first, field.value_type) {
        Some(value) => FieldValue::Scalar(value),
        None => {
            warn!(field = name, raw = first.as_str(), "stored value failed coercion");
            absent(field)
        }
    }
}

fn absent(field: &FieldSchema) -> FieldValue {
    if field.required {
        field.default.clone()
    } else {
        FieldValue::Null
    }
}

/// Decodes every field of `schema` from `store`.
///
/// Pure: performs no writes. Each field decodes independently, so one bad
/// stored value never affects the others.
pub fn decode<S>(schema: &Schema, store: &S, load_defaults: bool) -> TypedState
where
    S: QueryStringStore + ?Sized,
{
    trace!(fields = schema.len(), load_defaults, "decoding query state");
    schema
        .iter()
        .map(|(name, field)| (name.to_owned(), decode_field(name, field, store, load_defaults)))
        .collect()
}

/// Whether `store` holds none of the schema's fields. Together with an empty
/// query string on first evaluation, this is when defaults apply wholesale.
pub fn needs_defaults<S>(schema: &Schema, store: &S) -> bool
where
    S: QueryStringStore + ?Sized,
{
    schema.names().all(|name| store.get_first(name).is_none())
}
