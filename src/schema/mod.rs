//! Schema model for query-string state.
//!
//! A [`Schema`] is an ordered set of named [`FieldSchema`] declarations.
//! Each field carries explicit `value_type`/`array`/`required` tags and a
//! default; decoding and encoding branch on those tags.
//!
//! Schemas are validated once, at construction: every default must fit its
//! own field, so later code can rely on defaults being well-shaped.

mod field;
mod value;

use indexmap::IndexMap;

use crate::error::{QueryResult, QueryStateError};

pub use field::FieldSchema;
pub use value::{FieldValue, Scalar, ValueType};

/// An immutable, validated, insertion-ordered map of field declarations.
///
/// # Examples
///
/// ```
/// use query_state::{FieldSchema, Schema};
///
/// let schema = Schema::builder()
///     .field("count", FieldSchema::number().required().default_value(1))
///     .field("tags", FieldSchema::string().array())
///     .build()
///     .unwrap();
///
/// assert_eq!(schema.len(), 2);
/// assert!(schema.field("count").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "IndexMap<String, FieldSchema>", into = "IndexMap<String, FieldSchema>")
)]
pub struct Schema {
    fields: IndexMap<String, FieldSchema>,
}

impl Schema {
    /// Starts an empty schema builder.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Builds a schema from `(name, field)` pairs, rejecting duplicate names
    /// and defaults that do not fit their field.
    pub fn from_fields<I, K>(fields: I) -> QueryResult<Self>
    where
        I: IntoIterator<Item = (K, FieldSchema)>,
        K: Into<String>,
    {
        let mut map = IndexMap::new();
        for (name, field) in fields {
            let name = name.into();
            field
                .check(&name, &field.default)
                .map_err(|source| QueryStateError::InvalidDefault {
                    name: name.clone(),
                    source: Box::new(source),
                })?;
            if map.contains_key(&name) {
                return Err(QueryStateError::DuplicateField { name });
            }
            map.insert(name, field);
        }
        Ok(Self { fields: map })
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Field names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSchema)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl TryFrom<IndexMap<String, FieldSchema>> for Schema {
    type Error = QueryStateError;

    fn try_from(fields: IndexMap<String, FieldSchema>) -> QueryResult<Self> {
        Self::from_fields(fields)
    }
}

impl From<Schema> for IndexMap<String, FieldSchema> {
    fn from(schema: Schema) -> Self {
        schema.fields
    }
}

/// Collects field declarations; validation happens in [`SchemaBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    fields: Vec<(String, FieldSchema)>,
}

impl SchemaBuilder {
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, field: FieldSchema) -> Self {
        self.fields.push((name.into(), field));
        self
    }

    pub fn build(self) -> QueryResult<Schema> {
        Schema::from_fields(self.fields)
    }
}
