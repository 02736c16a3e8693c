use indexmap::IndexMap;

use crate::schema::FieldValue;

/// Decoded values of every schema field, in schema order.
///
/// A `TypedState` is always derived from the query string; changing it has
/// no effect on the location. Use [`TypedQueryState::update`] to write.
///
/// [`TypedQueryState::update`]: crate::TypedQueryState::update
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TypedState {
    values: IndexMap<String, FieldValue>,
}

impl TypedState {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns a copy with one field's value swapped out, keeping field order.
    pub(crate) fn with_value(mut self, name: &str, value: FieldValue) -> Self {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
        }
        self
    }
}

impl FromIterator<(String, FieldValue)> for TypedState {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
