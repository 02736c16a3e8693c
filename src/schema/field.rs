//! Field declarations and shape checking.

use crate::error::{QueryResult, QueryStateError};
use crate::schema::{FieldValue, Scalar, ValueType};

/// Declaration of one query-string field.
///
/// The three tags (`value_type`, `array`, `required`) fix the shape every
/// value of the field must have; `default` is used when the field is absent
/// and the field is required, on reset, and on bootstrap.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldSchema {
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub value_type: ValueType,
    #[cfg_attr(feature = "serde", serde(default))]
    pub array: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub required: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub default: FieldValue,
}

impl FieldSchema {
    /// Creates an optional scalar field with a null default.
    #[must_use]
    pub const fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            array: false,
            required: false,
            default: FieldValue::Null,
        }
    }

    #[must_use]
    pub const fn string() -> Self {
        Self::new(ValueType::String)
    }

    #[must_use]
    pub const fn number() -> Self {
        Self::new(ValueType::Number)
    }

    #[must_use]
    pub const fn boolean() -> Self {
        Self::new(ValueType::Boolean)
    }

    /// Makes the field hold an ordered sequence of values.
    #[must_use]
    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }

    /// Makes the field fall back to its default instead of null.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.default = value.into();
        self
    }

    /// Shape description, e.g. `number` or `string[]`.
    pub fn describe(&self) -> String {
        if self.array {
            format!("{}[]", self.value_type)
        } else {
            self.value_type.to_string()
        }
    }

    /// Checks that `value` has the shape this field declares.
    ///
    /// `name` is only used for the error.
    pub fn check(&self, name: &str, value: &FieldValue) -> QueryResult<()> {
        match value {
            FieldValue::Null if self.required => Err(QueryStateError::NullForRequired {
                name: name.to_owned(),
            }),
            FieldValue::Null => Ok(()),
            FieldValue::Scalar(scalar) if !self.array => self.check_scalar(name, scalar),
            FieldValue::Array(items) if self.array => items
                .iter()
                .try_for_each(|scalar| self.check_scalar(name, scalar)),
            _ => Err(self.mismatch(name, value.describe())),
        }
    }

    fn check_scalar(&self, name: &str, scalar: &Scalar) -> QueryResult<()> {
        if scalar.value_type() != self.value_type {
            return Err(self.mismatch(name, scalar.value_type().to_string()));
        }
        match scalar {
            Scalar::Number(value) if !value.is_finite() => {
                Err(QueryStateError::NonFiniteNumber {
                    name: name.to_owned(),
                    value: *value,
                })
            }
            _ => Ok(()),
        }
    }

    fn mismatch(&self, name: &str, found: String) -> QueryStateError {
        QueryStateError::TypeMismatch {
            name: name.to_owned(),
            expected: self.describe(),
            found,
        }
    }
}
