//! Error types for schema construction and state updates.

use thiserror::Error;

/// Result type for schema and update operations.
pub type QueryResult<T> = Result<T, QueryStateError>;

/// Errors raised when a value does not fit the schema it is written against.
///
/// Every variant names the field at fault. Decoding never produces these:
/// stored text that fails coercion resolves to a fallback value instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryStateError {
    /// The field is not declared in the schema.
    #[error("unknown field '{name}'")]
    UnknownField { name: String },

    /// A required field was given null.
    #[error("field '{name}' is required and cannot be null")]
    NullForRequired { name: String },

    /// The value's shape or scalar type differs from the declaration.
    #[error("field '{name}' expects {expected}, got {found}")]
    TypeMismatch {
        name: String,
        expected: String,
        found: String,
    },

    /// Numbers must survive a trip through the query string.
    #[error("field '{name}' cannot hold non-finite number {value}")]
    NonFiniteNumber { name: String, value: f64 },

    /// A schema declared the same field name twice.
    #[error("duplicate field '{name}'")]
    DuplicateField { name: String },

    /// A declared default does not fit its own field.
    #[error("invalid default for field '{name}': {source}")]
    InvalidDefault {
        name: String,
        #[source]
        source: Box<QueryStateError>,
    },
}

impl QueryStateError {
    /// Name of the field the error is about.
    pub fn field(&self) -> &str {
        match self {
            Self::UnknownField { name }
            | Self::NullForRequired { name }
            | Self::TypeMismatch { name, .. }
            | Self::NonFiniteNumber { name, .. }
            | Self::DuplicateField { name }
            | Self::InvalidDefault { name, .. } => name,
        }
    }
}
